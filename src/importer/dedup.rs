// ==========================================
// 考勤薪资扣款引擎 - 上传去重护栏
// ==========================================
// 指纹: 对原始字节做 SHA-256,十六进制小写编码
// 红线: 指纹只在整批成功后登记,失败批次允许修复后重传
// ==========================================

use sha2::{Digest, Sha256};

pub struct UploadDedupGuard;

impl UploadDedupGuard {
    /// 计算上传内容指纹
    pub fn fingerprint(bytes: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        hex::encode(hasher.finalize())
    }
}
