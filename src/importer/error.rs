// ==========================================
// 考勤薪资扣款引擎 - 摄入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 分级: 批次致命错误在此定义;单条记录级失败走 SkipReason,不在此
// ==========================================

use thiserror::Error;

/// 摄入模块错误类型 (批次级致命错误)
#[derive(Error, Debug)]
pub enum IngestError {
    // ===== 去重护栏 =====
    #[error("源文件已摄入过 (指纹: {0}),整批拒绝")]
    DuplicateSource(String),

    // ===== 文件相关错误 =====
    #[error("源文件读取失败: {0}")]
    SourceUnreadable(String),

    #[error("文件格式不支持: {0}(仅支持 .xlsx/.xls/.csv)")]
    UnsupportedFormat(String),

    #[error("源数据格式非法: {0}")]
    InvalidFormat(String),

    #[error("Excel 解析失败: {0}")]
    ExcelParseError(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    // ===== 配置错误 =====
    #[error("配置读取失败 (key: {key}): {message}")]
    ConfigReadError { key: String, message: String },

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for IngestError {
    fn from(err: std::io::Error) -> Self {
        IngestError::SourceUnreadable(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for IngestError {
    fn from(err: csv::Error) -> Self {
        IngestError::CsvParseError(err.to_string())
    }
}

// 实现 From<calamine::XlsxError>
impl From<calamine::XlsxError> for IngestError {
    fn from(err: calamine::XlsxError) -> Self {
        IngestError::ExcelParseError(err.to_string())
    }
}

/// Result 类型别名
pub type IngestResult<T> = Result<T, IngestError>;
