// ==========================================
// 考勤薪资扣款引擎 - 考勤领域模型
// ==========================================
// 依据: 考勤摄入流程 - 原始打卡 → 归一化记录 → 批次结果
// 红线: 原始打卡 (AttendanceScan) 不落库,仅在批次内流转
// ==========================================

use crate::domain::types::{ScanDirection, SkipReason};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

// ==========================================
// AttendanceScan - 原始打卡记录
// ==========================================
// 用途: 摄入源(文件/考勤机接口)产出的单次打卡事件
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceScan {
    pub badge: String,            // 工号 (NIP)
    pub date: NaiveDate,          // 打卡日期
    pub scan_time: NaiveTime,     // 打卡时间
    pub direction: ScanDirection, // 打卡方向
}

// ==========================================
// NormalizedAttendance - 归一化考勤记录
// ==========================================
// 不变量: 每批次内 (badge, date) 唯一
// 归并策略: 多条上班卡取最早;多条下班卡取最晚
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedAttendance {
    pub badge: String,
    pub date: NaiveDate,
    pub check_in: Option<NaiveTime>,  // 上班时间 (缺卡为 None)
    pub check_out: Option<NaiveTime>, // 下班时间 (缺卡为 None)
}

impl NormalizedAttendance {
    /// 上下班时间均缺失的记录不可用,应跳过
    pub fn is_empty(&self) -> bool {
        self.check_in.is_none() && self.check_out.is_none()
    }
}

// ==========================================
// SkippedRecord - 批次跳过明细
// ==========================================
// 用途: 审计与 UI 展示,记录原因与原始数据快照
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedRecord {
    pub reason: SkipReason,
    pub raw: String, // 原始记录快照 (JSON 或源行文本)
}

// ==========================================
// BatchResult - 批次摄入结果
// ==========================================
// 用途: 返回给调用方的批次审计汇总
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchResult {
    pub batch_id: String,
    pub processed: usize,                    // 成功落库记录数
    pub skipped: usize,                      // 跳过记录数
    pub skipped_details: Vec<SkippedRecord>, // 跳过明细
    pub elapsed_ms: u64,                     // 批次耗时
}

impl BatchResult {
    pub fn new(batch_id: String) -> Self {
        Self {
            batch_id,
            ..Default::default()
        }
    }

    /// 记录一条跳过明细并累加计数
    pub fn skip(&mut self, reason: SkipReason, raw: impl Into<String>) {
        self.skipped += 1;
        self.skipped_details.push(SkippedRecord {
            reason,
            raw: raw.into(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_is_empty() {
        let record = NormalizedAttendance {
            badge: "1001".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
            check_in: None,
            check_out: None,
        };
        assert!(record.is_empty());

        let record = NormalizedAttendance {
            check_out: NaiveTime::from_hms_opt(16, 2, 0),
            ..record
        };
        assert!(!record.is_empty());
    }

    #[test]
    fn test_batch_result_skip_accounting() {
        let mut result = BatchResult::new("batch-1".to_string());
        result.skip(SkipReason::IncompleteData, "{}");
        result.skip(SkipReason::EmployeeNotFound, "9999");
        assert_eq!(result.skipped, 2);
        assert_eq!(result.skipped_details.len(), 2);
        assert_eq!(result.processed, 0);
    }
}
