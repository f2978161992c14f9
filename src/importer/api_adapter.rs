// ==========================================
// 考勤薪资扣款引擎 - 考勤机 API 适配器
// ==========================================
// 职责: 把考勤机推送的 JSON 载荷翻译为领域打卡事件
// 状态码映射: 0 → 上班 (In), 1 → 下班 (Out), 其余计入跳过统计
// ==========================================

use crate::domain::attendance::{AttendanceScan, SkippedRecord};
use crate::domain::types::{ScanDirection, SkipReason};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// 考勤机推送的打卡时间格式
const SCAN_DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

// ==========================================
// TimeClockPayload - 考勤机推送载荷
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeClockPayload {
    pub success: bool,
    pub trans_id: String,
    pub data: Vec<TimeClockRow>,
}

/// 考勤机单条打卡行
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeClockRow {
    /// 工号
    pub pin: String,
    /// 打卡时刻,"YYYY-MM-DD HH:MM:SS"
    pub scan_date: String,
    /// 验证方式 (指纹/卡/面部),仅透传记录
    pub verify: i64,
    /// 0 = 上班, 1 = 下班
    pub status_scan: i64,
}

// ==========================================
// TimeClockAdapter - 载荷翻译
// ==========================================
pub struct TimeClockAdapter;

impl TimeClockAdapter {
    /// 把载荷翻译为打卡事件列表
    ///
    /// # 规则
    /// - status_scan 非 0/1 的行不中断批次,计入 UNKNOWN_SCAN_STATUS
    /// - scan_date 无法解析的行计入 UNPARSEABLE_TIME
    pub fn to_scans(payload: &TimeClockPayload) -> (Vec<AttendanceScan>, Vec<SkippedRecord>) {
        let mut scans = Vec::with_capacity(payload.data.len());
        let mut skipped = Vec::new();

        for row in &payload.data {
            let raw = format!(
                "pin={} scan_date={} status_scan={}",
                row.pin, row.scan_date, row.status_scan
            );

            if row.pin.trim().is_empty() {
                skipped.push(SkippedRecord {
                    reason: SkipReason::MissingField,
                    raw,
                });
                continue;
            }

            let direction = match row.status_scan {
                0 => ScanDirection::In,
                1 => ScanDirection::Out,
                _ => {
                    skipped.push(SkippedRecord {
                        reason: SkipReason::UnknownScanStatus,
                        raw,
                    });
                    continue;
                }
            };

            let Ok(datetime) = NaiveDateTime::parse_from_str(&row.scan_date, SCAN_DATETIME_FMT)
            else {
                skipped.push(SkippedRecord {
                    reason: SkipReason::UnparseableTime,
                    raw,
                });
                continue;
            };

            scans.push(AttendanceScan {
                badge: row.pin.trim().to_string(),
                date: datetime.date(),
                scan_time: datetime.time(),
                direction,
            });
        }

        (scans, skipped)
    }
}
