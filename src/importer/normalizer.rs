// ==========================================
// 考勤薪资扣款引擎 - 打卡事件归并器
// ==========================================
// 职责: 把零散打卡事件归并为 (工号, 日期) 粒度的考勤记录
// 规则: 上班取当日最早一次 In,下班取当日最晚一次 Out
// ==========================================

use crate::domain::attendance::{AttendanceScan, NormalizedAttendance};
use crate::domain::types::ScanDirection;
use chrono::NaiveDate;
use std::collections::BTreeMap;

pub struct AttendanceNormalizer;

impl AttendanceNormalizer {
    /// 按 (工号, 日期) 归并打卡事件
    ///
    /// # 返回
    /// - 按工号、日期升序的归一化记录 (BTreeMap 保证确定性)
    pub fn normalize(scans: &[AttendanceScan]) -> Vec<NormalizedAttendance> {
        let mut grouped: BTreeMap<(String, NaiveDate), NormalizedAttendance> = BTreeMap::new();

        for scan in scans {
            let entry = grouped
                .entry((scan.badge.clone(), scan.date))
                .or_insert_with(|| NormalizedAttendance {
                    badge: scan.badge.clone(),
                    date: scan.date,
                    check_in: None,
                    check_out: None,
                });

            match scan.direction {
                ScanDirection::In => {
                    // 最早一次上班打卡生效
                    if entry.check_in.map_or(true, |t| scan.scan_time < t) {
                        entry.check_in = Some(scan.scan_time);
                    }
                }
                ScanDirection::Out => {
                    // 最晚一次下班打卡生效
                    if entry.check_out.map_or(true, |t| scan.scan_time > t) {
                        entry.check_out = Some(scan.scan_time);
                    }
                }
            }
        }

        grouped.into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn scan(badge: &str, date: &str, time: &str, direction: ScanDirection) -> AttendanceScan {
        AttendanceScan {
            badge: badge.to_string(),
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            scan_time: NaiveTime::parse_from_str(time, "%H:%M:%S").unwrap(),
            direction,
        }
    }

    #[test]
    fn test_earliest_in_latest_out() {
        let scans = vec![
            scan("1001", "2024-03-04", "07:31:00", ScanDirection::In),
            scan("1001", "2024-03-04", "07:29:00", ScanDirection::In),
            scan("1001", "2024-03-04", "16:02:00", ScanDirection::Out),
            scan("1001", "2024-03-04", "16:30:00", ScanDirection::Out),
        ];

        let normalized = AttendanceNormalizer::normalize(&scans);
        assert_eq!(normalized.len(), 1);
        assert_eq!(normalized[0].check_in, NaiveTime::from_hms_opt(7, 29, 0));
        assert_eq!(normalized[0].check_out, NaiveTime::from_hms_opt(16, 30, 0));
    }

    #[test]
    fn test_groups_by_badge_and_date() {
        let scans = vec![
            scan("1001", "2024-03-04", "07:31:00", ScanDirection::In),
            scan("1002", "2024-03-04", "07:35:00", ScanDirection::In),
            scan("1001", "2024-03-05", "07:28:00", ScanDirection::In),
        ];

        let normalized = AttendanceNormalizer::normalize(&scans);
        assert_eq!(normalized.len(), 3);
        // BTreeMap 保证先按工号再按日期排序
        assert_eq!(normalized[0].badge, "1001");
        assert_eq!(normalized[1].badge, "1001");
        assert_eq!(normalized[2].badge, "1002");
    }

    #[test]
    fn test_out_only_day_keeps_check_in_empty() {
        let scans = vec![scan("1001", "2024-03-04", "16:02:00", ScanDirection::Out)];

        let normalized = AttendanceNormalizer::normalize(&scans);
        assert_eq!(normalized[0].check_in, None);
        assert!(normalized[0].check_out.is_some());
    }
}
