// ==========================================
// 考勤薪资扣款引擎 - 领域类型定义
// ==========================================
// 依据: 考勤扣款规则 - 违规类型与扣款顺序
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 打卡方向 (Scan Direction)
// ==========================================
// 外部考勤机状态码映射: 0 → In, 1 → Out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScanDirection {
    In,  // 上班打卡
    Out, // 下班打卡
}

impl fmt::Display for ScanDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanDirection::In => write!(f, "IN"),
            ScanDirection::Out => write!(f, "OUT"),
        }
    }
}

// ==========================================
// 违规类型 (Violation Type)
// ==========================================
// 红线: 扣款按固定顺序逐项作用于已扣余额
// 顺序: 迟到 → 早退 → 缺上班卡 → 缺下班卡
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationType {
    LateArrival,     // 迟到
    EarlyLeave,      // 早退
    MissingCheckIn,  // 缺上班卡
    MissingCheckOut, // 缺下班卡
}

impl ViolationType {
    /// 扣款作用的固定顺序
    pub const APPLY_ORDER: [ViolationType; 4] = [
        ViolationType::LateArrival,
        ViolationType::EarlyLeave,
        ViolationType::MissingCheckIn,
        ViolationType::MissingCheckOut,
    ];

    /// 从数据库字符串解析
    pub fn parse(raw: &str) -> Option<ViolationType> {
        match raw.trim() {
            "LATE_ARRIVAL" => Some(ViolationType::LateArrival),
            "EARLY_LEAVE" => Some(ViolationType::EarlyLeave),
            "MISSING_CHECK_IN" => Some(ViolationType::MissingCheckIn),
            "MISSING_CHECK_OUT" => Some(ViolationType::MissingCheckOut),
            _ => None,
        }
    }
}

impl fmt::Display for ViolationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViolationType::LateArrival => write!(f, "LATE_ARRIVAL"),
            ViolationType::EarlyLeave => write!(f, "EARLY_LEAVE"),
            ViolationType::MissingCheckIn => write!(f, "MISSING_CHECK_IN"),
            ViolationType::MissingCheckOut => write!(f, "MISSING_CHECK_OUT"),
        }
    }
}

// ==========================================
// 跳过原因 (Skip Reason)
// ==========================================
// 批次内单条记录的非致命失败分类,计入批次统计
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SkipReason {
    MissingField,           // 必填字段缺失 (工号/日期)
    IncompleteData,         // 上下班时间均缺失
    EmployeeNotFound,       // 工号在人员目录中不存在
    ComponentConfigMissing, // 角色无薪资组件配置
    UnparseableTime,        // 时间值无法解析
    UnknownScanStatus,      // 考勤机状态码非 0/1
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingField => write!(f, "MISSING_FIELD"),
            SkipReason::IncompleteData => write!(f, "INCOMPLETE_DATA"),
            SkipReason::EmployeeNotFound => write!(f, "EMPLOYEE_NOT_FOUND"),
            SkipReason::ComponentConfigMissing => write!(f, "COMPONENT_CONFIG_MISSING"),
            SkipReason::UnparseableTime => write!(f, "UNPARSEABLE_TIME"),
            SkipReason::UnknownScanStatus => write!(f, "UNKNOWN_SCAN_STATUS"),
        }
    }
}

// ==========================================
// 落库结果 (Upsert Outcome)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UpsertOutcome {
    Created, // 首次写入 (INSERT)
    Updated, // 重复摄入覆盖 (UPDATE)
}

impl fmt::Display for UpsertOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpsertOutcome::Created => write!(f, "CREATED"),
            UpsertOutcome::Updated => write!(f, "UPDATED"),
        }
    }
}
