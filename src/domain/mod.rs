// ==========================================
// 考勤薪资扣款引擎 - 领域模型层
// ==========================================
// 职责: 定义领域实体与类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod attendance;
pub mod salary;
pub mod types;

// 重导出核心类型
pub use attendance::{AttendanceScan, BatchResult, NormalizedAttendance, SkippedRecord};
pub use salary::{
    DailySalaryRecord, DeductionRule, Employee, PeriodPayrollSummary, SalaryComponentSet,
    COMPONENT_SLOTS,
};
pub use types::{ScanDirection, SkipReason, UpsertOutcome, ViolationType};
