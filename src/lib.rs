// ==========================================
// 考勤薪资扣款引擎 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 考勤驱动的日薪扣款与期间汇总引擎
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 摄入层 - 外部考勤数据
pub mod importer;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{ScanDirection, SkipReason, UpsertOutcome, ViolationType};

// 领域实体
pub use domain::{
    AttendanceScan, BatchResult, DailySalaryRecord, DeductionRule, Employee,
    NormalizedAttendance, PeriodPayrollSummary, SalaryComponentSet, SkippedRecord,
};

// 引擎
pub use engine::{DeductionMatcher, DeductionPlan, PayrollAggregator, SalaryLedger};

// 摄入
pub use importer::{IngestError, IngestService, TimeClockPayload};

// 配置
pub use config::{ConfigManager, ScheduleConfigReader};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "考勤薪资扣款引擎";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
