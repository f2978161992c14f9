// ==========================================
// 考勤薪资扣款引擎 - 引擎层
// ==========================================
// 职责: 业务规则 (规则匹配 / 台账计算 / 期间汇总)
// 红线: 匹配与计算为纯函数,I/O 只经存储契约进出
// ==========================================

pub mod aggregator;
pub mod ledger;
pub mod matcher;

// 重导出核心引擎
pub use aggregator::PayrollAggregator;
pub use ledger::SalaryLedger;
pub use matcher::{DeductionMatcher, DeductionPlan, PlanStep};
