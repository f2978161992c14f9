// ==========================================
// 考勤薪资扣款引擎 - 配置层
// ==========================================
// 职责: 标准作息时间等引擎配置的读取
// 存储: config_kv 表 (key-value)
// ==========================================

pub mod config_manager;
pub mod schedule_config_trait;

pub use config_manager::ConfigManager;
pub use schedule_config_trait::ScheduleConfigReader;
