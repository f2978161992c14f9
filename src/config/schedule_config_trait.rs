// ==========================================
// 考勤薪资扣款引擎 - 作息配置读取 Trait
// ==========================================
// 职责: 定义引擎所需的作息配置读取接口(不包含实现)
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use async_trait::async_trait;
use chrono::NaiveTime;
use std::error::Error;

// ==========================================
// ScheduleConfigReader Trait
// ==========================================
// 用途: 迟到/早退分钟数计算所需的标准作息时间
// 实现者: ConfigManager(从 config_kv 表读取)
#[async_trait]
pub trait ScheduleConfigReader: Send + Sync {
    /// 获取标准上班时间
    ///
    /// # 默认值
    /// - 07:30:00
    async fn get_standard_check_in(&self) -> Result<NaiveTime, Box<dyn Error>>;

    /// 获取标准下班时间
    ///
    /// # 默认值
    /// - 16:00:00
    async fn get_standard_check_out(&self) -> Result<NaiveTime, Box<dyn Error>>;
}
