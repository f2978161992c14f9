// ==========================================
// 考勤薪资扣款引擎 - 存储契约 Trait
// ==========================================
// 职责: 定义引擎所需的数据访问接口(不包含实现)
// 红线: Repository 不含业务规则,只做数据 CRUD
// 红线: 跨实体读取一律显式查询,引擎不假设任何 join 图
// ==========================================

use crate::domain::salary::{
    DailySalaryRecord, DeductionRule, Employee, SalaryComponentSet,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::error::Error;

// ==========================================
// EmployeeDirectory Trait
// ==========================================
// 用途: 外部人员目录的只读检索
#[async_trait]
pub trait EmployeeDirectory: Send + Sync {
    /// 按工号 (NIP) 查找人员
    ///
    /// # 返回
    /// - Ok(Some(employee)): 找到
    /// - Ok(None): 工号不存在
    async fn find_by_badge(&self, badge: &str) -> Result<Option<Employee>, Box<dyn Error>>;

    /// 按内部主键查找人员(期间汇总时反查角色用)
    async fn find_by_id(&self, employee_id: &str) -> Result<Option<Employee>, Box<dyn Error>>;
}

// ==========================================
// SalaryComponentRepository Trait
// ==========================================
// 用途: 角色薪资组件基数的只读检索
#[async_trait]
pub trait SalaryComponentRepository: Send + Sync {
    /// 读取角色的 10 槽位组件基数
    ///
    /// # 返回
    /// - Ok(Some(set)): 角色已配置
    /// - Ok(None): 角色无组件配置
    async fn get_components(
        &self,
        role_code: &str,
    ) -> Result<Option<SalaryComponentSet>, Box<dyn Error>>;
}

// ==========================================
// DeductionRuleRepository Trait
// ==========================================
// 用途: 扣款规则读取
#[async_trait]
pub trait DeductionRuleRepository: Send + Sync {
    /// 列出角色的全部扣款规则,按分钟阈值升序
    async fn list_rules(&self, role_code: &str) -> Result<Vec<DeductionRule>, Box<dyn Error>>;
}

// ==========================================
// DailySalaryRepository Trait
// ==========================================
// 用途: 日薪记录的读写
// 约束: upsert 必须在单事务内完成,保证同键重算的原子性
#[async_trait]
pub trait DailySalaryRepository: Send + Sync {
    /// 按 (employee_id, date) 读取日薪记录
    async fn get_daily_record(
        &self,
        employee_id: &str,
        date: NaiveDate,
    ) -> Result<Option<DailySalaryRecord>, Box<dyn Error>>;

    /// 写入日薪记录 (INSERT 或同键 UPDATE)
    ///
    /// # 说明
    /// - check_in / check_out 按 COALESCE 语义更新:
    ///   新值非空才覆盖,不会用空值冲掉已有时间
    async fn upsert_daily_record(
        &self,
        record: &DailySalaryRecord,
    ) -> Result<(), Box<dyn Error>>;

    /// 查询员工在闭区间 [start, end] 内的全部日薪记录
    async fn query_range(
        &self,
        employee_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailySalaryRecord>, Box<dyn Error>>;
}

// ==========================================
// FingerprintRepository Trait
// ==========================================
// 用途: 摄入源文件指纹 (去重护栏)
// 不变量: 指纹一经记录,永久阻断同内容文件的再次摄入
#[async_trait]
pub trait FingerprintRepository: Send + Sync {
    /// 指纹是否已记录
    async fn has_fingerprint(&self, hash: &str) -> Result<bool, Box<dyn Error>>;

    /// 记录指纹(批次成功完成后的最后一步)
    async fn record_fingerprint(&self, hash: &str) -> Result<(), Box<dyn Error>>;
}

// ==========================================
// BasePayRepository Trait
// ==========================================
// 用途: 角色固定底薪 (pokok) 合计,独立于扣款组件表
#[async_trait]
pub trait BasePayRepository: Send + Sync {
    /// 读取角色固定底薪槽位合计;角色未配置时返回 0
    async fn get_base_total(&self, role_code: &str) -> Result<i64, Box<dyn Error>>;
}

// ==========================================
// BonusLedgerRepository Trait
// ==========================================
// 用途: 期间奖金/调整的台账登记(报表侧记账,非扣款算法)
#[async_trait]
pub trait BonusLedgerRepository: Send + Sync {
    /// 登记一条期间奖金台账
    async fn record_entry(
        &self,
        employee_id: &str,
        period_start: NaiveDate,
        period_end: NaiveDate,
        amount: i64,
        note: Option<&str>,
    ) -> Result<(), Box<dyn Error>>;
}
