// ==========================================
// 考勤薪资扣款引擎 - 期间薪资汇总器
// ==========================================
// 职责: 汇总一个发放期间的日薪净额 + 角色固定底薪 + 手工奖金
// 红线: 固定底薪 (pokok) 每期只加一次,不按天累加
// 红线: 无跨员工耦合,全员汇总 = N 次独立调用
// ==========================================

use crate::domain::salary::PeriodPayrollSummary;
use crate::repository::payroll_repo::{
    BasePayRepository, BonusLedgerRepository, DailySalaryRepository, EmployeeDirectory,
};
use chrono::NaiveDate;
use std::error::Error;
use std::sync::Arc;
use tracing::{info, instrument};

// ==========================================
// PayrollAggregator - 期间汇总器
// ==========================================
// 依赖注入: 数据访问契约由调用方构造时传入,生命周期归调用方所有
pub struct PayrollAggregator {
    daily_repo: Arc<dyn DailySalaryRepository>,
    directory: Arc<dyn EmployeeDirectory>,
    base_pay: Arc<dyn BasePayRepository>,
    bonus_ledger: Arc<dyn BonusLedgerRepository>,
}

impl PayrollAggregator {
    pub fn new(
        daily_repo: Arc<dyn DailySalaryRepository>,
        directory: Arc<dyn EmployeeDirectory>,
        base_pay: Arc<dyn BasePayRepository>,
        bonus_ledger: Arc<dyn BonusLedgerRepository>,
    ) -> Self {
        Self {
            daily_repo,
            directory,
            base_pay,
            bonus_ledger,
        }
    }

    /// 生成一名员工在闭区间 [period_start, period_end] 的期间汇总
    ///
    /// # 参数
    /// - manual_bonus: 手工奖金/调整,可空
    /// - note: 自由文本备注,可空
    ///
    /// # 说明
    /// - manual_bonus 或 note 任一存在时,同步登记一条奖金台账
    ///   (报表侧记账,不参与扣款算法)
    #[instrument(skip(self), fields(employee_id = %employee_id))]
    pub async fn summarize(
        &self,
        employee_id: &str,
        period_start: NaiveDate,
        period_end: NaiveDate,
        manual_bonus: Option<i64>,
        note: Option<&str>,
    ) -> Result<PeriodPayrollSummary, Box<dyn Error>> {
        let employee = self
            .directory
            .find_by_id(employee_id)
            .await?
            .ok_or_else(|| format!("员工不存在: {}", employee_id))?;

        let records = self
            .daily_repo
            .query_range(employee_id, period_start, period_end)
            .await?;
        let total_daily_net: i64 = records.iter().map(|r| r.total_salary).sum();

        // 固定底薪每期加一次
        let total_base_components = self.base_pay.get_base_total(&employee.role_code).await?;

        let total_bonus = manual_bonus.unwrap_or(0);
        if manual_bonus.is_some() || note.is_some() {
            self.bonus_ledger
                .record_entry(employee_id, period_start, period_end, total_bonus, note)
                .await?;
        }

        let summary = PeriodPayrollSummary {
            employee_id: employee_id.to_string(),
            period_start,
            period_end,
            total_base_components,
            total_daily_net,
            total_bonus,
            grand_total: total_base_components + total_daily_net + total_bonus,
        };

        info!(
            days = records.len(),
            total_daily_net = total_daily_net,
            grand_total = summary.grand_total,
            "期间薪资汇总完成"
        );

        Ok(summary)
    }
}
