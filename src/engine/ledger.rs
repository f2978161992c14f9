// ==========================================
// 考勤薪资扣款引擎 - 日薪台账
// ==========================================
// 职责: 把扣款计划作用到角色组件基数,幂等落库
// 红线: 重复摄入一律"从基数重算",绝不在已扣余额上叠扣
// 红线: 金额为整数运算,百分比扣款向零截断 (floor),不四舍五入
// ==========================================

use crate::domain::attendance::NormalizedAttendance;
use crate::domain::salary::{DailySalaryRecord, DeductionRule, SalaryComponentSet};
use crate::domain::types::{UpsertOutcome, ViolationType};
use crate::engine::matcher::{DeductionMatcher, DeductionPlan};
use crate::repository::payroll_repo::DailySalaryRepository;
use chrono::{NaiveDate, NaiveTime};
use std::error::Error;
use tracing::debug;

// ==========================================
// SalaryLedger - 日薪台账
// ==========================================
pub struct SalaryLedger;

impl SalaryLedger {
    /// 从基数计算一条日薪记录(纯函数)
    ///
    /// # 规则
    /// - components_final 从 components 基数起算
    /// - 计划步骤按固定顺序作用: 每步扣款 = 当前余额 * percent / 100 (截断),
    ///   从余额中减去并累计到该违规类型的审计字段
    /// - total_salary = max(0, Σ components_final)
    pub fn compute(
        employee_id: &str,
        date: NaiveDate,
        components: &SalaryComponentSet,
        plan: &DeductionPlan,
        check_in: Option<NaiveTime>,
        check_out: Option<NaiveTime>,
    ) -> DailySalaryRecord {
        let mut record = DailySalaryRecord {
            employee_id: employee_id.to_string(),
            date,
            components_final: components.components,
            late_arrival_deduction: 0,
            early_leave_deduction: 0,
            missing_check_in_deduction: 0,
            missing_check_out_deduction: 0,
            check_in,
            check_out,
            total_salary: 0,
        };

        for step in &plan.steps {
            let balance = record.components_final[step.slot - 1];
            // 整数截断除法,余额非负时等价于向下取整
            let deduction = balance * step.percent / 100;
            record.components_final[step.slot - 1] = balance - deduction;

            match step.violation_type {
                ViolationType::LateArrival => record.late_arrival_deduction += deduction,
                ViolationType::EarlyLeave => record.early_leave_deduction += deduction,
                ViolationType::MissingCheckIn => record.missing_check_in_deduction += deduction,
                ViolationType::MissingCheckOut => record.missing_check_out_deduction += deduction,
            }
        }

        let sum: i64 = record.components_final.iter().sum();
        record.total_salary = sum.max(0);

        record
    }

    /// 计算并幂等落库
    ///
    /// # 流程
    /// 1. 读取同键已有记录
    /// 2. 合并考勤时间: 新值非空才覆盖 (COALESCE 语义,不用空值冲掉好值)
    /// 3. 按合并后的有效时间对重建扣款计划,从基数重算全部字段
    /// 4. upsert (INSERT 或同键 UPDATE)
    ///
    /// # 说明
    /// - "补下班卡"场景 (已有记录含上班卡,本批只带下班卡) 因此自动满足:
    ///   迟到扣款按存量上班卡重算,早退扣款按新下班卡计算,
    ///   缺下班卡扣款归零,不会跨多次部分更新叠扣
    pub async fn apply_and_upsert(
        repo: &dyn DailySalaryRepository,
        employee_id: &str,
        components: &SalaryComponentSet,
        rules: &[DeductionRule],
        normalized: &NormalizedAttendance,
        standard_check_in: NaiveTime,
        standard_check_out: NaiveTime,
    ) -> Result<UpsertOutcome, Box<dyn Error>> {
        let existing = repo.get_daily_record(employee_id, normalized.date).await?;

        let (effective_check_in, effective_check_out, outcome) = match &existing {
            Some(stored) => {
                if normalized.check_in.is_none() && normalized.check_out.is_some() {
                    debug!(
                        employee_id = %employee_id,
                        date = %normalized.date,
                        "补下班卡更新,从基数重算"
                    );
                }
                (
                    normalized.check_in.or(stored.check_in),
                    normalized.check_out.or(stored.check_out),
                    UpsertOutcome::Updated,
                )
            }
            None => (normalized.check_in, normalized.check_out, UpsertOutcome::Created),
        };

        let effective = NormalizedAttendance {
            badge: normalized.badge.clone(),
            date: normalized.date,
            check_in: effective_check_in,
            check_out: effective_check_out,
        };

        let plan =
            DeductionMatcher::build_plan(&effective, rules, standard_check_in, standard_check_out);

        let record = Self::compute(
            employee_id,
            normalized.date,
            components,
            &plan,
            effective.check_in,
            effective.check_out,
        );

        repo.upsert_daily_record(&record).await?;

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::matcher::PlanStep;

    fn components(slot1: i64) -> SalaryComponentSet {
        let mut set = SalaryComponentSet {
            role_code: "GURU".to_string(),
            components: [0; 10],
        };
        set.components[0] = slot1;
        set
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()
    }

    #[test]
    fn test_sequential_deduction_uses_reduced_balance() {
        // 迟到 10% 与早退 10% 都指向槽位1,基数 1,000,000:
        // 1,000,000 - 100,000 = 900,000; 900,000 - 90,000 = 810,000
        let plan = DeductionPlan {
            late_minutes: 30,
            early_leave_minutes: 30,
            steps: vec![
                PlanStep {
                    violation_type: ViolationType::LateArrival,
                    slot: 1,
                    percent: 10,
                },
                PlanStep {
                    violation_type: ViolationType::EarlyLeave,
                    slot: 1,
                    percent: 10,
                },
            ],
        };

        let record =
            SalaryLedger::compute("emp-1", date(), &components(1_000_000), &plan, None, None);

        assert_eq!(record.components_final[0], 810_000);
        assert_eq!(record.late_arrival_deduction, 100_000);
        assert_eq!(record.early_leave_deduction, 90_000);
        assert_eq!(record.total_salary, 810_000);
    }

    #[test]
    fn test_percentage_truncates_toward_zero() {
        // 999 * 10% = 99.9 → 99,不得四舍五入为 100
        let plan = DeductionPlan {
            steps: vec![PlanStep {
                violation_type: ViolationType::LateArrival,
                slot: 1,
                percent: 10,
            }],
            ..Default::default()
        };

        let record = SalaryLedger::compute("emp-1", date(), &components(999), &plan, None, None);
        assert_eq!(record.late_arrival_deduction, 99);
        assert_eq!(record.components_final[0], 900);
    }

    #[test]
    fn test_total_salary_floor_at_zero() {
        // 百分比扣款不会把单槽位扣成负数,total 也必须被钳制为非负
        let plan = DeductionPlan {
            steps: vec![
                PlanStep {
                    violation_type: ViolationType::MissingCheckIn,
                    slot: 1,
                    percent: 100,
                },
                PlanStep {
                    violation_type: ViolationType::MissingCheckOut,
                    slot: 1,
                    percent: 100,
                },
            ],
            ..Default::default()
        };

        let record = SalaryLedger::compute("emp-1", date(), &components(500), &plan, None, None);
        assert_eq!(record.components_final[0], 0);
        assert_eq!(record.missing_check_in_deduction, 500);
        assert_eq!(record.missing_check_out_deduction, 0);
        assert_eq!(record.total_salary, 0);
        assert!(record.total_salary >= 0);
    }

    #[test]
    fn test_empty_plan_keeps_base_amounts() {
        let plan = DeductionPlan::default();
        let base = components(750_000);
        let record = SalaryLedger::compute("emp-1", date(), &base, &plan, None, None);
        assert_eq!(record.components_final, base.components);
        assert_eq!(record.total_salary, 750_000);
    }
}
