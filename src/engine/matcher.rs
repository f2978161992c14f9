// ==========================================
// 考勤薪资扣款引擎 - 扣款规则匹配器
// ==========================================
// 职责: 由归一化考勤记录与规则集计算扣款计划
// 红线: 无状态、无副作用、无 I/O 操作
// ==========================================
// 两套规则选择语义(业务确认为有意的不对称,不得"修一致"):
// - 迟到/早退: 阶梯单赢,每槽位仅取"不超过观察分钟数的最大阈值"那一条
// - 缺上班卡/缺下班卡: 全量适用,该类型所有规则无条件生效,不看阈值
// ==========================================

use crate::domain::attendance::NormalizedAttendance;
use crate::domain::salary::DeductionRule;
use crate::domain::types::ViolationType;
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ==========================================
// PlanStep - 扣款计划中的一步
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanStep {
    pub violation_type: ViolationType,
    pub slot: usize, // 目标槽位 (1..=10)
    pub percent: i64,
}

// ==========================================
// DeductionPlan - 扣款计划
// ==========================================
// steps 已按固定违规顺序排列 (迟到 → 早退 → 缺上班卡 → 缺下班卡),
// 由台账逐步作用于"已扣余额",后面的步骤按缩减后的余额计算
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionPlan {
    pub late_minutes: i64,
    pub early_leave_minutes: i64,
    pub steps: Vec<PlanStep>,
}

impl DeductionPlan {
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

// ==========================================
// DeductionMatcher - 规则匹配器(纯函数)
// ==========================================
pub struct DeductionMatcher;

impl DeductionMatcher {
    /// 计算迟到分钟数
    ///
    /// # 规则
    /// - check_in 存在 → max(0, check_in - standard_check_in)
    /// - check_in 缺失 → 0 (缺卡按独立违规类型处理,不是"无限迟到")
    pub fn late_minutes(check_in: Option<NaiveTime>, standard_check_in: NaiveTime) -> i64 {
        match check_in {
            Some(actual) => actual
                .signed_duration_since(standard_check_in)
                .num_minutes()
                .max(0),
            None => 0,
        }
    }

    /// 计算早退分钟数
    ///
    /// # 规则
    /// - check_out 存在 → max(0, standard_check_out - check_out)
    /// - check_out 缺失 → 0
    pub fn early_leave_minutes(
        check_out: Option<NaiveTime>,
        standard_check_out: NaiveTime,
    ) -> i64 {
        match check_out {
            Some(actual) => standard_check_out
                .signed_duration_since(actual)
                .num_minutes()
                .max(0),
            None => 0,
        }
    }

    /// 阶梯单赢选择 (迟到/早退)
    ///
    /// # 规则
    /// - 按 target_slot 分组;组内只保留"阈值 ≤ 观察分钟数"中阈值最大的那条规则
    /// - 观察分钟数为 0 时不触发任何规则(阈值 0 的规则不得扣准点员工)
    /// - 无符合规则的槽位不动
    ///
    /// # 返回
    /// - Vec<(slot, percent)>: 按槽位升序,保证输出确定性
    fn select_tiered(
        rules: &[DeductionRule],
        violation_type: ViolationType,
        observed_minutes: i64,
    ) -> Vec<(usize, i64)> {
        if observed_minutes <= 0 {
            return Vec::new();
        }

        // 槽位 → 当前最优 (阈值, 百分比)
        let mut winners: HashMap<usize, (i64, i64)> = HashMap::new();
        for rule in rules {
            if rule.violation_type != violation_type {
                continue;
            }
            if rule.minute_threshold > observed_minutes {
                continue;
            }

            match winners.get(&rule.target_slot) {
                Some((best_threshold, _)) if *best_threshold >= rule.minute_threshold => {}
                _ => {
                    winners.insert(rule.target_slot, (rule.minute_threshold, rule.percent));
                }
            }
        }

        let mut selected: Vec<(usize, i64)> = winners
            .into_iter()
            .map(|(slot, (_, percent))| (slot, percent))
            .collect();
        selected.sort_by_key(|(slot, _)| *slot);
        selected
    }

    /// 全量适用选择 (缺上班卡/缺下班卡)
    ///
    /// # 规则
    /// - 该违规类型的所有规则无条件生效,阈值不参与判断
    fn select_all(rules: &[DeductionRule], violation_type: ViolationType) -> Vec<(usize, i64)> {
        let mut selected: Vec<(usize, i64)> = rules
            .iter()
            .filter(|r| r.violation_type == violation_type)
            .map(|r| (r.target_slot, r.percent))
            .collect();
        selected.sort_by_key(|(slot, _)| *slot);
        selected
    }

    /// 构建扣款计划
    ///
    /// # 参数
    /// - record: 归一化考勤记录(可能缺上班卡或下班卡)
    /// - rules: 该角色的全部扣款规则
    /// - standard_check_in / standard_check_out: 标准作息时间
    ///
    /// # 返回
    /// - DeductionPlan: steps 已按固定违规顺序排列
    pub fn build_plan(
        record: &NormalizedAttendance,
        rules: &[DeductionRule],
        standard_check_in: NaiveTime,
        standard_check_out: NaiveTime,
    ) -> DeductionPlan {
        let late_minutes = Self::late_minutes(record.check_in, standard_check_in);
        let early_leave_minutes = Self::early_leave_minutes(record.check_out, standard_check_out);

        let mut steps = Vec::new();
        for violation_type in ViolationType::APPLY_ORDER {
            let selected = match violation_type {
                ViolationType::LateArrival => {
                    Self::select_tiered(rules, violation_type, late_minutes)
                }
                ViolationType::EarlyLeave => {
                    Self::select_tiered(rules, violation_type, early_leave_minutes)
                }
                ViolationType::MissingCheckIn => {
                    if record.check_in.is_none() {
                        Self::select_all(rules, violation_type)
                    } else {
                        Vec::new()
                    }
                }
                ViolationType::MissingCheckOut => {
                    if record.check_out.is_none() {
                        Self::select_all(rules, violation_type)
                    } else {
                        Vec::new()
                    }
                }
            };

            for (slot, percent) in selected {
                steps.push(PlanStep {
                    violation_type,
                    slot,
                    percent,
                });
            }
        }

        DeductionPlan {
            late_minutes,
            early_leave_minutes,
            steps,
        }
    }
}
