// ==========================================
// 考勤薪资扣款引擎 - 薪资领域模型
// ==========================================
// 依据: 薪资组件表 - 每角色 10 个独立组件槽位
// 依据: 扣款规则表 - (角色, 违规类型, 分钟阈值, 目标槽位, 百分比)
// 红线: 金额一律为整数 (i64),百分比扣款向零截断
// ==========================================

use crate::domain::types::ViolationType;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// 薪资组件槽位数
pub const COMPONENT_SLOTS: usize = 10;

// ==========================================
// Employee - 人员目录条目
// ==========================================
// 用途: 外部人员目录的只读投影 (按工号检索)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employee {
    pub employee_id: String, // 内部主键
    pub badge: String,       // 工号 (NIP)
    pub full_name: String,
    pub role_code: String, // 角色代码 (决定组件与规则)
}

// ==========================================
// SalaryComponentSet - 角色薪资组件基数
// ==========================================
// 用途: 只读输入,扣款重算的起点
// 槽位编号对外为 1..=10,内部数组下标 0..=9
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalaryComponentSet {
    pub role_code: String,
    pub components: [i64; COMPONENT_SLOTS],
}

// ==========================================
// DeductionRule - 扣款规则
// ==========================================
// 同一 (role, violation_type, target_slot) 允许多条不同阈值的规则,
// 构成阶梯 (tier)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeductionRule {
    pub rule_id: String,
    pub role_code: String,
    pub violation_type: ViolationType,
    pub minute_threshold: i64, // 分钟阈值 (>= 0)
    pub target_slot: usize,    // 目标槽位 (1..=10)
    pub percent: i64,          // 扣款百分比 (0..=100)
}

// ==========================================
// DailySalaryRecord - 日薪记录 (落库实体)
// ==========================================
// 主键: (employee_id, date)
// 首次摄入 INSERT,同键重复摄入 UPDATE (从基数重算,不叠扣)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailySalaryRecord {
    pub employee_id: String,
    pub date: NaiveDate,

    // ===== 扣后组件余额 =====
    pub components_final: [i64; COMPONENT_SLOTS],

    // ===== 审计: 按违规类型累计的扣款金额 =====
    pub late_arrival_deduction: i64,
    pub early_leave_deduction: i64,
    pub missing_check_in_deduction: i64,
    pub missing_check_out_deduction: i64,

    // ===== 考勤时间 =====
    pub check_in: Option<NaiveTime>,
    pub check_out: Option<NaiveTime>,

    /// total_salary = max(0, Σ components_final)
    pub total_salary: i64,
}

impl DailySalaryRecord {
    /// 按违规类型读取审计扣款金额
    pub fn deduction_for(&self, violation_type: ViolationType) -> i64 {
        match violation_type {
            ViolationType::LateArrival => self.late_arrival_deduction,
            ViolationType::EarlyLeave => self.early_leave_deduction,
            ViolationType::MissingCheckIn => self.missing_check_in_deduction,
            ViolationType::MissingCheckOut => self.missing_check_out_deduction,
        }
    }
}

// ==========================================
// PeriodPayrollSummary - 期间薪资汇总 (派生,不落库)
// ==========================================
// grand_total = 固定底薪合计 + 日薪净额合计 + 手工奖金
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodPayrollSummary {
    pub employee_id: String,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub total_base_components: i64, // 角色固定底薪 (pokok) 合计,每期只加一次
    pub total_daily_net: i64,       // 区间内 total_salary 合计
    pub total_bonus: i64,           // 手工奖金/调整 (可为 0)
    pub grand_total: i64,
}
