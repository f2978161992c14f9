// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、种子数据生成等功能
// ==========================================

use attendance_payroll::repository::PayrollRepositoryImpl;
use rusqlite::{params, Connection};
use std::error::Error;
use tempfile::NamedTempFile;

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_str().unwrap().to_string();

    let repo = PayrollRepositoryImpl::new(&db_path)?;
    repo.init_schema()?;

    Ok((temp_file, db_path))
}

/// 插入一名测试员工
pub fn seed_employee(
    conn: &Connection,
    employee_id: &str,
    badge: &str,
    full_name: &str,
    role_code: &str,
) -> Result<(), Box<dyn Error>> {
    conn.execute(
        "INSERT OR REPLACE INTO employee (employee_id, badge, full_name, role_code) VALUES (?1, ?2, ?3, ?4)",
        params![employee_id, badge, full_name, role_code],
    )?;
    Ok(())
}

/// 插入角色的薪资组件基数 (仅给定槽位非零)
pub fn seed_components(
    conn: &Connection,
    role_code: &str,
    amounts: &[(usize, i64)],
) -> Result<(), Box<dyn Error>> {
    let mut slots = [0i64; 10];
    for &(slot, amount) in amounts {
        slots[slot - 1] = amount;
    }

    conn.execute(
        r#"
        INSERT OR REPLACE INTO salary_component (
            role_code,
            component_1, component_2, component_3, component_4, component_5,
            component_6, component_7, component_8, component_9, component_10
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        "#,
        params![
            role_code, slots[0], slots[1], slots[2], slots[3], slots[4], slots[5], slots[6],
            slots[7], slots[8], slots[9]
        ],
    )?;
    Ok(())
}

/// 插入一条扣款规则
pub fn seed_rule(
    conn: &Connection,
    rule_id: &str,
    role_code: &str,
    violation_type: &str,
    minute_threshold: i64,
    target_slot: i64,
    percent: i64,
) -> Result<(), Box<dyn Error>> {
    conn.execute(
        r#"
        INSERT OR REPLACE INTO deduction_rule
            (rule_id, role_code, violation_type, minute_threshold, target_slot, percent)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
        params![rule_id, role_code, violation_type, minute_threshold, target_slot, percent],
    )?;
    Ok(())
}

/// 插入角色固定底薪槽位
pub fn seed_base_pay(
    conn: &Connection,
    role_code: &str,
    slot: i64,
    amount: i64,
) -> Result<(), Box<dyn Error>> {
    conn.execute(
        "INSERT OR REPLACE INTO base_pay (role_code, slot, amount) VALUES (?1, ?2, ?3)",
        params![role_code, slot, amount],
    )?;
    Ok(())
}

/// 写入标准作息配置
pub fn seed_schedule(
    conn: &Connection,
    standard_check_in: &str,
    standard_check_out: &str,
) -> Result<(), Box<dyn Error>> {
    conn.execute(
        "INSERT OR REPLACE INTO config_kv (key, value, updated_at) VALUES ('schedule/standard_check_in', ?1, datetime('now'))",
        params![standard_check_in],
    )?;
    conn.execute(
        "INSERT OR REPLACE INTO config_kv (key, value, updated_at) VALUES ('schedule/standard_check_out', ?1, datetime('now'))",
        params![standard_check_out],
    )?;
    Ok(())
}
