// ==========================================
// 考勤薪资扣款引擎 - 存储契约 rusqlite 实现
// ==========================================
// 职责: 实现全部存储契约 (日薪/指纹/规则/组件/目录/底薪/奖金台账)
// 约束: 所有查询使用参数化,防止 SQL 注入
// 约束: 日薪 upsert 在单事务内完成
// ==========================================

use crate::db::{configure_sqlite_connection, open_sqlite_connection};
use crate::domain::salary::{
    DailySalaryRecord, DeductionRule, Employee, SalaryComponentSet, COMPONENT_SLOTS,
};
use crate::domain::types::ViolationType;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::payroll_repo::{
    BasePayRepository, BonusLedgerRepository, DailySalaryRepository, DeductionRuleRepository,
    EmployeeDirectory, FingerprintRepository, SalaryComponentRepository,
};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime, Utc};
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

/// 日期列的存储格式
const DATE_FMT: &str = "%Y-%m-%d";
/// 时间列的存储格式
const TIME_FMT: &str = "%H:%M:%S";

// ==========================================
// PayrollRepositoryImpl
// ==========================================
pub struct PayrollRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl PayrollRepositoryImpl {
    /// 创建新的 Repository 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 Repository
    ///
    /// 说明: 为保证连接行为一致,会对传入连接再次应用统一 PRAGMA(幂等)。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 初始化全部引擎表 (IF NOT EXISTS,可重复调用)
    pub fn init_schema(&self) -> Result<(), Box<dyn Error>> {
        let conn = self.get_conn()?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS employee (
                employee_id TEXT PRIMARY KEY,
                badge TEXT NOT NULL UNIQUE,
                full_name TEXT NOT NULL,
                role_code TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS salary_component (
                role_code TEXT PRIMARY KEY,
                component_1 INTEGER NOT NULL DEFAULT 0,
                component_2 INTEGER NOT NULL DEFAULT 0,
                component_3 INTEGER NOT NULL DEFAULT 0,
                component_4 INTEGER NOT NULL DEFAULT 0,
                component_5 INTEGER NOT NULL DEFAULT 0,
                component_6 INTEGER NOT NULL DEFAULT 0,
                component_7 INTEGER NOT NULL DEFAULT 0,
                component_8 INTEGER NOT NULL DEFAULT 0,
                component_9 INTEGER NOT NULL DEFAULT 0,
                component_10 INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS deduction_rule (
                rule_id TEXT PRIMARY KEY,
                role_code TEXT NOT NULL,
                violation_type TEXT NOT NULL,
                minute_threshold INTEGER NOT NULL DEFAULT 0,
                target_slot INTEGER NOT NULL,
                percent INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_deduction_rule_role
                ON deduction_rule(role_code, violation_type);

            CREATE TABLE IF NOT EXISTS daily_salary (
                employee_id TEXT NOT NULL,
                date TEXT NOT NULL,
                component_1 INTEGER NOT NULL DEFAULT 0,
                component_2 INTEGER NOT NULL DEFAULT 0,
                component_3 INTEGER NOT NULL DEFAULT 0,
                component_4 INTEGER NOT NULL DEFAULT 0,
                component_5 INTEGER NOT NULL DEFAULT 0,
                component_6 INTEGER NOT NULL DEFAULT 0,
                component_7 INTEGER NOT NULL DEFAULT 0,
                component_8 INTEGER NOT NULL DEFAULT 0,
                component_9 INTEGER NOT NULL DEFAULT 0,
                component_10 INTEGER NOT NULL DEFAULT 0,
                late_arrival_deduction INTEGER NOT NULL DEFAULT 0,
                early_leave_deduction INTEGER NOT NULL DEFAULT 0,
                missing_check_in_deduction INTEGER NOT NULL DEFAULT 0,
                missing_check_out_deduction INTEGER NOT NULL DEFAULT 0,
                check_in TEXT,
                check_out TEXT,
                total_salary INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (employee_id, date)
            );

            CREATE TABLE IF NOT EXISTS upload_fingerprint (
                hash TEXT PRIMARY KEY,
                recorded_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS base_pay (
                role_code TEXT NOT NULL,
                slot INTEGER NOT NULL,
                amount INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (role_code, slot)
            );

            CREATE TABLE IF NOT EXISTS bonus_ledger (
                entry_id TEXT PRIMARY KEY,
                employee_id TEXT NOT NULL,
                period_start TEXT NOT NULL,
                period_end TEXT NOT NULL,
                amount INTEGER NOT NULL DEFAULT 0,
                note TEXT,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS config_kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            "#,
        )?;

        Ok(())
    }

    /// 行映射: daily_salary → DailySalaryRecord
    fn map_daily_row(row: &Row<'_>) -> rusqlite::Result<DailySalaryRecord> {
        let date_raw: String = row.get("date")?;
        let date = NaiveDate::parse_from_str(&date_raw, DATE_FMT).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                1,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })?;

        let parse_time = |raw: Option<String>| -> Option<NaiveTime> {
            raw.and_then(|t| NaiveTime::parse_from_str(&t, TIME_FMT).ok())
        };

        let mut components_final = [0i64; COMPONENT_SLOTS];
        for (idx, value) in components_final.iter_mut().enumerate() {
            *value = row.get::<_, i64>(format!("component_{}", idx + 1).as_str())?;
        }

        Ok(DailySalaryRecord {
            employee_id: row.get("employee_id")?,
            date,
            components_final,
            late_arrival_deduction: row.get("late_arrival_deduction")?,
            early_leave_deduction: row.get("early_leave_deduction")?,
            missing_check_in_deduction: row.get("missing_check_in_deduction")?,
            missing_check_out_deduction: row.get("missing_check_out_deduction")?,
            check_in: parse_time(row.get("check_in")?),
            check_out: parse_time(row.get("check_out")?),
            total_salary: row.get("total_salary")?,
        })
    }
}

// ==========================================
// EmployeeDirectory 实现
// ==========================================
#[async_trait]
impl EmployeeDirectory for PayrollRepositoryImpl {
    async fn find_by_badge(&self, badge: &str) -> Result<Option<Employee>, Box<dyn Error>> {
        let conn = self.get_conn()?;

        let result = conn.query_row(
            "SELECT employee_id, badge, full_name, role_code FROM employee WHERE badge = ?1",
            params![badge],
            |row| {
                Ok(Employee {
                    employee_id: row.get(0)?,
                    badge: row.get(1)?,
                    full_name: row.get(2)?,
                    role_code: row.get(3)?,
                })
            },
        );

        match result {
            Ok(employee) => Ok(Some(employee)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    async fn find_by_id(&self, employee_id: &str) -> Result<Option<Employee>, Box<dyn Error>> {
        let conn = self.get_conn()?;

        let result = conn.query_row(
            "SELECT employee_id, badge, full_name, role_code FROM employee WHERE employee_id = ?1",
            params![employee_id],
            |row| {
                Ok(Employee {
                    employee_id: row.get(0)?,
                    badge: row.get(1)?,
                    full_name: row.get(2)?,
                    role_code: row.get(3)?,
                })
            },
        );

        match result {
            Ok(employee) => Ok(Some(employee)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }
}

// ==========================================
// SalaryComponentRepository 实现
// ==========================================
#[async_trait]
impl SalaryComponentRepository for PayrollRepositoryImpl {
    async fn get_components(
        &self,
        role_code: &str,
    ) -> Result<Option<SalaryComponentSet>, Box<dyn Error>> {
        let conn = self.get_conn()?;

        let result = conn.query_row(
            r#"
            SELECT role_code,
                   component_1, component_2, component_3, component_4, component_5,
                   component_6, component_7, component_8, component_9, component_10
            FROM salary_component WHERE role_code = ?1
            "#,
            params![role_code],
            |row| {
                let mut components = [0i64; COMPONENT_SLOTS];
                for (idx, value) in components.iter_mut().enumerate() {
                    *value = row.get(idx + 1)?;
                }
                Ok(SalaryComponentSet {
                    role_code: row.get(0)?,
                    components,
                })
            },
        );

        match result {
            Ok(set) => Ok(Some(set)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }
}

// ==========================================
// DeductionRuleRepository 实现
// ==========================================
#[async_trait]
impl DeductionRuleRepository for PayrollRepositoryImpl {
    async fn list_rules(&self, role_code: &str) -> Result<Vec<DeductionRule>, Box<dyn Error>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT rule_id, role_code, violation_type, minute_threshold, target_slot, percent
            FROM deduction_rule
            WHERE role_code = ?1
            ORDER BY minute_threshold ASC
            "#,
        )?;

        let rows = stmt.query_map(params![role_code], |row| {
            let violation_raw: String = row.get(2)?;
            let target_slot: i64 = row.get(4)?;
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                violation_raw,
                row.get::<_, i64>(3)?,
                target_slot,
                row.get::<_, i64>(5)?,
            ))
        })?;

        let mut rules = Vec::new();
        for row in rows {
            let (rule_id, role_code, violation_raw, minute_threshold, target_slot, percent) = row?;
            // 未知违规类型的历史脏数据直接跳过,不阻断规则读取
            let Some(violation_type) = ViolationType::parse(&violation_raw) else {
                tracing::warn!(rule_id = %rule_id, raw = %violation_raw, "未知违规类型,规则被忽略");
                continue;
            };

            // 目标槽位越界的脏规则同样跳过,不得进入台账索引
            if !(1..=COMPONENT_SLOTS as i64).contains(&target_slot) {
                tracing::warn!(rule_id = %rule_id, target_slot, "目标槽位越界,规则被忽略");
                continue;
            }

            rules.push(DeductionRule {
                rule_id,
                role_code,
                violation_type,
                minute_threshold,
                target_slot: target_slot as usize,
                percent,
            });
        }

        Ok(rules)
    }
}

// ==========================================
// DailySalaryRepository 实现
// ==========================================
#[async_trait]
impl DailySalaryRepository for PayrollRepositoryImpl {
    async fn get_daily_record(
        &self,
        employee_id: &str,
        date: NaiveDate,
    ) -> Result<Option<DailySalaryRecord>, Box<dyn Error>> {
        let conn = self.get_conn()?;

        let result = conn.query_row(
            "SELECT * FROM daily_salary WHERE employee_id = ?1 AND date = ?2",
            params![employee_id, date.format(DATE_FMT).to_string()],
            Self::map_daily_row,
        );

        match result {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    async fn upsert_daily_record(
        &self,
        record: &DailySalaryRecord,
    ) -> Result<(), Box<dyn Error>> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let now = Utc::now().to_rfc3339();
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO daily_salary (
                    employee_id, date,
                    component_1, component_2, component_3, component_4, component_5,
                    component_6, component_7, component_8, component_9, component_10,
                    late_arrival_deduction, early_leave_deduction,
                    missing_check_in_deduction, missing_check_out_deduction,
                    check_in, check_out, total_salary, created_at, updated_at
                ) VALUES (
                    ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12,
                    ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21
                )
                ON CONFLICT(employee_id, date) DO UPDATE SET
                    component_1 = excluded.component_1,
                    component_2 = excluded.component_2,
                    component_3 = excluded.component_3,
                    component_4 = excluded.component_4,
                    component_5 = excluded.component_5,
                    component_6 = excluded.component_6,
                    component_7 = excluded.component_7,
                    component_8 = excluded.component_8,
                    component_9 = excluded.component_9,
                    component_10 = excluded.component_10,
                    late_arrival_deduction = excluded.late_arrival_deduction,
                    early_leave_deduction = excluded.early_leave_deduction,
                    missing_check_in_deduction = excluded.missing_check_in_deduction,
                    missing_check_out_deduction = excluded.missing_check_out_deduction,
                    check_in = COALESCE(excluded.check_in, daily_salary.check_in),
                    check_out = COALESCE(excluded.check_out, daily_salary.check_out),
                    total_salary = excluded.total_salary,
                    updated_at = excluded.updated_at
                "#,
            )?;

            stmt.execute(params![
                record.employee_id,
                record.date.format(DATE_FMT).to_string(),
                record.components_final[0],
                record.components_final[1],
                record.components_final[2],
                record.components_final[3],
                record.components_final[4],
                record.components_final[5],
                record.components_final[6],
                record.components_final[7],
                record.components_final[8],
                record.components_final[9],
                record.late_arrival_deduction,
                record.early_leave_deduction,
                record.missing_check_in_deduction,
                record.missing_check_out_deduction,
                record.check_in.map(|t| t.format(TIME_FMT).to_string()),
                record.check_out.map(|t| t.format(TIME_FMT).to_string()),
                record.total_salary,
                now,
                now,
            ])?;
        }

        tx.commit()?;
        Ok(())
    }

    async fn query_range(
        &self,
        employee_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailySalaryRecord>, Box<dyn Error>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT * FROM daily_salary
            WHERE employee_id = ?1 AND date >= ?2 AND date <= ?3
            ORDER BY date ASC
            "#,
        )?;

        let rows = stmt.query_map(
            params![
                employee_id,
                start.format(DATE_FMT).to_string(),
                end.format(DATE_FMT).to_string()
            ],
            Self::map_daily_row,
        )?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }

        Ok(records)
    }
}

// ==========================================
// FingerprintRepository 实现
// ==========================================
#[async_trait]
impl FingerprintRepository for PayrollRepositoryImpl {
    async fn has_fingerprint(&self, hash: &str) -> Result<bool, Box<dyn Error>> {
        let conn = self.get_conn()?;

        let result = conn.query_row(
            "SELECT 1 FROM upload_fingerprint WHERE hash = ?1 LIMIT 1",
            params![hash],
            |_row| Ok(true),
        );

        match result {
            Ok(found) => Ok(found),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(false),
            Err(e) => Err(Box::new(e)),
        }
    }

    async fn record_fingerprint(&self, hash: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.get_conn()?;

        conn.execute(
            "INSERT OR IGNORE INTO upload_fingerprint (hash, recorded_at) VALUES (?1, ?2)",
            params![hash, Utc::now().to_rfc3339()],
        )?;

        Ok(())
    }
}

// ==========================================
// BasePayRepository 实现
// ==========================================
#[async_trait]
impl BasePayRepository for PayrollRepositoryImpl {
    async fn get_base_total(&self, role_code: &str) -> Result<i64, Box<dyn Error>> {
        let conn = self.get_conn()?;

        let total: i64 = conn.query_row(
            "SELECT COALESCE(SUM(amount), 0) FROM base_pay WHERE role_code = ?1",
            params![role_code],
            |row| row.get(0),
        )?;

        Ok(total)
    }
}

// ==========================================
// BonusLedgerRepository 实现
// ==========================================
#[async_trait]
impl BonusLedgerRepository for PayrollRepositoryImpl {
    async fn record_entry(
        &self,
        employee_id: &str,
        period_start: NaiveDate,
        period_end: NaiveDate,
        amount: i64,
        note: Option<&str>,
    ) -> Result<(), Box<dyn Error>> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"
            INSERT INTO bonus_ledger (entry_id, employee_id, period_start, period_end, amount, note, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                Uuid::new_v4().to_string(),
                employee_id,
                period_start.format(DATE_FMT).to_string(),
                period_end.format(DATE_FMT).to_string(),
                amount,
                note,
                Utc::now().to_rfc3339(),
            ],
        )?;

        Ok(())
    }
}
