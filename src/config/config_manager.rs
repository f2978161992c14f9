// ==========================================
// 考勤薪资扣款引擎 - 配置管理器
// ==========================================
// 职责: 配置加载与查询
// 存储: config_kv 表 (key-value)
// ==========================================

use crate::config::schedule_config_trait::ScheduleConfigReader;
use crate::db::{configure_sqlite_connection, open_sqlite_connection};
use async_trait::async_trait;
use chrono::NaiveTime;
use rusqlite::{params, Connection};
use std::error::Error;
use std::sync::{Arc, Mutex};

/// 标准上班时间默认值
pub const DEFAULT_STANDARD_CHECK_IN: &str = "07:30:00";
/// 标准下班时间默认值
pub const DEFAULT_STANDARD_CHECK_OUT: &str = "16:00:00";

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明: 为保证连接行为一致,会对传入连接再次应用统一 PRAGMA(幂等)。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 写入配置值 (INSERT OR REPLACE)
    pub fn set_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        conn.execute(
            "INSERT OR REPLACE INTO config_kv (key, value, updated_at) VALUES (?1, ?2, datetime('now'))",
            params![key, value],
        )?;

        Ok(())
    }

    /// 读取时间类配置,缺失时落到默认值
    fn get_time_or_default(&self, key: &str, default: &str) -> Result<NaiveTime, Box<dyn Error>> {
        let raw = self.get_config_value(key)?.unwrap_or_else(|| default.to_string());
        let time = NaiveTime::parse_from_str(raw.trim(), "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(raw.trim(), "%H:%M"))
            .map_err(|e| format!("配置值格式错误 (key: {}, value: {}): {}", key, raw, e))?;
        Ok(time)
    }
}

#[async_trait]
impl ScheduleConfigReader for ConfigManager {
    async fn get_standard_check_in(&self) -> Result<NaiveTime, Box<dyn Error>> {
        self.get_time_or_default("schedule/standard_check_in", DEFAULT_STANDARD_CHECK_IN)
    }

    async fn get_standard_check_out(&self) -> Result<NaiveTime, Box<dyn Error>> {
        self.get_time_or_default("schedule/standard_check_out", DEFAULT_STANDARD_CHECK_OUT)
    }
}
