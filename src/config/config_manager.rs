// ==========================================
// 尺寸检验系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::inspection_config::{
    InspectionConfigReader, DEFAULT_ADJUDICATION_TIMEOUT_MS, DEFAULT_EXTRACTION_TIMEOUT_MS,
};
use crate::db::open_sqlite_connection;
use crate::domain::types::AdjudicationPolicy;
use async_trait::async_trait;
use rusqlite::{params, Connection};
use serde_json::json;
use std::collections::BTreeMap;
use std::error::Error;
use std::sync::{Arc, Mutex};

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
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 读取 global scope 的配置值（公开方法，供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        self.get_config_value(key)
    }

    fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, Box<dyn Error>> {
        Ok(self.get_config_value(key)?.unwrap_or_else(|| default.to_string()))
    }

    /// 写入 global scope 配置（UPSERT）
    pub fn set_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let key = key.trim();
        if key.is_empty() {
            return Err("配置键不能为空".into());
        }

        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value, updated_at) VALUES ('global', ?1, ?2, datetime('now'))
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;

        tracing::info!(config_key = key, value = value, "配置已更新");
        Ok(())
    }

    /// 获取所有配置的快照（JSON格式，键有序）
    pub fn get_config_snapshot(&self) -> Result<String, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt = conn.prepare(
            "SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key"
        )?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
            ))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        let json_value = json!(config_map);
        Ok(serde_json::to_string(&json_value)?)
    }

    /// 读取正整数毫秒配置,非法值回退默认
    fn get_millis_or_default(&self, key: &str, default: u64) -> Result<u64, Box<dyn Error>> {
        let value = self.get_config_or_default(key, &default.to_string())?;
        match value.trim().parse::<u64>() {
            Ok(ms) if ms > 0 => Ok(ms),
            _ => {
                tracing::warn!(
                    config_key = key,
                    raw_value = %value,
                    "超时配置格式错误，使用默认值 {}",
                    default
                );
                Ok(default)
            }
        }
    }
}

// ==========================================
// InspectionConfigReader Trait 实现
// ==========================================
#[async_trait]
impl InspectionConfigReader for ConfigManager {
    async fn get_adjudication_timeout_ms(&self) -> Result<u64, Box<dyn Error>> {
        self.get_millis_or_default(
            config_keys::ADJUDICATION_TIMEOUT_MS,
            DEFAULT_ADJUDICATION_TIMEOUT_MS,
        )
    }

    async fn get_extraction_timeout_ms(&self) -> Result<u64, Box<dyn Error>> {
        self.get_millis_or_default(
            config_keys::EXTRACTION_TIMEOUT_MS,
            DEFAULT_EXTRACTION_TIMEOUT_MS,
        )
    }

    async fn get_adjudication_policy(&self) -> Result<AdjudicationPolicy, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::ADJUDICATION_POLICY, "OVERRIDE")?;
        Ok(AdjudicationPolicy::parse(&value).unwrap_or_else(|| {
            tracing::warn!(
                config_key = config_keys::ADJUDICATION_POLICY,
                raw_value = %value,
                "裁决策略配置无效，使用 OVERRIDE"
            );
            AdjudicationPolicy::Override
        }))
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 外部协作方超时
    pub const ADJUDICATION_TIMEOUT_MS: &str = "inspection_adjudication_timeout_ms";
    pub const EXTRACTION_TIMEOUT_MS: &str = "inspection_extraction_timeout_ms";

    // 裁决策略 (OVERRIDE | ADVISORY)
    pub const ADJUDICATION_POLICY: &str = "inspection_adjudication_policy";
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::inspection_config::InspectionConfig;
    use std::time::Duration;

    fn memory_manager() -> ConfigManager {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::init_schema(&conn).unwrap();
        ConfigManager::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    #[tokio::test]
    async fn test_defaults_when_unset() {
        let manager = memory_manager();
        let config = manager.load_inspection_config().await.unwrap();
        assert_eq!(config, InspectionConfig::default());
    }

    #[tokio::test]
    async fn test_set_value_overrides() {
        let manager = memory_manager();
        manager.set_value(config_keys::ADJUDICATION_TIMEOUT_MS, "1500").unwrap();
        manager.set_value(config_keys::ADJUDICATION_POLICY, "advisory").unwrap();

        let config = manager.load_inspection_config().await.unwrap();
        assert_eq!(config.adjudication_timeout, Duration::from_millis(1500));
        assert_eq!(config.adjudication_policy, AdjudicationPolicy::Advisory);

        // 再次写入走 UPSERT
        manager.set_value(config_keys::ADJUDICATION_TIMEOUT_MS, "2500").unwrap();
        assert_eq!(manager.get_adjudication_timeout_ms().await.unwrap(), 2500);
    }

    #[tokio::test]
    async fn test_invalid_values_fall_back() {
        let manager = memory_manager();
        manager.set_value(config_keys::EXTRACTION_TIMEOUT_MS, "soon").unwrap();
        manager.set_value(config_keys::ADJUDICATION_TIMEOUT_MS, "0").unwrap();
        manager.set_value(config_keys::ADJUDICATION_POLICY, "MAJORITY").unwrap();

        assert_eq!(
            manager.get_extraction_timeout_ms().await.unwrap(),
            DEFAULT_EXTRACTION_TIMEOUT_MS
        );
        assert_eq!(
            manager.get_adjudication_timeout_ms().await.unwrap(),
            DEFAULT_ADJUDICATION_TIMEOUT_MS
        );
        assert_eq!(
            manager.get_adjudication_policy().await.unwrap(),
            AdjudicationPolicy::Override
        );
    }

    #[test]
    fn test_config_snapshot() {
        let manager = memory_manager();
        manager.set_value("b_key", "2").unwrap();
        manager.set_value("a_key", "1").unwrap();

        let snapshot = manager.get_config_snapshot().unwrap();
        assert_eq!(snapshot, r#"{"a_key":"1","b_key":"2"}"#);
        assert!(manager.set_value("  ", "x").is_err());
    }
}
