// ==========================================
// 订舱履约核心 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::fulfillment_config_trait::FulfillmentConfigReader;
use crate::db::open_sqlite_connection;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 读取 global scope 的配置值
    pub fn get_global_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;

        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;

        Ok(value)
    }

    /// 写入 global scope 的配置值（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    /// 读取配置值，空白或缺失时回落默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> RepositoryResult<String> {
        let value = self
            .get_global_config_value(key)?
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        Ok(value.unwrap_or_else(|| default.to_string()))
    }

    /// 获取所有 global 配置的快照（JSON格式）
    ///
    /// # 用途
    /// - 启动日志与运维排查时记录生效配置
    pub fn get_config_snapshot(&self) -> RepositoryResult<String> {
        let conn = self.get_conn()?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&json!(config_map))?)
    }
}

// ==========================================
// FulfillmentConfigReader Trait 实现
// ==========================================
impl FulfillmentConfigReader for ConfigManager {
    fn get_invoice_currency(&self) -> RepositoryResult<String> {
        Ok(self
            .get_config_or_default(config_keys::INVOICE_CURRENCY, "USD")?
            .to_uppercase())
    }

    fn get_import_declaration_fee_name(&self) -> RepositoryResult<String> {
        self.get_config_or_default(config_keys::IMPORT_DECLARATION_FEE_NAME, "IMPORT_DECLARATION_FEE")
    }

    fn get_customs_filing_fee_name(&self) -> RepositoryResult<String> {
        self.get_config_or_default(config_keys::CUSTOMS_FILING_FEE_NAME, "CUSTOMS_FILING_FEE")
    }

    fn get_cro_no_prefix(&self) -> RepositoryResult<String> {
        self.get_config_or_default(config_keys::CRO_NO_PREFIX, "CRO")
    }

    fn get_invoice_no_prefix(&self) -> RepositoryResult<String> {
        self.get_config_or_default(config_keys::INVOICE_NO_PREFIX, "INV")
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 发票
    pub const INVOICE_CURRENCY: &str = "invoice_currency";
    pub const INVOICE_NO_PREFIX: &str = "invoice_no_prefix";

    // 申报费用
    pub const IMPORT_DECLARATION_FEE_NAME: &str = "import_declaration_fee_name";
    pub const CUSTOMS_FILING_FEE_NAME: &str = "customs_filing_fee_name";

    // 放箱单
    pub const CRO_NO_PREFIX: &str = "cro_no_prefix";
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> ConfigManager {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::ensure_schema(&conn).unwrap();
        ConfigManager::from_connection(Arc::new(Mutex::new(conn)))
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = setup();
        assert_eq!(config.get_invoice_currency().unwrap(), "USD");
        assert_eq!(
            config.get_customs_filing_fee_name().unwrap(),
            "CUSTOMS_FILING_FEE"
        );
        assert_eq!(config.get_cro_no_prefix().unwrap(), "CRO");
    }

    #[test]
    fn test_override_and_blank_value() {
        let config = setup();
        config
            .set_global_config_value(config_keys::INVOICE_CURRENCY, "sgd")
            .unwrap();
        config
            .set_global_config_value(config_keys::INVOICE_NO_PREFIX, "  ")
            .unwrap();

        assert_eq!(config.get_invoice_currency().unwrap(), "SGD");
        assert_eq!(config.get_invoice_no_prefix().unwrap(), "INV");

        let snapshot: serde_json::Value =
            serde_json::from_str(&config.get_config_snapshot().unwrap()).unwrap();
        assert_eq!(snapshot["invoice_currency"], "sgd");
    }
}
