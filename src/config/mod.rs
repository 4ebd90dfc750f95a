// ==========================================
// 订舱履约核心 - 配置层
// ==========================================
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod fulfillment_config_trait;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager};
pub use fulfillment_config_trait::FulfillmentConfigReader;
