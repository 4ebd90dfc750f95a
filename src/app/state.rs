// ==========================================
// 订舱履约核心 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// ==========================================

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::api::{CroApi, DeclarationApi, DocumentApi};
use crate::config::{ConfigManager, FulfillmentConfigReader};
use crate::db::{ensure_schema, open_sqlite_connection, read_schema_version, CURRENT_SCHEMA_VERSION};
use crate::engine::{
    AllocationEngine, DeclarationFilingEngine, DetentionResolver, DocumentAmendmentEngine,
    InvoiceLedger,
};
use crate::repository::{
    ActionLogRepository, DetentionTermRepository, ReferenceLookup, SqlReferenceLookup,
};

/// 应用状态
///
/// 所有 API 共享同一个数据库连接；跨进程的写串行由 BEGIN IMMEDIATE 保证
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 放箱单API
    pub cro_api: Arc<CroApi>,

    /// 单证修订API
    pub document_api: Arc<DocumentApi>,

    /// 申报API
    pub declaration_api: Arc<DeclarationApi>,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,

    /// 操作日志仓储（用于审计追踪）
    pub action_log_repo: Arc<ActionLogRepository>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 说明
    /// 1. 打开数据库并确保表结构
    /// 2. 初始化Repository / Engine
    /// 3. 创建所有API实例
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!(db_path = %db_path, "初始化AppState");

        let mut conn =
            open_sqlite_connection(&db_path).map_err(|e| format!("无法打开数据库: {}", e))?;
        crate::perf::install_sqlite_tracing(&mut conn);

        match read_schema_version(&conn) {
            Ok(Some(v)) if v != CURRENT_SCHEMA_VERSION => {
                tracing::warn!(
                    found = v,
                    expected = CURRENT_SCHEMA_VERSION,
                    "schema_version 不一致，继续按当前版本运行"
                );
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "读取 schema_version 失败"),
        }

        ensure_schema(&conn).map_err(|e| format!("初始化表结构失败: {}", e))?;

        Ok(Self::from_connection(db_path, Arc::new(Mutex::new(conn))))
    }

    /// 基于已初始化的连接装配各层
    pub fn from_connection(db_path: String, conn: Arc<Mutex<Connection>>) -> Self {
        // ==========================================
        // Repository / 配置
        // ==========================================
        let action_log_repo = Arc::new(ActionLogRepository::new(conn.clone()));
        let config_manager = Arc::new(ConfigManager::from_connection(conn.clone()));
        let config: Arc<dyn FulfillmentConfigReader> = config_manager.clone();
        let reference: Arc<dyn ReferenceLookup> = Arc::new(SqlReferenceLookup);

        // ==========================================
        // Engine
        // ==========================================
        let allocation_engine = Arc::new(AllocationEngine::new(conn.clone()));
        let detention_resolver = Arc::new(DetentionResolver::new(Arc::new(
            DetentionTermRepository::new(conn.clone()),
        )));
        let amendment_engine = Arc::new(DocumentAmendmentEngine::new(conn.clone()));
        let ledger = Arc::new(InvoiceLedger::new(conn.clone(), reference.clone()));
        let filing_engine = Arc::new(DeclarationFilingEngine::new(
            conn.clone(),
            ledger.clone(),
            reference,
        ));

        // ==========================================
        // API
        // ==========================================
        let cro_api = Arc::new(CroApi::new(
            allocation_engine,
            detention_resolver,
            config.clone(),
            action_log_repo.clone(),
        ));
        let document_api = Arc::new(DocumentApi::new(amendment_engine, action_log_repo.clone()));
        let declaration_api = Arc::new(DeclarationApi::new(
            filing_engine,
            ledger,
            config,
            action_log_repo.clone(),
        ));

        tracing::info!("AppState初始化完成");

        Self {
            db_path,
            cro_api,
            document_api,
            declaration_api,
            config_manager,
            action_log_repo,
        }
    }
}

/// 获取默认数据库路径
///
/// 优先级: FREIGHT_FULFILLMENT_DB 环境变量 > 用户本地数据目录 > 当前目录
pub fn get_default_db_path() -> String {
    if let Ok(path) = std::env::var("FREIGHT_FULFILLMENT_DB") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    match dirs::data_local_dir() {
        Some(data_dir) => {
            let dir = data_dir.join("freight-fulfillment");
            if let Err(e) = std::fs::create_dir_all(&dir) {
                tracing::warn!(dir = %dir.display(), error = %e, "创建数据目录失败");
            }
            dir.join("fulfillment.db").to_string_lossy().to_string()
        }
        None => "./fulfillment.db".to_string(),
    }
}
