// ==========================================
// 订舱履约核心 - 应用层
// ==========================================
// 职责: 装配各层并提供与传输无关的路由入口
// ==========================================

pub mod routes;
pub mod state;

// 重导出
pub use routes::{handle, handle_request, HttpRequest, HttpResponse};
pub use state::{get_default_db_path, AppState};
