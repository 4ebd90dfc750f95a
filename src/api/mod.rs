// ==========================================
// 订舱履约核心 - API 层
// ==========================================
// 职责: 校验请求、调用引擎、记录操作日志
// 红线: 校验失败不开启事务
// ==========================================

pub mod cro_api;
pub mod declaration_api;
pub mod document_api;
pub mod error;
pub mod validator;

// 重导出核心类型
pub use cro_api::CroApi;
pub use declaration_api::DeclarationApi;
pub use document_api::DocumentApi;
pub use error::{ApiError, ApiResult, ErrorKind, ValidationViolation};

use crate::domain::action_log::ActionLog;
use crate::repository::action_log_repo::ActionLogRepository;

/// 路径参数非空校验
pub(crate) fn require_id(field: &str, value: &str) -> ApiResult<()> {
    if value.trim().is_empty() {
        return Err(ApiError::InvalidInput(format!("{}不能为空", field)));
    }
    Ok(())
}

/// 写操作日志；业务事务已提交，日志失败只告警不回传
pub(crate) fn record_action(repo: &ActionLogRepository, log: ActionLog) {
    if let Err(e) = repo.insert(&log) {
        tracing::warn!(
            action_type = log.action_type.as_str(),
            booking_id = ?log.booking_id,
            error = %e,
            "操作日志写入失败"
        );
    }
}
