// ==========================================
// 订舱履约核心 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，转换引擎/仓储错误为调用方可理解的错误
// 分类: Validation 422 / NotFound 404 / Conflict 409 / Forbidden 403 / Internal 500
// ==========================================

use crate::engine::error::EngineError;
use crate::engine::freeze_guard::FreezeDenial;
use crate::repository::error::RepositoryError;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

/// 错误分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Forbidden,
    Internal,
}

impl ErrorKind {
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorKind::Validation => 422,
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::Forbidden => 403,
            ErrorKind::Internal => 500,
        }
    }
}

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 输入校验错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    /// 请求体字段校验失败（带字段级明细）
    #[error("请求校验失败: {reason}")]
    ValidationFailed {
        reason: String,
        violations: Vec<ValidationViolation>,
    },

    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("可用箱不足: 箱型={container_type}, 堆场={depot}, 需求={requested}, 可用={available}")]
    InventoryShortfall {
        container_type: String,
        depot: String,
        requested: u32,
        available: u32,
    },

    #[error("放箱单已存在: {0}")]
    ReleaseOrderExists(String),

    #[error("单证已冻结: {0}")]
    DocumentFrozen(FreezeDenial),

    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

    // ==========================================
    // 并发控制错误
    // ==========================================
    #[error("并发修改冲突: {0}")]
    ConcurrentModification(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::InvalidInput(_) | ApiError::ValidationFailed { .. } => ErrorKind::Validation,
            ApiError::NotFound(_) => ErrorKind::NotFound,
            ApiError::InventoryShortfall { .. }
            | ApiError::ReleaseOrderExists(_)
            | ApiError::BusinessRuleViolation(_)
            | ApiError::ConcurrentModification(_) => ErrorKind::Conflict,
            ApiError::DocumentFrozen(_) => ErrorKind::Forbidden,
            ApiError::DatabaseError(_) | ApiError::InternalError(_) | ApiError::Other(_) => {
                ErrorKind::Internal
            }
        }
    }

    pub fn status_code(&self) -> u16 {
        self.kind().status_code()
    }

    /// 机器可读错误码
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidInput(_) => "INVALID_INPUT",
            ApiError::ValidationFailed { .. } => "VALIDATION_FAILED",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::InventoryShortfall { .. } => "INVENTORY_SHORTFALL",
            ApiError::ReleaseOrderExists(_) => "RELEASE_ORDER_EXISTS",
            ApiError::DocumentFrozen(denial) => denial.code(),
            ApiError::BusinessRuleViolation(_) => "BUSINESS_RULE_VIOLATION",
            ApiError::ConcurrentModification(_) => "CONCURRENT_MODIFICATION",
            ApiError::DatabaseError(_) | ApiError::InternalError(_) | ApiError::Other(_) => {
                "INTERNAL_ERROR"
            }
        }
    }

    /// 附加明细（字段违规 / 库存缺口 / 冻结原因）
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            ApiError::ValidationFailed { violations, .. } => Some(json!(violations)),
            ApiError::InventoryShortfall {
                container_type,
                depot,
                requested,
                available,
            } => Some(json!({
                "container_type": container_type,
                "depot": depot,
                "requested": requested,
                "available": available,
            })),
            ApiError::DocumentFrozen(denial) => serde_json::to_value(denial).ok(),
            _ => None,
        }
    }

    /// 返回给调用方的消息；内部错误不外泄细节
    pub fn public_message(&self) -> String {
        match self.kind() {
            ErrorKind::Internal => "内部错误，请联系管理员".to_string(),
            _ => self.to_string(),
        }
    }
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            // 并发控制错误
            RepositoryError::CompareAndSwapFailed {
                entity,
                id,
                expected,
            } => ApiError::ConcurrentModification(format!(
                "{}(id={})已被其他操作修改（期望状态={}）",
                entity, id, expected
            )),
            RepositoryError::DatabaseTransactionError(msg) => ApiError::ConcurrentModification(msg),

            // 数据库错误
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("外键约束违反: {}", msg))
            }
            RepositoryError::DatabaseConnectionError(msg)
            | RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseError(format!("数据库锁获取失败: {}", msg))
            }

            // 数据质量错误
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InternalError(format!("字段{}数据异常: {}", field, message))
            }
            RepositoryError::SnapshotSerialization(e) => {
                ApiError::InternalError(format!("快照序列化失败: {}", e))
            }

            // 通用错误
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// 从 EngineError 转换
// ==========================================
impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::InventoryShortfall {
                container_type,
                depot,
                requested,
                available,
            } => ApiError::InventoryShortfall {
                container_type,
                depot,
                requested,
                available,
            },
            EngineError::ReleaseOrderExists { booking_id, cro_no } => ApiError::ReleaseOrderExists(
                format!("订舱{}已有放箱单{}", booking_id, cro_no),
            ),
            EngineError::DocumentFrozen(denial) => ApiError::DocumentFrozen(denial),
            EngineError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            EngineError::Validation(msg) => ApiError::InvalidInput(msg),
            e @ EngineError::CurrencyMismatch { .. } => ApiError::BusinessRuleViolation(e.to_string()),
            EngineError::Repository(e) => ApiError::from(e),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

// ==========================================
// 校验违规详情
// ==========================================

/// 字段级校验违规
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationViolation {
    /// 字段路径（如 documents[0].file_ref）
    pub field: String,
    /// 违规原因
    pub reason: String,
}

impl ValidationViolation {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
