// ==========================================
// 订舱履约核心 - 引擎层错误类型
// ==========================================
// 职责: 业务结果类错误（库存不足 / 已有放箱单 / 单证冻结 / 币种不一致 / 不存在 / 输入非法），
//       技术错误透传 RepositoryError
// ==========================================

use crate::engine::freeze_guard::FreezeDenial;
use crate::repository::error::RepositoryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("可用箱不足: 箱型={container_type}, 堆场={depot}, 需求={requested}, 可用={available}")]
    InventoryShortfall {
        container_type: String,
        depot: String,
        requested: u32,
        available: u32,
    },

    #[error("订舱已存在放箱单: booking_id={booking_id}, cro_no={cro_no}")]
    ReleaseOrderExists { booking_id: String, cro_no: String },

    #[error("单证已冻结: {0}")]
    DocumentFrozen(FreezeDenial),

    #[error("费用币种与发票币种不一致: 费用={fee_name}({fee_currency}), 发票={invoice_no}({invoice_currency})")]
    CurrencyMismatch {
        fee_name: String,
        fee_currency: String,
        invoice_no: String,
        invoice_currency: String,
    },

    #[error("{entity}不存在: {id}")]
    NotFound { entity: String, id: String },

    #[error("无效输入: {0}")]
    Validation(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl EngineError {
    pub(crate) fn not_found(entity: &str, id: &str) -> Self {
        EngineError::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }
}

impl From<rusqlite::Error> for EngineError {
    fn from(err: rusqlite::Error) -> Self {
        EngineError::Repository(RepositoryError::from(err))
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::Repository(RepositoryError::SnapshotSerialization(err))
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
