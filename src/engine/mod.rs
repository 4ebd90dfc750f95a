// ==========================================
// 订舱履约核心 - 引擎层
// ==========================================
// 职责: 实现业务规则引擎,不拼 SQL
// 红线: 所有写操作一个 BEGIN IMMEDIATE 事务，失败整体回滚
// ==========================================

pub mod allocation;
pub mod declaration_filing;
pub mod detention;
pub mod document_amendment;
pub mod error;
pub mod freeze_guard;
pub mod invoice_ledger;

// 重导出核心引擎
pub use allocation::AllocationEngine;
pub use declaration_filing::{DeclarationFilingEngine, FilingSettings};
pub use detention::{select_term, DetentionResolver};
pub use document_amendment::DocumentAmendmentEngine;
pub use error::{EngineError, EngineResult};
pub use freeze_guard::{FreezeDecision, FreezeDenial, FreezePolicy};
pub use invoice_ledger::{InvoiceDefaults, InvoiceLedger};
