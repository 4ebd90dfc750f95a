// ==========================================
// 订舱履约核心 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// 约定: 带 _tx 后缀的关联函数在调用方事务内执行
// ==========================================

pub mod action_log_repo;
pub mod booking_repo;
pub mod container_repo;
pub mod detention_repo;
pub mod document_repo;
pub mod document_version_repo;
pub mod error;
pub mod import_declaration_repo;
pub mod invoice_repo;
pub mod reference_repo;
pub mod release_order_repo;
pub mod row_utils;

// 重导出核心仓储
pub use action_log_repo::ActionLogRepository;
pub use booking_repo::BookingRepository;
pub use container_repo::{ContainerRepository, ReservationOutcome};
pub use detention_repo::DetentionTermRepository;
pub use document_repo::{DocumentRepository, DocumentStore};
pub use document_version_repo::DocumentVersionRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use import_declaration_repo::ImportDeclarationRepository;
pub use invoice_repo::InvoiceRepository;
pub use reference_repo::{ReferenceLookup, SqlReferenceLookup};
pub use release_order_repo::ReleaseOrderRepository;
