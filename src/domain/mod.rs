// ==========================================
// 订舱履约核心 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、请求体
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod action_log;
pub mod booking;
pub mod container;
pub mod declaration;
pub mod detention;
pub mod document;
pub mod invoice;
pub mod reference;
pub mod release_order;
pub mod types;

// 重导出核心类型
pub use action_log::{ActionLog, ActionType};
pub use booking::{carrier_demand, Booking, BookingContainerDemand, ShippingInstruction};
pub use container::{AvailabilityQuery, Container};
pub use declaration::{
    CustomsDeclarationRequest, CustomsFilingResult, ImportDeclaration, ImportDeclarationRequest,
    ImportFilingResult,
};
pub use detention::{DetentionQuery, DetentionTerm, ResolvedDetention};
pub use document::{
    AmendableDocument, AmendmentOutcome, BlDraft, BlDraftPatch, CustomsDeclaration, CustomsPatch,
    DocumentVersion, VgmPatch, VgmTransmission,
};
pub use invoice::{Invoice, InvoiceLine, InvoiceWithLines, NewInvoiceLine};
pub use reference::{BankAccount, Surcharge};
pub use release_order::{
    AllocationRequest, ContainerReleaseOrder, CroAmendment, CroDocument, CroDocumentInput,
    ReleasedContainer,
};
pub use types::{
    BlDraftStatus, ContainerStatus, CustomsStatus, DocumentKind, InvoiceLeg, ReleasedToType,
    SnapshotKind, VgmStatus, WeighingMethod,
};
