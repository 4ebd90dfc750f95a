// ==========================================
// 订舱履约核心 - 核心库
// ==========================================
// 范围: 放箱分配 / 滞箱条款 / 单证冻结与修订 / 申报计费
// 技术栈: Rust + SQLite
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA/建表）
pub mod db;

// 日志系统
pub mod logging;

// 性能统计（SQL 计数/慢查询）
pub mod perf;

// API 层 - 业务接口
pub mod api;

// 应用层 - 装配与路由
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域实体
pub use domain::{
    ActionLog, ActionType, Booking, Container, ContainerReleaseOrder, DetentionTerm, Invoice,
    InvoiceLine,
};

// 引擎
pub use engine::{
    AllocationEngine, DeclarationFilingEngine, DocumentAmendmentEngine, FreezePolicy,
    InvoiceLedger,
};

// API
pub use api::{ApiError, CroApi, DeclarationApi, DocumentApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "订舱履约核心";
