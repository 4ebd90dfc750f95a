// ==========================================
// 订舱履约核心 - 操作日志数据仓储
// ==========================================
// 红线: 所有履约写操作成功后必须记录
// ==========================================

mod core;
mod queries;


pub use self::core::ActionLogRepository;
