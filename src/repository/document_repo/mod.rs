// ==========================================
// 订舱履约核心 - 可修订单证数据仓储
// ==========================================
// 提单草稿 / VGM / 出口报关单各自一张表，
// 通过 DocumentStore 统一“按订舱查单证 + 整体写回”两个动作，
// 供单证修订引擎泛型复用
// ==========================================

mod bl_draft;
mod customs;
mod vgm;

use crate::domain::document::{AmendableDocument, BlDraft, CustomsDeclaration, VgmTransmission};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{Connection, Transaction};
use std::sync::{Arc, Mutex};

/// 单证持久化接口（按单证类型实现）
pub trait DocumentStore: AmendableDocument {
    /// 查询属于该订舱的单证；单证存在但不属于该订舱时同样返回 None
    fn find_for_booking_tx(
        conn: &Connection,
        booking_id: &str,
        document_id: &str,
    ) -> RepositoryResult<Option<Self>>;

    /// 整体写回（含状态、updated_at）
    fn update_tx(tx: &Transaction, doc: &Self) -> RepositoryResult<()>;
}

pub struct DocumentRepository {
    conn: Arc<Mutex<Connection>>,
}

impl DocumentRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 按订舱查询任意类型单证
    pub fn find<D: DocumentStore>(
        &self,
        booking_id: &str,
        document_id: &str,
    ) -> RepositoryResult<Option<D>> {
        let conn = self.get_conn()?;
        D::find_for_booking_tx(&conn, booking_id, document_id)
    }

    pub fn insert_bl_draft(&self, draft: &BlDraft) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        bl_draft::insert(&conn, draft)
    }

    pub fn insert_vgm(&self, transmission: &VgmTransmission) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        vgm::insert(&conn, transmission)
    }

    /// 报关单随申报流程写入，和发票在同一事务
    pub fn insert_customs_tx(tx: &Transaction, declaration: &CustomsDeclaration) -> RepositoryResult<()> {
        customs::insert(tx, declaration)
    }
}
