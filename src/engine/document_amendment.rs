// ==========================================
// 订舱履约核心 - 单证修订引擎
// ==========================================
// 流程（单个 BEGIN IMMEDIATE 事务）:
// 载入订舱与单证 → 冻结守卫 → 修改前快照 → 应用补丁 →
// 复位校验状态 → 写回 → 修改后快照 → 追加两条连续版本 → 提交
// 红线: 守卫判定与写入同事务；被拒绝时零写入
// ==========================================

use crate::domain::document::{AmendmentOutcome, DocumentVersion};
use crate::domain::types::{DocumentKind, SnapshotKind};
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::freeze_guard::{FreezeDecision, FreezePolicy};
use crate::repository::booking_repo::BookingRepository;
use crate::repository::document_repo::DocumentStore;
use crate::repository::document_version_repo::DocumentVersionRepository;
use crate::repository::error::RepositoryError;
use chrono::NaiveDateTime;
use rusqlite::{Connection, TransactionBehavior};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

pub struct DocumentAmendmentEngine {
    conn: Arc<Mutex<Connection>>,
    version_repo: DocumentVersionRepository,
}

impl DocumentAmendmentEngine {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        let version_repo = DocumentVersionRepository::new(conn.clone());
        Self { conn, version_repo }
    }

    fn get_conn(&self) -> EngineResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| EngineError::Repository(RepositoryError::LockError(e.to_string())))
    }

    /// 修订单证（泛型于单证类型）
    ///
    /// # 错误
    /// - NotFound: 订舱或单证不存在（单证不属于该订舱同样视为不存在）
    /// - DocumentFrozen: 终态或已过截止时间
    pub fn amend<D: DocumentStore>(
        &self,
        booking_id: &str,
        document_id: &str,
        patch: &D::Patch,
        actor: &str,
        now: NaiveDateTime,
    ) -> EngineResult<AmendmentOutcome<D>> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let booking = BookingRepository::find_by_id_tx(&tx, booking_id)?
            .ok_or_else(|| EngineError::not_found("Booking", booking_id))?;
        let current = D::find_for_booking_tx(&tx, booking_id, document_id)?
            .ok_or_else(|| EngineError::not_found(D::KIND.as_str(), document_id))?;

        let policy = FreezePolicy::for_kind(D::KIND);
        if let FreezeDecision::Denied(denial) = policy.check(current.status_code(), &booking, now) {
            warn!(
                booking_id,
                document_id,
                kind = %D::KIND,
                reason = denial.code(),
                "单证已冻结，拒绝修改"
            );
            return Err(EngineError::DocumentFrozen(denial));
        }

        let pre_snapshot = serde_json::to_value(&current)?;

        let mut updated = current;
        updated.apply_patch(patch);
        updated.reset_validation_status();
        updated.touch(now);
        D::update_tx(&tx, &updated)?;

        let post_snapshot = serde_json::to_value(&updated)?;

        let pre_seq = DocumentVersionRepository::next_seq_tx(&tx, D::KIND, document_id)?;
        let post_seq = pre_seq + 1;
        for (seq_no, snapshot_kind, snapshot) in [
            (pre_seq, SnapshotKind::PreEdit, pre_snapshot),
            (post_seq, SnapshotKind::PostEdit, post_snapshot),
        ] {
            DocumentVersionRepository::append_tx(
                &tx,
                &DocumentVersion {
                    version_id: uuid::Uuid::new_v4().to_string(),
                    document_kind: D::KIND,
                    document_id: document_id.to_string(),
                    seq_no,
                    snapshot_kind,
                    snapshot,
                    actor: actor.to_string(),
                    created_at: now,
                },
            )?;
        }

        tx.commit()?;

        info!(
            booking_id,
            document_id,
            kind = %D::KIND,
            pre_seq,
            post_seq,
            status = updated.status_code(),
            "单证修订完成"
        );

        Ok(AmendmentOutcome {
            document: updated,
            pre_version_seq: pre_seq,
            post_version_seq: post_seq,
        })
    }

    /// 单证版本历史（seq_no 升序）
    pub fn history(&self, kind: DocumentKind, document_id: &str) -> EngineResult<Vec<DocumentVersion>> {
        Ok(self.version_repo.list_by_document(kind, document_id)?)
    }
}
