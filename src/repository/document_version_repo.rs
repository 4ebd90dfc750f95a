// ==========================================
// 订舱履约核心 - 单证版本日志仓储
// ==========================================
// 红线: 只追加，不更新、不删除
// 红线: (document_kind, document_id, seq_no) 唯一，seq_no 从 1 连续递增
// ==========================================

use crate::domain::document::DocumentVersion;
use crate::domain::types::{DocumentKind, SnapshotKind};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::row_utils::{fmt_ts, get_enum, get_ts};
use rusqlite::{params, Connection, Transaction};
use std::sync::{Arc, Mutex};

pub struct DocumentVersionRepository {
    conn: Arc<Mutex<Connection>>,
}

impl DocumentVersionRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 下一个可用序号
    pub fn next_seq_tx(conn: &Connection, kind: DocumentKind, document_id: &str) -> RepositoryResult<i64> {
        let max: Option<i64> = conn.query_row(
            "SELECT MAX(seq_no) FROM document_version WHERE document_kind = ?1 AND document_id = ?2",
            params![kind.as_str(), document_id],
            |row| row.get(0),
        )?;
        Ok(max.unwrap_or(0) + 1)
    }

    /// 追加一条版本记录
    pub fn append_tx(tx: &Transaction, version: &DocumentVersion) -> RepositoryResult<()> {
        let snapshot_json = serde_json::to_string(&version.snapshot)?;
        tx.execute(
            r#"INSERT INTO document_version (
                version_id, document_kind, document_id, seq_no,
                snapshot_kind, snapshot_json, actor, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"#,
            params![
                version.version_id,
                version.document_kind.as_str(),
                version.document_id,
                version.seq_no,
                version.snapshot_kind.as_str(),
                snapshot_json,
                version.actor,
                fmt_ts(version.created_at),
            ],
        )?;
        Ok(())
    }

    /// 单证的完整版本历史（seq_no 升序）
    pub fn list_by_document(
        &self,
        kind: DocumentKind,
        document_id: &str,
    ) -> RepositoryResult<Vec<DocumentVersion>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"SELECT version_id, document_kind, document_id, seq_no,
                      snapshot_kind, snapshot_json, actor, created_at
               FROM document_version
               WHERE document_kind = ?1 AND document_id = ?2
               ORDER BY seq_no"#,
        )?;

        let rows = stmt
            .query_map(params![kind.as_str(), document_id], |row| {
                let raw: String = row.get(5)?;
                Ok((
                    DocumentVersion {
                        version_id: row.get(0)?,
                        document_kind: get_enum(row, 1, DocumentKind::parse)?,
                        document_id: row.get(2)?,
                        seq_no: row.get(3)?,
                        snapshot_kind: get_enum(row, 4, SnapshotKind::parse)?,
                        snapshot: serde_json::Value::Null,
                        actor: row.get(6)?,
                        created_at: get_ts(row, 7)?,
                    },
                    raw,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(mut version, raw)| -> RepositoryResult<DocumentVersion> {
                version.snapshot = serde_json::from_str(&raw)?;
                Ok(version)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 3)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
    }

    fn version(seq: i64, kind: SnapshotKind) -> DocumentVersion {
        DocumentVersion {
            version_id: format!("V{}", seq),
            document_kind: DocumentKind::BlDraft,
            document_id: "D1".to_string(),
            seq_no: seq,
            snapshot_kind: kind,
            snapshot: serde_json::json!({ "seq": seq }),
            actor: "ops".to_string(),
            created_at: ts(),
        }
    }

    #[test]
    fn test_append_and_list_in_seq_order() {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::ensure_schema(&conn).unwrap();
        let shared = Arc::new(Mutex::new(conn));
        let repo = DocumentVersionRepository::new(shared.clone());

        {
            let mut guard = shared.lock().unwrap();
            let tx = guard.transaction().unwrap();
            assert_eq!(
                DocumentVersionRepository::next_seq_tx(&tx, DocumentKind::BlDraft, "D1").unwrap(),
                1
            );
            DocumentVersionRepository::append_tx(&tx, &version(2, SnapshotKind::PostEdit)).unwrap();
            DocumentVersionRepository::append_tx(&tx, &version(1, SnapshotKind::PreEdit)).unwrap();
            assert_eq!(
                DocumentVersionRepository::next_seq_tx(&tx, DocumentKind::BlDraft, "D1").unwrap(),
                3
            );
            tx.commit().unwrap();
        }

        let history = repo.list_by_document(DocumentKind::BlDraft, "D1").unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].snapshot_kind, SnapshotKind::PreEdit);
        assert_eq!(history[1].snapshot["seq"], 2);
        assert!(repo
            .list_by_document(DocumentKind::VgmTransmission, "D1")
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_duplicate_seq_is_rejected() {
        let mut conn = Connection::open_in_memory().unwrap();
        crate::db::ensure_schema(&conn).unwrap();
        let tx = conn.transaction().unwrap();
        DocumentVersionRepository::append_tx(&tx, &version(1, SnapshotKind::PreEdit)).unwrap();

        let mut dup = version(1, SnapshotKind::PostEdit);
        dup.version_id = "V-dup".to_string();
        let err = DocumentVersionRepository::append_tx(&tx, &dup).unwrap_err();
        assert!(matches!(err, RepositoryError::UniqueConstraintViolation(_)));
    }
}
