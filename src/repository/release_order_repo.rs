// ==========================================
// 订舱履约核心 - 放箱单(CRO)数据仓储
// ==========================================
// 红线: 每个订舱至多一张放箱单（booking_id UNIQUE）
// 红线: 写方法只在调用方事务内执行（*_tx）
// ==========================================

use crate::domain::release_order::{ContainerReleaseOrder, CroDocument, ReleasedContainer};
use crate::domain::types::ReleasedToType;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::row_utils::{fmt_ts, get_enum, get_ts};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use std::sync::{Arc, Mutex};

pub struct ReleaseOrderRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ReleaseOrderRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 查询
    // ==========================================

    /// 按订舱查询放箱单（含箱明细与附件）
    pub fn find_by_booking(&self, booking_id: &str) -> RepositoryResult<Option<ContainerReleaseOrder>> {
        let conn = self.get_conn()?;
        Self::find_by_booking_tx(&conn, booking_id)
    }

    pub fn find_by_booking_tx(
        conn: &Connection,
        booking_id: &str,
    ) -> RepositoryResult<Option<ContainerReleaseOrder>> {
        let header = conn
            .query_row(
                r#"SELECT cro_id, booking_id, cro_no, released_to_type, released_to_id,
                          depot_unlocode, free_days, detention_term_id,
                          created_by, created_at, updated_at
                   FROM container_release_order WHERE booking_id = ?1"#,
                params![booking_id],
                |row| {
                    Ok(ContainerReleaseOrder {
                        cro_id: row.get(0)?,
                        booking_id: row.get(1)?,
                        cro_no: row.get(2)?,
                        released_to_type: get_enum(row, 3, ReleasedToType::parse)?,
                        released_to_id: row.get(4)?,
                        depot_unlocode: row.get(5)?,
                        free_days: row.get(6)?,
                        detention_term_id: row.get(7)?,
                        containers: Vec::new(),
                        documents: Vec::new(),
                        created_by: row.get(8)?,
                        created_at: get_ts(row, 9)?,
                        updated_at: get_ts(row, 10)?,
                    })
                },
            )
            .optional()?;

        let Some(mut cro) = header else {
            return Ok(None);
        };
        cro.containers = Self::list_containers_tx(conn, &cro.cro_id)?;
        cro.documents = Self::list_documents_tx(conn, &cro.cro_id)?;
        Ok(Some(cro))
    }

    fn list_containers_tx(conn: &Connection, cro_id: &str) -> RepositoryResult<Vec<ReleasedContainer>> {
        let mut stmt = conn.prepare(
            r#"SELECT rc.container_id, c.container_no, c.container_type, rc.seq_no
               FROM released_container rc
               JOIN container c ON c.container_id = rc.container_id
               WHERE rc.cro_id = ?1
               ORDER BY rc.seq_no"#,
        )?;
        let rows = stmt
            .query_map(params![cro_id], |row| {
                Ok(ReleasedContainer {
                    container_id: row.get(0)?,
                    container_no: row.get(1)?,
                    container_type: row.get(2)?,
                    seq_no: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn list_documents_tx(conn: &Connection, cro_id: &str) -> RepositoryResult<Vec<CroDocument>> {
        let mut stmt = conn.prepare(
            r#"SELECT document_id, document_type, file_name, file_ref, seq_no
               FROM cro_document WHERE cro_id = ?1 ORDER BY seq_no"#,
        )?;
        let rows = stmt
            .query_map(params![cro_id], |row| {
                Ok(CroDocument {
                    document_id: row.get(0)?,
                    document_type: row.get(1)?,
                    file_name: row.get(2)?,
                    file_ref: row.get(3)?,
                    seq_no: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    // ==========================================
    // 写入（事务内）
    // ==========================================

    /// 写入放箱单头、箱明细（按 seq_no）与初始附件
    pub fn insert_tx(tx: &Transaction, cro: &ContainerReleaseOrder) -> RepositoryResult<()> {
        tx.execute(
            r#"INSERT INTO container_release_order (
                cro_id, booking_id, cro_no, released_to_type, released_to_id,
                depot_unlocode, free_days, detention_term_id,
                created_by, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"#,
            params![
                cro.cro_id,
                cro.booking_id,
                cro.cro_no,
                cro.released_to_type.as_str(),
                cro.released_to_id,
                cro.depot_unlocode,
                cro.free_days,
                cro.detention_term_id,
                cro.created_by,
                fmt_ts(cro.created_at),
                fmt_ts(cro.updated_at),
            ],
        )?;

        {
            let mut stmt = tx.prepare(
                "INSERT INTO released_container (cro_id, container_id, seq_no) VALUES (?1, ?2, ?3)",
            )?;
            for line in &cro.containers {
                stmt.execute(params![cro.cro_id, line.container_id, line.seq_no])?;
            }
        }

        Self::insert_documents_tx(tx, &cro.cro_id, &cro.documents)
    }

    /// 更新放箱单头（放箱对象/堆场）
    pub fn update_header_tx(
        tx: &Transaction,
        cro_id: &str,
        released_to_type: ReleasedToType,
        released_to_id: &str,
        depot_unlocode: &str,
        updated_at: NaiveDateTime,
    ) -> RepositoryResult<()> {
        let affected = tx.execute(
            r#"UPDATE container_release_order
               SET released_to_type = ?2, released_to_id = ?3, depot_unlocode = ?4, updated_at = ?5
               WHERE cro_id = ?1"#,
            params![
                cro_id,
                released_to_type.as_str(),
                released_to_id,
                depot_unlocode,
                fmt_ts(updated_at)
            ],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "ContainerReleaseOrder".to_string(),
                id: cro_id.to_string(),
            });
        }
        Ok(())
    }

    /// 整体替换附件：先删后插
    pub fn replace_documents_tx(
        tx: &Transaction,
        cro_id: &str,
        documents: &[CroDocument],
    ) -> RepositoryResult<usize> {
        let removed = tx.execute("DELETE FROM cro_document WHERE cro_id = ?1", params![cro_id])?;
        Self::insert_documents_tx(tx, cro_id, documents)?;
        Ok(removed)
    }

    fn insert_documents_tx(
        tx: &Transaction,
        cro_id: &str,
        documents: &[CroDocument],
    ) -> RepositoryResult<()> {
        let mut stmt = tx.prepare(
            r#"INSERT INTO cro_document (document_id, cro_id, document_type, file_name, file_ref, seq_no)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6)"#,
        )?;
        for doc in documents {
            stmt.execute(params![
                doc.document_id,
                cro_id,
                doc.document_type,
                doc.file_name,
                doc.file_ref,
                doc.seq_no
            ])?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 2, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    fn setup() -> (Arc<Mutex<Connection>>, ReleaseOrderRepository) {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        crate::db::ensure_schema(&conn).unwrap();
        conn.execute_batch(
            r#"
            INSERT INTO booking (booking_id, booking_no, depot_unlocode) VALUES ('B1', 'BK-1', 'SGSIN');
            INSERT INTO container VALUES ('C1', 'MSKU0000001', '40HC', 'ALLOCATED', 'SGSIN', NULL, '2026-01-01 00:00:00');
            INSERT INTO container VALUES ('C2', 'MSKU0000002', '40HC', 'ALLOCATED', 'SGSIN', NULL, '2026-01-01 00:00:00');
            "#,
        )
        .unwrap();
        let conn = Arc::new(Mutex::new(conn));
        (conn.clone(), ReleaseOrderRepository::new(conn))
    }

    fn doc(id: &str, seq: i32) -> CroDocument {
        CroDocument {
            document_id: id.to_string(),
            document_type: "DELIVERY_ORDER".to_string(),
            file_name: format!("{}.pdf", id),
            file_ref: format!("s3://docs/{}", id),
            seq_no: seq,
        }
    }

    fn cro() -> ContainerReleaseOrder {
        ContainerReleaseOrder {
            cro_id: "R1".to_string(),
            booking_id: "B1".to_string(),
            cro_no: "CRO-1".to_string(),
            released_to_type: ReleasedToType::Trucker,
            released_to_id: "TRK-9".to_string(),
            depot_unlocode: "SGSIN".to_string(),
            free_days: 5,
            detention_term_id: None,
            containers: vec![
                ReleasedContainer {
                    container_id: "C2".to_string(),
                    container_no: "MSKU0000002".to_string(),
                    container_type: "40HC".to_string(),
                    seq_no: 1,
                },
                ReleasedContainer {
                    container_id: "C1".to_string(),
                    container_no: "MSKU0000001".to_string(),
                    container_type: "40HC".to_string(),
                    seq_no: 2,
                },
            ],
            documents: vec![doc("D1", 1)],
            created_by: "ops".to_string(),
            created_at: now(),
            updated_at: now(),
        }
    }

    #[test]
    fn test_insert_and_read_back_in_seq_order() {
        let (conn, repo) = setup();
        {
            let mut guard = conn.lock().unwrap();
            let tx = guard.transaction().unwrap();
            ReleaseOrderRepository::insert_tx(&tx, &cro()).unwrap();
            tx.commit().unwrap();
        }

        let read = repo.find_by_booking("B1").unwrap().unwrap();
        assert_eq!(read, cro());
        assert_eq!(read.container_ids(), vec!["C2", "C1"]);
    }

    #[test]
    fn test_duplicate_booking_is_unique_violation() {
        let (conn, _repo) = setup();
        let mut guard = conn.lock().unwrap();
        let tx = guard.transaction().unwrap();
        ReleaseOrderRepository::insert_tx(&tx, &cro()).unwrap();

        let mut second = cro();
        second.cro_id = "R2".to_string();
        second.cro_no = "CRO-2".to_string();
        second.containers.clear();
        second.documents.clear();
        let err = ReleaseOrderRepository::insert_tx(&tx, &second).unwrap_err();
        assert!(matches!(err, RepositoryError::UniqueConstraintViolation(_)));
    }

    #[test]
    fn test_replace_documents_removes_previous_set() {
        let (conn, repo) = setup();
        {
            let mut guard = conn.lock().unwrap();
            let tx = guard.transaction().unwrap();
            ReleaseOrderRepository::insert_tx(&tx, &cro()).unwrap();
            let removed =
                ReleaseOrderRepository::replace_documents_tx(&tx, "R1", &[doc("D2", 1), doc("D3", 2)])
                    .unwrap();
            assert_eq!(removed, 1);
            tx.commit().unwrap();
        }

        let read = repo.find_by_booking("B1").unwrap().unwrap();
        let ids: Vec<&str> = read.documents.iter().map(|d| d.document_id.as_str()).collect();
        assert_eq!(ids, vec!["D2", "D3"]);
    }
}
