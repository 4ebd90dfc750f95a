// ==========================================
// 订舱履约核心 - 免费期条款数据仓储
// ==========================================
// 条款为不可变历史，只追加；允许时间段重叠，由解析器择一
// ==========================================

use crate::domain::detention::{DetentionQuery, DetentionTerm};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::row_utils::{fmt_ts, get_opt_ts, get_ts};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

pub struct DetentionTermRepository {
    conn: Arc<Mutex<Connection>>,
}

impl DetentionTermRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 查询在 as_of 时点生效、且适用于该堆场的候选条款（含全局条款）
    pub fn find_candidates(&self, query: &DetentionQuery) -> RepositoryResult<Vec<DetentionTerm>> {
        let conn = self.get_conn()?;
        Self::find_candidates_tx(&conn, query)
    }

    pub fn find_candidates_tx(
        conn: &Connection,
        query: &DetentionQuery,
    ) -> RepositoryResult<Vec<DetentionTerm>> {
        let mut stmt = conn.prepare(
            r#"SELECT term_id, depot_id, carrier_id, free_days,
                      effective_from, effective_to, created_at
               FROM detention_term
               WHERE effective_from <= ?2
                 AND (effective_to IS NULL OR effective_to >= ?2)
                 AND (depot_id IS NULL OR depot_id = ?1)
               ORDER BY effective_from DESC, term_id DESC"#,
        )?;
        let terms = stmt
            .query_map(params![query.depot, fmt_ts(query.as_of)], |row| {
                Ok(DetentionTerm {
                    term_id: row.get(0)?,
                    depot_id: row.get(1)?,
                    carrier_id: row.get(2)?,
                    free_days: row.get(3)?,
                    effective_from: get_ts(row, 4)?,
                    effective_to: get_opt_ts(row, 5)?,
                    created_at: get_ts(row, 6)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(terms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn day(d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 4, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn term(id: &str, depot: Option<&str>, from: u32, to: Option<u32>) -> DetentionTerm {
        DetentionTerm {
            term_id: id.to_string(),
            depot_id: depot.map(str::to_string),
            carrier_id: None,
            free_days: 7,
            effective_from: day(from),
            effective_to: to.map(day),
            created_at: day(1),
        }
    }

    fn insert(conn: &Connection, t: &DetentionTerm) {
        conn.execute(
            r#"INSERT INTO detention_term (
                term_id, depot_id, carrier_id, free_days,
                effective_from, effective_to, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"#,
            params![
                t.term_id,
                t.depot_id,
                t.carrier_id,
                t.free_days,
                fmt_ts(t.effective_from),
                t.effective_to.map(fmt_ts),
                fmt_ts(t.created_at),
            ],
        )
        .unwrap();
    }

    #[test]
    fn test_candidates_filter_depot_and_window() {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::ensure_schema(&conn).unwrap();
        insert(&conn, &term("T1", None, 1, None));
        insert(&conn, &term("T2", Some("SGSIN"), 1, Some(10)));
        insert(&conn, &term("T3", Some("CNSHA"), 1, None));
        insert(&conn, &term("T4", Some("SGSIN"), 20, None));
        let repo = DetentionTermRepository::new(Arc::new(Mutex::new(conn)));

        let ids: Vec<String> = repo
            .find_candidates(&DetentionQuery::new("SGSIN", day(10)))
            .unwrap()
            .into_iter()
            .map(|t| t.term_id)
            .collect();

        // effective_to 含当日
        assert_eq!(ids, vec!["T2".to_string(), "T1".to_string()]);
    }
}
