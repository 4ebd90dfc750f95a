// ==========================================
// 订舱履约核心 - 免费期条款解析
// ==========================================
// 规则:
// 1. 候选: effective_from <= as_of 且 (effective_to 为空 或 >= as_of)
//    且 (depot_id == 堆场 或 depot_id 为空)
// 2. 堆场专属条款优先于全局条款
// 3. 同层内 effective_from 最晚者胜出，再相同取 term_id 较大者
// 4. 无候选 → free_days = 0，无条款引用
// ==========================================

use crate::domain::detention::{DetentionQuery, DetentionTerm, ResolvedDetention};
use crate::repository::detention_repo::DetentionTermRepository;
use crate::repository::error::RepositoryResult;
use chrono::NaiveDateTime;
use rusqlite::Connection;
use std::sync::Arc;

/// 从条款集合中选出唯一生效条款（纯函数）
pub fn select_term(
    terms: &[DetentionTerm],
    depot_unlocode: &str,
    as_of: NaiveDateTime,
) -> ResolvedDetention {
    terms
        .iter()
        .filter(|t| t.is_effective_at(as_of) && t.applies_to_depot(depot_unlocode))
        .max_by(|a, b| {
            a.is_depot_specific()
                .cmp(&b.is_depot_specific())
                .then(a.effective_from.cmp(&b.effective_from))
                .then(a.term_id.cmp(&b.term_id))
        })
        .map(|t| ResolvedDetention {
            free_days: t.free_days,
            term_id: Some(t.term_id.clone()),
        })
        .unwrap_or_else(ResolvedDetention::none)
}

// ==========================================
// DetentionResolver - 免费期解析器（只读）
// ==========================================
pub struct DetentionResolver {
    repo: Arc<DetentionTermRepository>,
}

impl DetentionResolver {
    pub fn new(repo: Arc<DetentionTermRepository>) -> Self {
        Self { repo }
    }

    /// 解析堆场在 as_of 时点的免费期
    pub fn resolve(&self, depot_unlocode: &str, as_of: NaiveDateTime) -> RepositoryResult<ResolvedDetention> {
        let query = DetentionQuery::new(depot_unlocode, as_of);
        let candidates = self.repo.find_candidates(&query)?;
        Ok(select_term(&candidates, depot_unlocode, as_of))
    }

    /// 事务内解析（放箱分配使用，与选箱看到同一快照）
    pub fn resolve_tx(conn: &Connection, query: &DetentionQuery) -> RepositoryResult<ResolvedDetention> {
        let candidates = DetentionTermRepository::find_candidates_tx(conn, query)?;
        Ok(select_term(&candidates, &query.depot, query.as_of))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 6, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn term(id: &str, depot: Option<&str>, free_days: i32, from: u32, to: Option<u32>) -> DetentionTerm {
        DetentionTerm {
            term_id: id.to_string(),
            depot_id: depot.map(str::to_string),
            carrier_id: None,
            free_days,
            effective_from: day(from),
            effective_to: to.map(day),
            created_at: day(1),
        }
    }

    #[test]
    fn test_depot_specific_outranks_newer_global() {
        let terms = vec![
            term("G1", None, 14, 10, None),
            term("D1", Some("SGSIN"), 7, 1, None),
        ];
        let resolved = select_term(&terms, "SGSIN", day(15));
        assert_eq!(resolved.free_days, 7);
        assert_eq!(resolved.term_id.as_deref(), Some("D1"));
    }

    #[test]
    fn test_latest_effective_from_wins_within_tier() {
        let terms = vec![
            term("D1", Some("SGSIN"), 7, 1, None),
            term("D2", Some("SGSIN"), 10, 5, None),
            term("D3", Some("SGSIN"), 21, 20, None),
        ];
        let resolved = select_term(&terms, "SGSIN", day(15));
        assert_eq!(resolved.term_id.as_deref(), Some("D2"));
    }

    #[test]
    fn test_same_effective_from_tie_breaks_on_term_id() {
        let terms = vec![
            term("D-B", Some("SGSIN"), 9, 1, None),
            term("D-A", Some("SGSIN"), 5, 1, None),
        ];
        assert_eq!(select_term(&terms, "SGSIN", day(2)).term_id.as_deref(), Some("D-B"));
    }

    #[test]
    fn test_other_depot_and_expired_terms_are_ignored() {
        let terms = vec![
            term("X1", Some("CNSHA"), 30, 1, None),
            term("D1", Some("SGSIN"), 7, 1, Some(9)),
            term("G1", None, 3, 1, None),
        ];
        let resolved = select_term(&terms, "SGSIN", day(10));
        assert_eq!(resolved.term_id.as_deref(), Some("G1"));

        // effective_to 当日仍有效
        let resolved = select_term(&terms, "SGSIN", day(9));
        assert_eq!(resolved.term_id.as_deref(), Some("D1"));
    }

    #[test]
    fn test_no_candidate_yields_zero_free_days() {
        let terms = vec![term("D1", Some("SGSIN"), 7, 20, None)];
        assert_eq!(select_term(&terms, "SGSIN", day(10)), ResolvedDetention::none());
        assert_eq!(select_term(&[], "SGSIN", day(10)), ResolvedDetention::none());
    }

    #[test]
    fn test_resolver_reads_terms_from_store() {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::ensure_schema(&conn).unwrap();
        conn.execute_batch(
            r#"INSERT INTO detention_term (term_id, depot_id, carrier_id, free_days, effective_from, effective_to, created_at)
               VALUES ('G1', NULL, NULL, 14, '2026-06-10 00:00:00', NULL, '2026-06-01 00:00:00'),
                      ('D1', 'SGSIN', NULL, 7, '2026-06-01 00:00:00', NULL, '2026-06-01 00:00:00');"#,
        )
        .unwrap();
        let resolver = DetentionResolver::new(Arc::new(DetentionTermRepository::new(Arc::new(
            std::sync::Mutex::new(conn),
        ))));

        let sg = resolver.resolve("SGSIN", day(15)).unwrap();
        assert_eq!(sg.term_id.as_deref(), Some("D1"));
        assert_eq!(sg.free_days, 7);

        assert_eq!(resolver.resolve("CNSHA", day(15)).unwrap().term_id.as_deref(), Some("G1"));
        assert_eq!(resolver.resolve("CNSHA", day(5)).unwrap(), ResolvedDetention::none());
    }
}
