use super::core::ActionLogRepository;
use crate::domain::action_log::{ActionLog, ActionType};
use crate::repository::error::RepositoryResult;
use crate::repository::row_utils::{get_enum, get_ts};
use rusqlite::{params, OptionalExtension, Result as SqliteResult, Row};

impl ActionLogRepository {
    // ==========================================
    // 查询操作
    // ==========================================

    /// 按 action_id 查询单个日志
    pub fn find_by_id(&self, action_id: &str) -> RepositoryResult<Option<ActionLog>> {
        let conn = self.get_conn()?;

        let log = conn
            .query_row(
                r#"
                SELECT action_id, booking_id, action_type, action_ts, actor,
                       payload_json, detail
                FROM action_log
                WHERE action_id = ?1
                "#,
                params![action_id],
                map_row,
            )
            .optional()?;

        Ok(log)
    }

    /// 查询指定订舱的操作日志（最新在前）
    pub fn find_by_booking(&self, booking_id: &str, limit: i64) -> RepositoryResult<Vec<ActionLog>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT action_id, booking_id, action_type, action_ts, actor,
                   payload_json, detail
            FROM action_log
            WHERE booking_id = ?1
            ORDER BY action_ts DESC, rowid DESC
            LIMIT ?2
            "#,
        )?;

        let logs = stmt
            .query_map(params![booking_id, limit], map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(logs)
    }
}

/// 映射数据库行到 ActionLog
fn map_row(row: &Row) -> SqliteResult<ActionLog> {
    let payload_raw: Option<String> = row.get(5)?;
    Ok(ActionLog {
        action_id: row.get(0)?,
        booking_id: row.get(1)?,
        action_type: get_enum(row, 2, ActionType::parse)?,
        action_ts: get_ts(row, 3)?,
        actor: row.get(4)?,
        // 损坏的 payload 不影响审计行本身
        payload_json: payload_raw.and_then(|s| serde_json::from_str(&s).ok()),
        detail: row.get(6)?,
    })
}
