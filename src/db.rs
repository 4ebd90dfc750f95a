// ==========================================
// 订舱履约核心 - SQLite 连接初始化与建表
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为（外键、busy_timeout）
// - 统一建表入口，所有仓储共享同一套 schema
// ==========================================

use rusqlite::{Connection, OptionalExtension};
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
///
/// 写事务统一使用 BEGIN IMMEDIATE，并发写入方在此时间内排队等待写锁。
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 时间戳存储格式（UTC）
pub const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 幂等建表
///
/// booking / booking_container / shipping_instruction / bank_account / surcharge
/// 属于外部协作方数据，本核心只读；这里建表仅为保证独立部署与测试可用。
pub fn ensure_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        -- ===== 外部协作方（只读） =====
        CREATE TABLE IF NOT EXISTS booking (
            booking_id TEXT PRIMARY KEY,
            booking_no TEXT NOT NULL,
            depot_unlocode TEXT NOT NULL,
            carrier_id TEXT,
            si_cutoff_at TEXT,
            vgm_cutoff_at TEXT,
            customs_cutoff_at TEXT
        );

        CREATE TABLE IF NOT EXISTS booking_container (
            line_id TEXT PRIMARY KEY,
            booking_id TEXT NOT NULL REFERENCES booking(booking_id),
            container_type TEXT NOT NULL,
            quantity INTEGER NOT NULL CHECK(quantity >= 0),
            is_soc INTEGER NOT NULL DEFAULT 0
        );
        CREATE INDEX IF NOT EXISTS idx_booking_container_booking ON booking_container(booking_id);

        CREATE TABLE IF NOT EXISTS shipping_instruction (
            si_id TEXT PRIMARY KEY,
            booking_id TEXT NOT NULL REFERENCES booking(booking_id),
            status TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_si_booking ON shipping_instruction(booking_id);

        CREATE TABLE IF NOT EXISTS bank_account (
            account_id TEXT PRIMARY KEY,
            bank_name TEXT NOT NULL,
            account_no TEXT NOT NULL,
            currency TEXT NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1,
            is_default INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS surcharge (
            surcharge_id TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            amount_minor INTEGER NOT NULL,
            currency TEXT NOT NULL
        );

        -- ===== 箱库存 =====
        CREATE TABLE IF NOT EXISTS container (
            container_id TEXT PRIMARY KEY,
            container_no TEXT NOT NULL UNIQUE,
            container_type TEXT NOT NULL,
            status TEXT NOT NULL CHECK(status IN ('AVAILABLE', 'ALLOCATED', 'IN_USE', 'UNDER_REPAIR')),
            current_depot TEXT NOT NULL,
            last_used_at TEXT,
            updated_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_container_pool
            ON container(container_type, current_depot, status, last_used_at);

        -- ===== 免费期条款 =====
        CREATE TABLE IF NOT EXISTS detention_term (
            term_id TEXT PRIMARY KEY,
            depot_id TEXT,
            carrier_id TEXT,
            free_days INTEGER NOT NULL CHECK(free_days >= 0),
            effective_from TEXT NOT NULL,
            effective_to TEXT,
            created_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_detention_term_depot ON detention_term(depot_id, effective_from);

        -- ===== 放箱单 =====
        CREATE TABLE IF NOT EXISTS container_release_order (
            cro_id TEXT PRIMARY KEY,
            booking_id TEXT NOT NULL UNIQUE REFERENCES booking(booking_id),
            cro_no TEXT NOT NULL UNIQUE,
            released_to_type TEXT NOT NULL,
            released_to_id TEXT NOT NULL,
            depot_unlocode TEXT NOT NULL,
            free_days INTEGER NOT NULL,
            detention_term_id TEXT REFERENCES detention_term(term_id),
            created_by TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS released_container (
            cro_id TEXT NOT NULL REFERENCES container_release_order(cro_id),
            container_id TEXT NOT NULL REFERENCES container(container_id),
            seq_no INTEGER NOT NULL,
            PRIMARY KEY (cro_id, container_id)
        );
        CREATE INDEX IF NOT EXISTS idx_released_container_container ON released_container(container_id);

        CREATE TABLE IF NOT EXISTS cro_document (
            document_id TEXT PRIMARY KEY,
            cro_id TEXT NOT NULL REFERENCES container_release_order(cro_id),
            document_type TEXT NOT NULL,
            file_name TEXT NOT NULL,
            file_ref TEXT NOT NULL,
            seq_no INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_cro_document_cro ON cro_document(cro_id);

        -- ===== 可修订单证 =====
        CREATE TABLE IF NOT EXISTS bl_draft (
            bl_draft_id TEXT PRIMARY KEY,
            booking_id TEXT NOT NULL REFERENCES booking(booking_id),
            draft_no TEXT NOT NULL,
            status TEXT NOT NULL,
            shipper TEXT NOT NULL,
            consignee TEXT NOT NULL,
            notify_party TEXT,
            cargo_description TEXT NOT NULL,
            marks_and_numbers TEXT,
            gross_weight_kg REAL NOT NULL,
            measurement_cbm REAL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS vgm_transmission (
            transmission_id TEXT PRIMARY KEY,
            booking_id TEXT NOT NULL REFERENCES booking(booking_id),
            container_no TEXT NOT NULL,
            verified_gross_mass_kg REAL NOT NULL,
            weighing_method TEXT NOT NULL,
            authorized_person TEXT NOT NULL,
            status TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS customs_declaration (
            declaration_id TEXT PRIMARY KEY,
            booking_id TEXT NOT NULL REFERENCES booking(booking_id),
            si_id TEXT NOT NULL REFERENCES shipping_instruction(si_id),
            declaration_no TEXT NOT NULL,
            hs_code TEXT NOT NULL,
            declared_value_minor INTEGER NOT NULL,
            currency TEXT NOT NULL,
            status TEXT NOT NULL,
            filed_by TEXT NOT NULL,
            filed_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS import_declaration (
            declaration_id TEXT PRIMARY KEY,
            booking_id TEXT NOT NULL REFERENCES booking(booking_id),
            declaration_no TEXT NOT NULL,
            declared_value_minor INTEGER NOT NULL,
            currency TEXT NOT NULL,
            filed_by TEXT NOT NULL,
            filed_at TEXT NOT NULL
        );

        -- ===== 单证版本日志（只追加） =====
        CREATE TABLE IF NOT EXISTS document_version (
            version_id TEXT PRIMARY KEY,
            document_kind TEXT NOT NULL,
            document_id TEXT NOT NULL,
            seq_no INTEGER NOT NULL,
            snapshot_kind TEXT NOT NULL CHECK(snapshot_kind IN ('PRE_EDIT', 'POST_EDIT')),
            snapshot_json TEXT NOT NULL,
            actor TEXT NOT NULL,
            created_at TEXT NOT NULL,
            UNIQUE (document_kind, document_id, seq_no)
        );

        -- ===== 发票 =====
        CREATE TABLE IF NOT EXISTS invoice (
            invoice_id TEXT PRIMARY KEY,
            booking_id TEXT NOT NULL REFERENCES booking(booking_id),
            leg TEXT NOT NULL CHECK(leg IN ('EXPORT', 'IMPORT')),
            invoice_no TEXT NOT NULL UNIQUE,
            currency TEXT NOT NULL,
            bank_account_id TEXT REFERENCES bank_account(account_id),
            total_amount_minor INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE (booking_id, leg)
        );

        CREATE TABLE IF NOT EXISTS invoice_line (
            line_id TEXT PRIMARY KEY,
            invoice_id TEXT NOT NULL REFERENCES invoice(invoice_id),
            charge_code TEXT NOT NULL,
            description TEXT NOT NULL,
            quantity INTEGER NOT NULL,
            unit_amount_minor INTEGER NOT NULL,
            amount_minor INTEGER NOT NULL,
            source_ref TEXT,
            created_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_invoice_line_invoice ON invoice_line(invoice_id);

        -- ===== 操作日志 =====
        CREATE TABLE IF NOT EXISTS action_log (
            action_id TEXT PRIMARY KEY,
            booking_id TEXT,
            action_type TEXT NOT NULL,
            action_ts TEXT NOT NULL,
            actor TEXT NOT NULL,
            payload_json TEXT,
            detail TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_action_log_booking ON action_log(booking_id, action_ts DESC);
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();

        assert_eq!(read_schema_version(&conn).unwrap(), None);

        ensure_schema(&conn).unwrap();
        ensure_schema(&conn).unwrap();

        assert_eq!(
            read_schema_version(&conn).unwrap(),
            Some(CURRENT_SCHEMA_VERSION)
        );
    }
}
