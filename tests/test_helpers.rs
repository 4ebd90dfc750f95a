// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 临时数据库初始化 + 外部协作方/库存/单证测试数据
// ==========================================

#![allow(dead_code)]

use chrono::NaiveDateTime;
use freight_fulfillment::db::{ensure_schema, open_sqlite_connection, TS_FORMAT};
use rusqlite::{params, Connection};
use std::error::Error;
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    freight_fulfillment::logging::init_test();
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file
        .path()
        .to_str()
        .ok_or("临时文件路径不是合法 UTF-8")?
        .to_string();

    let conn = open_sqlite_connection(&db_path)?;
    ensure_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 打开一个新连接（已应用统一 PRAGMA）
pub fn open_conn(db_path: &str) -> Connection {
    open_sqlite_connection(db_path).expect("无法打开测试数据库")
}

/// 打开供引擎使用的共享连接
pub fn shared_conn(db_path: &str) -> Arc<Mutex<Connection>> {
    Arc::new(Mutex::new(open_conn(db_path)))
}

pub fn ts(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, TS_FORMAT).expect("时间格式应为 %Y-%m-%d %H:%M:%S")
}

// ==========================================
// 外部协作方数据
// ==========================================

/// 订舱（截止时间均为空）
pub fn seed_booking(conn: &Connection, booking_id: &str, booking_no: &str, depot: &str) {
    conn.execute(
        "INSERT INTO booking (booking_id, booking_no, depot_unlocode) VALUES (?1, ?2, ?3)",
        params![booking_id, booking_no, depot],
    )
    .expect("插入订舱失败");
}

/// 设置订舱截止时间（截单 / VGM / 截关）
pub fn set_cutoffs(
    conn: &Connection,
    booking_id: &str,
    si_cutoff: Option<&str>,
    vgm_cutoff: Option<&str>,
    customs_cutoff: Option<&str>,
) {
    conn.execute(
        "UPDATE booking SET si_cutoff_at = ?2, vgm_cutoff_at = ?3, customs_cutoff_at = ?4
         WHERE booking_id = ?1",
        params![booking_id, si_cutoff, vgm_cutoff, customs_cutoff],
    )
    .expect("设置截止时间失败");
}

pub fn seed_demand(conn: &Connection, booking_id: &str, container_type: &str, quantity: i64, is_soc: bool) {
    conn.execute(
        "INSERT INTO booking_container (line_id, booking_id, container_type, quantity, is_soc)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            uuid::Uuid::new_v4().to_string(),
            booking_id,
            container_type,
            quantity,
            is_soc as i32
        ],
    )
    .expect("插入箱需求失败");
}

pub fn seed_si(conn: &Connection, si_id: &str, booking_id: &str) {
    conn.execute(
        "INSERT INTO shipping_instruction (si_id, booking_id, status) VALUES (?1, ?2, 'SUBMITTED')",
        params![si_id, booking_id],
    )
    .expect("插入托运单失败");
}

pub fn seed_bank_account(conn: &Connection, account_id: &str, is_active: bool, is_default: bool) {
    conn.execute(
        "INSERT INTO bank_account (account_id, bank_name, account_no, currency, is_active, is_default)
         VALUES (?1, 'DBS', ?2, 'USD', ?3, ?4)",
        params![
            account_id,
            format!("ACC-{}", account_id),
            is_active as i32,
            is_default as i32
        ],
    )
    .expect("插入银行账户失败");
}

pub fn seed_surcharge(conn: &Connection, name: &str, amount_minor: i64) {
    seed_surcharge_in(conn, name, amount_minor, "USD");
}

pub fn seed_surcharge_in(conn: &Connection, name: &str, amount_minor: i64, currency: &str) {
    conn.execute(
        "INSERT INTO surcharge (surcharge_id, name, amount_minor, currency) VALUES (?1, ?2, ?3, ?4)",
        params![uuid::Uuid::new_v4().to_string(), name, amount_minor, currency],
    )
    .expect("插入附加费失败");
}

// ==========================================
// 箱库存 / 免费期条款
// ==========================================

pub fn seed_container(
    conn: &Connection,
    container_id: &str,
    container_type: &str,
    depot: &str,
    status: &str,
    last_used_at: Option<&str>,
) {
    conn.execute(
        "INSERT INTO container (container_id, container_no, container_type, status, current_depot, last_used_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, '2026-01-01 00:00:00')",
        params![
            container_id,
            format!("TEST{}", container_id),
            container_type,
            status,
            depot,
            last_used_at
        ],
    )
    .expect("插入箱失败");
}

pub fn seed_detention_term(
    conn: &Connection,
    term_id: &str,
    depot: Option<&str>,
    free_days: i32,
    effective_from: &str,
    effective_to: Option<&str>,
) {
    conn.execute(
        "INSERT INTO detention_term (term_id, depot_id, carrier_id, free_days, effective_from, effective_to, created_at)
         VALUES (?1, ?2, NULL, ?3, ?4, ?5, '2026-01-01 00:00:00')",
        params![term_id, depot, free_days, effective_from, effective_to],
    )
    .expect("插入免费期条款失败");
}

// ==========================================
// 可修订单证
// ==========================================

pub fn seed_bl_draft(conn: &Connection, bl_draft_id: &str, booking_id: &str, status: &str) {
    conn.execute(
        "INSERT INTO bl_draft (bl_draft_id, booking_id, draft_no, status, shipper, consignee,
                               notify_party, cargo_description, marks_and_numbers,
                               gross_weight_kg, measurement_cbm, updated_at)
         VALUES (?1, ?2, ?3, ?4, 'ACME EXPORT', 'GLOBEX IMPORT', NULL, 'MACHINE PARTS', 'N/M',
                 12000.0, 30.5, '2026-01-01 00:00:00')",
        params![bl_draft_id, booking_id, format!("BLD-{}", bl_draft_id), status],
    )
    .expect("插入提单草稿失败");
}

pub fn seed_vgm(conn: &Connection, transmission_id: &str, booking_id: &str, status: &str) {
    conn.execute(
        "INSERT INTO vgm_transmission (transmission_id, booking_id, container_no, verified_gross_mass_kg,
                                       weighing_method, authorized_person, status, updated_at)
         VALUES (?1, ?2, 'MSKU1234567', 18500.0, 'METHOD1', 'J. TAN', ?3, '2026-01-01 00:00:00')",
        params![transmission_id, booking_id, status],
    )
    .expect("插入 VGM 失败");
}

pub fn seed_customs(conn: &Connection, declaration_id: &str, booking_id: &str, si_id: &str, status: &str) {
    conn.execute(
        "INSERT INTO customs_declaration (declaration_id, booking_id, si_id, declaration_no, hs_code,
                                          declared_value_minor, currency, status, filed_by, filed_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, '8471.30', 5000000, 'USD', ?5, 'broker', '2026-01-01 00:00:00',
                 '2026-01-01 00:00:00')",
        params![declaration_id, booking_id, si_id, format!("CD-{}", declaration_id), status],
    )
    .expect("插入报关单失败");
}

// ==========================================
// 断言辅助
// ==========================================

pub fn container_status(conn: &Connection, container_id: &str) -> String {
    conn.query_row(
        "SELECT status FROM container WHERE container_id = ?1",
        params![container_id],
        |row| row.get(0),
    )
    .expect("查询箱状态失败")
}

pub fn count_rows(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))
        .expect("计数失败")
}
