// ==========================================
// 订舱履约核心 - 发票数据仓储
// ==========================================
// 红线: 每个 (booking_id, leg) 至多一张发票
// 红线: total_amount_minor 只由 recompute_total_tx 从明细汇总写入
// ==========================================

use crate::domain::invoice::{Invoice, InvoiceLine};
use crate::domain::types::InvoiceLeg;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::row_utils::{fmt_ts, get_enum, get_ts};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};

const INVOICE_COLUMNS: &str = r#"invoice_id, booking_id, leg, invoice_no, currency,
       bank_account_id, total_amount_minor, created_at, updated_at"#;

pub struct InvoiceRepository;

impl InvoiceRepository {
    // ==========================================
    // 查询
    // ==========================================

    pub fn find_by_id_tx(conn: &Connection, invoice_id: &str) -> RepositoryResult<Option<Invoice>> {
        let sql = format!("SELECT {} FROM invoice WHERE invoice_id = ?1", INVOICE_COLUMNS);
        let invoice = conn
            .query_row(&sql, params![invoice_id], map_invoice_row)
            .optional()?;
        Ok(invoice)
    }

    pub fn find_by_booking_leg_tx(
        conn: &Connection,
        booking_id: &str,
        leg: InvoiceLeg,
    ) -> RepositoryResult<Option<Invoice>> {
        let sql = format!(
            "SELECT {} FROM invoice WHERE booking_id = ?1 AND leg = ?2",
            INVOICE_COLUMNS
        );
        let invoice = conn
            .query_row(&sql, params![booking_id, leg.as_str()], map_invoice_row)
            .optional()?;
        Ok(invoice)
    }

    /// 发票明细（按写入顺序）
    pub fn list_lines_tx(conn: &Connection, invoice_id: &str) -> RepositoryResult<Vec<InvoiceLine>> {
        let mut stmt = conn.prepare(
            r#"SELECT line_id, invoice_id, charge_code, description, quantity,
                      unit_amount_minor, amount_minor, source_ref, created_at
               FROM invoice_line WHERE invoice_id = ?1
               ORDER BY created_at, rowid"#,
        )?;
        let lines = stmt
            .query_map(params![invoice_id], |row| {
                Ok(InvoiceLine {
                    line_id: row.get(0)?,
                    invoice_id: row.get(1)?,
                    charge_code: row.get(2)?,
                    description: row.get(3)?,
                    quantity: row.get(4)?,
                    unit_amount_minor: row.get(5)?,
                    amount_minor: row.get(6)?,
                    source_ref: row.get(7)?,
                    created_at: get_ts(row, 8)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(lines)
    }

    // ==========================================
    // 写入（事务内）
    // ==========================================

    pub fn insert_tx(tx: &Transaction, invoice: &Invoice) -> RepositoryResult<()> {
        tx.execute(
            r#"INSERT INTO invoice (
                invoice_id, booking_id, leg, invoice_no, currency,
                bank_account_id, total_amount_minor, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"#,
            params![
                invoice.invoice_id,
                invoice.booking_id,
                invoice.leg.as_str(),
                invoice.invoice_no,
                invoice.currency,
                invoice.bank_account_id,
                invoice.total_amount_minor,
                fmt_ts(invoice.created_at),
                fmt_ts(invoice.updated_at),
            ],
        )?;
        Ok(())
    }

    pub fn insert_line_tx(tx: &Transaction, line: &InvoiceLine) -> RepositoryResult<()> {
        tx.execute(
            r#"INSERT INTO invoice_line (
                line_id, invoice_id, charge_code, description, quantity,
                unit_amount_minor, amount_minor, source_ref, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"#,
            params![
                line.line_id,
                line.invoice_id,
                line.charge_code,
                line.description,
                line.quantity,
                line.unit_amount_minor,
                line.amount_minor,
                line.source_ref,
                fmt_ts(line.created_at),
            ],
        )?;
        Ok(())
    }

    /// 从明细全量汇总并写回总额，返回新总额
    pub fn recompute_total_tx(
        tx: &Transaction,
        invoice_id: &str,
        now: NaiveDateTime,
    ) -> RepositoryResult<i64> {
        let affected = tx.execute(
            r#"UPDATE invoice SET
                total_amount_minor = (
                    SELECT COALESCE(SUM(amount_minor), 0) FROM invoice_line WHERE invoice_id = ?1
                ),
                updated_at = ?2
               WHERE invoice_id = ?1"#,
            params![invoice_id, fmt_ts(now)],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Invoice".to_string(),
                id: invoice_id.to_string(),
            });
        }

        let total: i64 = tx.query_row(
            "SELECT total_amount_minor FROM invoice WHERE invoice_id = ?1",
            params![invoice_id],
            |row| row.get(0),
        )?;
        Ok(total)
    }
}

fn map_invoice_row(row: &Row) -> rusqlite::Result<Invoice> {
    Ok(Invoice {
        invoice_id: row.get(0)?,
        booking_id: row.get(1)?,
        leg: get_enum(row, 2, InvoiceLeg::parse)?,
        invoice_no: row.get(3)?,
        currency: row.get(4)?,
        bank_account_id: row.get(5)?,
        total_amount_minor: row.get(6)?,
        created_at: get_ts(row, 7)?,
        updated_at: get_ts(row, 8)?,
    })
}
