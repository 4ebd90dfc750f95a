use super::DocumentStore;
use crate::domain::document::CustomsDeclaration;
use crate::domain::types::CustomsStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::row_utils::{fmt_ts, get_enum, get_ts};
use rusqlite::{params, Connection, OptionalExtension, Transaction};

pub(super) fn insert(conn: &Connection, c: &CustomsDeclaration) -> RepositoryResult<()> {
    conn.execute(
        r#"INSERT INTO customs_declaration (
            declaration_id, booking_id, si_id, declaration_no, hs_code,
            declared_value_minor, currency, status, filed_by, filed_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"#,
        params![
            c.declaration_id,
            c.booking_id,
            c.si_id,
            c.declaration_no,
            c.hs_code,
            c.declared_value_minor,
            c.currency,
            c.status.as_str(),
            c.filed_by,
            fmt_ts(c.filed_at),
            fmt_ts(c.updated_at),
        ],
    )?;
    Ok(())
}

impl DocumentStore for CustomsDeclaration {
    fn find_for_booking_tx(
        conn: &Connection,
        booking_id: &str,
        document_id: &str,
    ) -> RepositoryResult<Option<Self>> {
        let declaration = conn
            .query_row(
                r#"SELECT declaration_id, booking_id, si_id, declaration_no, hs_code,
                          declared_value_minor, currency, status, filed_by, filed_at, updated_at
                   FROM customs_declaration WHERE declaration_id = ?1 AND booking_id = ?2"#,
                params![document_id, booking_id],
                |row| {
                    Ok(CustomsDeclaration {
                        declaration_id: row.get(0)?,
                        booking_id: row.get(1)?,
                        si_id: row.get(2)?,
                        declaration_no: row.get(3)?,
                        hs_code: row.get(4)?,
                        declared_value_minor: row.get(5)?,
                        currency: row.get(6)?,
                        status: get_enum(row, 7, CustomsStatus::parse)?,
                        filed_by: row.get(8)?,
                        filed_at: get_ts(row, 9)?,
                        updated_at: get_ts(row, 10)?,
                    })
                },
            )
            .optional()?;
        Ok(declaration)
    }

    fn update_tx(tx: &Transaction, c: &Self) -> RepositoryResult<()> {
        let affected = tx.execute(
            r#"UPDATE customs_declaration SET
                hs_code = ?2, declared_value_minor = ?3, currency = ?4,
                status = ?5, updated_at = ?6
               WHERE declaration_id = ?1"#,
            params![
                c.declaration_id,
                c.hs_code,
                c.declared_value_minor,
                c.currency,
                c.status.as_str(),
                fmt_ts(c.updated_at),
            ],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "CustomsDeclaration".to_string(),
                id: c.declaration_id.clone(),
            });
        }
        Ok(())
    }
}
