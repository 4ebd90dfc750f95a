use super::DocumentStore;
use crate::domain::document::BlDraft;
use crate::domain::types::BlDraftStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::row_utils::{fmt_ts, get_enum, get_ts};
use rusqlite::{params, Connection, OptionalExtension, Transaction};

pub(super) fn insert(conn: &Connection, d: &BlDraft) -> RepositoryResult<()> {
    conn.execute(
        r#"INSERT INTO bl_draft (
            bl_draft_id, booking_id, draft_no, status, shipper, consignee,
            notify_party, cargo_description, marks_and_numbers,
            gross_weight_kg, measurement_cbm, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"#,
        params![
            d.bl_draft_id,
            d.booking_id,
            d.draft_no,
            d.status.as_str(),
            d.shipper,
            d.consignee,
            d.notify_party,
            d.cargo_description,
            d.marks_and_numbers,
            d.gross_weight_kg,
            d.measurement_cbm,
            fmt_ts(d.updated_at),
        ],
    )?;
    Ok(())
}

impl DocumentStore for BlDraft {
    fn find_for_booking_tx(
        conn: &Connection,
        booking_id: &str,
        document_id: &str,
    ) -> RepositoryResult<Option<Self>> {
        let draft = conn
            .query_row(
                r#"SELECT bl_draft_id, booking_id, draft_no, status, shipper, consignee,
                          notify_party, cargo_description, marks_and_numbers,
                          gross_weight_kg, measurement_cbm, updated_at
                   FROM bl_draft WHERE bl_draft_id = ?1 AND booking_id = ?2"#,
                params![document_id, booking_id],
                |row| {
                    Ok(BlDraft {
                        bl_draft_id: row.get(0)?,
                        booking_id: row.get(1)?,
                        draft_no: row.get(2)?,
                        status: get_enum(row, 3, BlDraftStatus::parse)?,
                        shipper: row.get(4)?,
                        consignee: row.get(5)?,
                        notify_party: row.get(6)?,
                        cargo_description: row.get(7)?,
                        marks_and_numbers: row.get(8)?,
                        gross_weight_kg: row.get(9)?,
                        measurement_cbm: row.get(10)?,
                        updated_at: get_ts(row, 11)?,
                    })
                },
            )
            .optional()?;
        Ok(draft)
    }

    fn update_tx(tx: &Transaction, d: &Self) -> RepositoryResult<()> {
        let affected = tx.execute(
            r#"UPDATE bl_draft SET
                status = ?2, shipper = ?3, consignee = ?4, notify_party = ?5,
                cargo_description = ?6, marks_and_numbers = ?7,
                gross_weight_kg = ?8, measurement_cbm = ?9, updated_at = ?10
               WHERE bl_draft_id = ?1"#,
            params![
                d.bl_draft_id,
                d.status.as_str(),
                d.shipper,
                d.consignee,
                d.notify_party,
                d.cargo_description,
                d.marks_and_numbers,
                d.gross_weight_kg,
                d.measurement_cbm,
                fmt_ts(d.updated_at),
            ],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "BlDraft".to_string(),
                id: d.bl_draft_id.clone(),
            });
        }
        Ok(())
    }
}
