use super::DocumentStore;
use crate::domain::document::VgmTransmission;
use crate::domain::types::{VgmStatus, WeighingMethod};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::row_utils::{fmt_ts, get_enum, get_ts};
use rusqlite::{params, Connection, OptionalExtension, Transaction};

pub(super) fn insert(conn: &Connection, t: &VgmTransmission) -> RepositoryResult<()> {
    conn.execute(
        r#"INSERT INTO vgm_transmission (
            transmission_id, booking_id, container_no, verified_gross_mass_kg,
            weighing_method, authorized_person, status, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"#,
        params![
            t.transmission_id,
            t.booking_id,
            t.container_no,
            t.verified_gross_mass_kg,
            t.weighing_method.as_str(),
            t.authorized_person,
            t.status.as_str(),
            fmt_ts(t.updated_at),
        ],
    )?;
    Ok(())
}

impl DocumentStore for VgmTransmission {
    fn find_for_booking_tx(
        conn: &Connection,
        booking_id: &str,
        document_id: &str,
    ) -> RepositoryResult<Option<Self>> {
        let transmission = conn
            .query_row(
                r#"SELECT transmission_id, booking_id, container_no, verified_gross_mass_kg,
                          weighing_method, authorized_person, status, updated_at
                   FROM vgm_transmission WHERE transmission_id = ?1 AND booking_id = ?2"#,
                params![document_id, booking_id],
                |row| {
                    Ok(VgmTransmission {
                        transmission_id: row.get(0)?,
                        booking_id: row.get(1)?,
                        container_no: row.get(2)?,
                        verified_gross_mass_kg: row.get(3)?,
                        weighing_method: get_enum(row, 4, WeighingMethod::parse)?,
                        authorized_person: row.get(5)?,
                        status: get_enum(row, 6, VgmStatus::parse)?,
                        updated_at: get_ts(row, 7)?,
                    })
                },
            )
            .optional()?;
        Ok(transmission)
    }

    fn update_tx(tx: &Transaction, t: &Self) -> RepositoryResult<()> {
        let affected = tx.execute(
            r#"UPDATE vgm_transmission SET
                container_no = ?2, verified_gross_mass_kg = ?3, weighing_method = ?4,
                authorized_person = ?5, status = ?6, updated_at = ?7
               WHERE transmission_id = ?1"#,
            params![
                t.transmission_id,
                t.container_no,
                t.verified_gross_mass_kg,
                t.weighing_method.as_str(),
                t.authorized_person,
                t.status.as_str(),
                fmt_ts(t.updated_at),
            ],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "VgmTransmission".to_string(),
                id: t.transmission_id.clone(),
            });
        }
        Ok(())
    }
}
