// ==========================================
// 订舱履约核心 - 订舱数据只读访问
// ==========================================
// 订舱/箱需求/托运单由外部订舱模块维护，本核心只读
// ==========================================

use crate::domain::booking::{Booking, BookingContainerDemand, ShippingInstruction};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::row_utils::{get_flag, get_opt_ts};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

pub struct BookingRepository {
    conn: Arc<Mutex<Connection>>,
}

impl BookingRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 按 booking_id 查询订舱
    pub fn find_by_id(&self, booking_id: &str) -> RepositoryResult<Option<Booking>> {
        let conn = self.get_conn()?;
        Self::find_by_id_tx(&conn, booking_id)
    }

    pub fn find_by_id_tx(conn: &Connection, booking_id: &str) -> RepositoryResult<Option<Booking>> {
        let booking = conn
            .query_row(
                r#"SELECT booking_id, booking_no, depot_unlocode, carrier_id,
                          si_cutoff_at, vgm_cutoff_at, customs_cutoff_at
                   FROM booking WHERE booking_id = ?1"#,
                params![booking_id],
                map_booking_row,
            )
            .optional()?;
        Ok(booking)
    }

    /// 订舱的箱需求行（按 rowid 即录入顺序）
    pub fn list_demand(&self, booking_id: &str) -> RepositoryResult<Vec<BookingContainerDemand>> {
        let conn = self.get_conn()?;
        Self::list_demand_tx(&conn, booking_id)
    }

    pub fn list_demand_tx(
        conn: &Connection,
        booking_id: &str,
    ) -> RepositoryResult<Vec<BookingContainerDemand>> {
        let mut stmt = conn.prepare(
            r#"SELECT line_id, booking_id, container_type, quantity, is_soc
               FROM booking_container WHERE booking_id = ?1
               ORDER BY rowid"#,
        )?;
        let lines = stmt
            .query_map(params![booking_id], |row| {
                let quantity: i64 = row.get(3)?;
                Ok(BookingContainerDemand {
                    line_id: row.get(0)?,
                    booking_id: row.get(1)?,
                    container_type: row.get(2)?,
                    quantity: quantity.max(0) as u32,
                    is_soc: get_flag(row, 4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(lines)
    }

    /// 订舱对应的托运单（多份时取最早录入的一份）
    pub fn find_shipping_instruction_tx(
        conn: &Connection,
        booking_id: &str,
    ) -> RepositoryResult<Option<ShippingInstruction>> {
        let si = conn
            .query_row(
                r#"SELECT si_id, booking_id, status FROM shipping_instruction
                   WHERE booking_id = ?1 ORDER BY rowid LIMIT 1"#,
                params![booking_id],
                |row| {
                    Ok(ShippingInstruction {
                        si_id: row.get(0)?,
                        booking_id: row.get(1)?,
                        status: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(si)
    }
}

fn map_booking_row(row: &Row) -> rusqlite::Result<Booking> {
    Ok(Booking {
        booking_id: row.get(0)?,
        booking_no: row.get(1)?,
        depot_unlocode: row.get(2)?,
        carrier_id: row.get(3)?,
        si_cutoff_at: get_opt_ts(row, 4)?,
        vgm_cutoff_at: get_opt_ts(row, 5)?,
        customs_cutoff_at: get_opt_ts(row, 6)?,
    })
}
