// ==========================================
// 订舱履约核心 - 发票台账
// ==========================================
// 红线: 每个 (订舱, 航段) 至多一张发票
// 红线: 每次明细变动后，总额 = 明细金额之和（全量重算，不做增量）
// ==========================================

use crate::domain::invoice::{Invoice, InvoiceLine, InvoiceWithLines, NewInvoiceLine};
use crate::domain::types::InvoiceLeg;
use crate::engine::error::{EngineError, EngineResult};
use crate::repository::booking_repo::BookingRepository;
use crate::repository::error::RepositoryError;
use crate::repository::invoice_repo::InvoiceRepository;
use crate::repository::reference_repo::ReferenceLookup;
use chrono::NaiveDateTime;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

/// 新建发票的默认值
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceDefaults {
    pub currency: String,
    pub invoice_no_prefix: String,
}

impl Default for InvoiceDefaults {
    fn default() -> Self {
        Self {
            currency: "USD".to_string(),
            invoice_no_prefix: "INV".to_string(),
        }
    }
}

pub struct InvoiceLedger {
    conn: Arc<Mutex<Connection>>,
    reference: Arc<dyn ReferenceLookup>,
}

impl InvoiceLedger {
    pub fn new(conn: Arc<Mutex<Connection>>, reference: Arc<dyn ReferenceLookup>) -> Self {
        Self { conn, reference }
    }

    fn get_conn(&self) -> EngineResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| EngineError::Repository(RepositoryError::LockError(e.to_string())))
    }

    // ==========================================
    // 独立事务入口
    // ==========================================

    /// 查找或创建发票
    pub fn find_or_create(
        &self,
        booking_id: &str,
        leg: InvoiceLeg,
        defaults: &InvoiceDefaults,
        now: NaiveDateTime,
    ) -> EngineResult<Invoice> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let invoice = self.find_or_create_tx(&tx, booking_id, leg, defaults, now)?;
        tx.commit()?;
        Ok(invoice)
    }

    /// 追加明细并重算总额
    pub fn append_line(
        &self,
        invoice_id: &str,
        line: &NewInvoiceLine,
        now: NaiveDateTime,
    ) -> EngineResult<Invoice> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let invoice = Self::append_line_tx(&tx, invoice_id, line, now)?;
        tx.commit()?;
        Ok(invoice)
    }

    /// 修复入口: 按明细全量重算总额
    pub fn recompute_total(&self, invoice_id: &str, now: NaiveDateTime) -> EngineResult<i64> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let total = InvoiceRepository::recompute_total_tx(&tx, invoice_id, now).map_err(|e| match e {
            RepositoryError::NotFound { .. } => EngineError::not_found("Invoice", invoice_id),
            other => EngineError::Repository(other),
        })?;
        tx.commit()?;
        Ok(total)
    }

    /// 发票及明细
    pub fn lines(&self, invoice_id: &str) -> EngineResult<InvoiceWithLines> {
        let conn = self.get_conn()?;
        let invoice = InvoiceRepository::find_by_id_tx(&conn, invoice_id)?
            .ok_or_else(|| EngineError::not_found("Invoice", invoice_id))?;
        let lines = InvoiceRepository::list_lines_tx(&conn, invoice_id)?;
        Ok(InvoiceWithLines { invoice, lines })
    }

    // ==========================================
    // 事务内组合（申报流程使用）
    // ==========================================

    /// 事务内查找或创建发票
    ///
    /// 新建时总额为 0，收款账户取当前启用的默认账户；无默认账户时留空并告警
    pub fn find_or_create_tx(
        &self,
        tx: &Transaction,
        booking_id: &str,
        leg: InvoiceLeg,
        defaults: &InvoiceDefaults,
        now: NaiveDateTime,
    ) -> EngineResult<Invoice> {
        if let Some(existing) = InvoiceRepository::find_by_booking_leg_tx(tx, booking_id, leg)? {
            return Ok(existing);
        }

        let booking = BookingRepository::find_by_id_tx(tx, booking_id)?
            .ok_or_else(|| EngineError::not_found("Booking", booking_id))?;

        let bank_account_id = match self.reference.default_active_bank_account(tx)? {
            Some(account) => Some(account.account_id),
            None => {
                warn!(booking_id, leg = %leg, "无启用的默认收款账户，发票收款账户留空");
                None
            }
        };

        let invoice = Invoice {
            invoice_id: uuid::Uuid::new_v4().to_string(),
            booking_id: booking_id.to_string(),
            leg,
            invoice_no: format!(
                "{}-{}-{}",
                defaults.invoice_no_prefix,
                leg.as_str(),
                booking.booking_no
            ),
            currency: defaults.currency.clone(),
            bank_account_id,
            total_amount_minor: 0,
            created_at: now,
            updated_at: now,
        };
        InvoiceRepository::insert_tx(tx, &invoice)?;

        info!(
            booking_id,
            invoice_id = %invoice.invoice_id,
            invoice_no = %invoice.invoice_no,
            leg = %leg,
            "新建发票"
        );
        Ok(invoice)
    }

    /// 事务内追加明细并重算总额，返回最新发票
    pub fn append_line_tx(
        tx: &Transaction,
        invoice_id: &str,
        line: &NewInvoiceLine,
        now: NaiveDateTime,
    ) -> EngineResult<Invoice> {
        if InvoiceRepository::find_by_id_tx(tx, invoice_id)?.is_none() {
            return Err(EngineError::not_found("Invoice", invoice_id));
        }

        let row = InvoiceLine {
            line_id: uuid::Uuid::new_v4().to_string(),
            invoice_id: invoice_id.to_string(),
            charge_code: line.charge_code.clone(),
            description: line.description.clone(),
            quantity: line.quantity,
            unit_amount_minor: line.unit_amount_minor,
            amount_minor: line.amount_minor(),
            source_ref: line.source_ref.clone(),
            created_at: now,
        };
        InvoiceRepository::insert_line_tx(tx, &row)?;
        let total = InvoiceRepository::recompute_total_tx(tx, invoice_id, now)?;

        info!(
            invoice_id,
            charge_code = %row.charge_code,
            amount_minor = row.amount_minor,
            total_amount_minor = total,
            "发票明细已追加"
        );

        InvoiceRepository::find_by_id_tx(tx, invoice_id)?
            .ok_or_else(|| EngineError::not_found("Invoice", invoice_id))
    }
}
