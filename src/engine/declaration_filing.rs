// ==========================================
// 订舱履约核心 - 申报费用流程
// ==========================================
// 进口申报 / 出口报关: 同一事务内写入申报记录、
// 查找或创建对应航段发票、追加申报费明细并重算总额
// 附加费未配置时申报照常成功，不追加明细（告警）
// ==========================================

use crate::domain::declaration::{
    CustomsDeclarationRequest, CustomsFilingResult, ImportDeclaration, ImportDeclarationRequest,
    ImportFilingResult,
};
use crate::domain::document::CustomsDeclaration;
use crate::domain::invoice::{Invoice, NewInvoiceLine};
use crate::domain::types::{CustomsStatus, InvoiceLeg};
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::invoice_ledger::{InvoiceDefaults, InvoiceLedger};
use crate::repository::booking_repo::BookingRepository;
use crate::repository::document_repo::DocumentRepository;
use crate::repository::error::RepositoryError;
use crate::repository::import_declaration_repo::ImportDeclarationRepository;
use crate::repository::reference_repo::ReferenceLookup;
use chrono::NaiveDateTime;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

/// 申报流程参数（来自配置）
#[derive(Debug, Clone)]
pub struct FilingSettings {
    pub invoice: InvoiceDefaults,
    pub fee_name: String,
}

pub struct DeclarationFilingEngine {
    conn: Arc<Mutex<Connection>>,
    ledger: Arc<InvoiceLedger>,
    reference: Arc<dyn ReferenceLookup>,
}

impl DeclarationFilingEngine {
    pub fn new(
        conn: Arc<Mutex<Connection>>,
        ledger: Arc<InvoiceLedger>,
        reference: Arc<dyn ReferenceLookup>,
    ) -> Self {
        Self {
            conn,
            ledger,
            reference,
        }
    }

    fn get_conn(&self) -> EngineResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| EngineError::Repository(RepositoryError::LockError(e.to_string())))
    }

    /// 进口申报 + 进口申报费
    pub fn file_import(
        &self,
        booking_id: &str,
        request: &ImportDeclarationRequest,
        settings: &FilingSettings,
        actor: &str,
        now: NaiveDateTime,
    ) -> EngineResult<ImportFilingResult> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if BookingRepository::find_by_id_tx(&tx, booking_id)?.is_none() {
            return Err(EngineError::not_found("Booking", booking_id));
        }

        let declaration = ImportDeclaration {
            declaration_id: uuid::Uuid::new_v4().to_string(),
            booking_id: booking_id.to_string(),
            declaration_no: request.declaration_no.trim().to_string(),
            declared_value_minor: request.declared_value_minor,
            currency: resolve_currency(request.currency.as_deref(), &settings.invoice),
            filed_by: actor.to_string(),
            filed_at: now,
        };
        ImportDeclarationRepository::insert_tx(&tx, &declaration)?;

        let invoice = self.charge_fee_tx(
            &tx,
            booking_id,
            InvoiceLeg::Import,
            settings,
            "进口申报费",
            &declaration.declaration_no,
            now,
        )?;
        tx.commit()?;

        info!(
            booking_id,
            declaration_no = %declaration.declaration_no,
            invoice_id = %invoice.invoice_id,
            total_amount_minor = invoice.total_amount_minor,
            "进口申报完成"
        );
        Ok(ImportFilingResult {
            declaration,
            invoice,
        })
    }

    /// 出口报关 + 报关费
    ///
    /// 订舱必须已有托运单（SI），否则 NotFound
    pub fn file_customs(
        &self,
        booking_id: &str,
        request: &CustomsDeclarationRequest,
        settings: &FilingSettings,
        actor: &str,
        now: NaiveDateTime,
    ) -> EngineResult<CustomsFilingResult> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let si = BookingRepository::find_shipping_instruction_tx(&tx, booking_id)?
            .ok_or_else(|| EngineError::not_found("ShippingInstruction", booking_id))?;

        let declaration = CustomsDeclaration {
            declaration_id: uuid::Uuid::new_v4().to_string(),
            booking_id: booking_id.to_string(),
            si_id: si.si_id,
            declaration_no: request.declaration_no.trim().to_string(),
            hs_code: request.hs_code.trim().to_string(),
            declared_value_minor: request.declared_value_minor,
            currency: resolve_currency(request.currency.as_deref(), &settings.invoice),
            status: CustomsStatus::Filed,
            filed_by: actor.to_string(),
            filed_at: now,
            updated_at: now,
        };
        DocumentRepository::insert_customs_tx(&tx, &declaration)?;

        let invoice = self.charge_fee_tx(
            &tx,
            booking_id,
            InvoiceLeg::Export,
            settings,
            "出口报关费",
            &declaration.declaration_no,
            now,
        )?;
        tx.commit()?;

        info!(
            booking_id,
            declaration_no = %declaration.declaration_no,
            invoice_id = %invoice.invoice_id,
            total_amount_minor = invoice.total_amount_minor,
            "出口报关完成"
        );
        Ok(CustomsFilingResult {
            declaration,
            invoice,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn charge_fee_tx(
        &self,
        tx: &Transaction,
        booking_id: &str,
        leg: InvoiceLeg,
        settings: &FilingSettings,
        description: &str,
        source_ref: &str,
        now: NaiveDateTime,
    ) -> EngineResult<Invoice> {
        let invoice = self
            .ledger
            .find_or_create_tx(tx, booking_id, leg, &settings.invoice, now)?;

        match self.reference.surcharge_by_name(tx, &settings.fee_name)? {
            Some(surcharge) if !surcharge.currency.eq_ignore_ascii_case(&invoice.currency) => {
                warn!(
                    booking_id,
                    fee_name = %surcharge.name,
                    fee_currency = %surcharge.currency,
                    invoice_currency = %invoice.currency,
                    "附加费币种与发票币种不一致，申报回滚"
                );
                Err(EngineError::CurrencyMismatch {
                    fee_name: surcharge.name,
                    fee_currency: surcharge.currency,
                    invoice_no: invoice.invoice_no,
                    invoice_currency: invoice.currency,
                })
            }
            Some(surcharge) => InvoiceLedger::append_line_tx(
                tx,
                &invoice.invoice_id,
                &NewInvoiceLine {
                    charge_code: surcharge.name,
                    description: description.to_string(),
                    quantity: 1,
                    unit_amount_minor: surcharge.amount_minor,
                    source_ref: Some(source_ref.to_string()),
                },
                now,
            ),
            None => {
                warn!(
                    booking_id,
                    fee_name = %settings.fee_name,
                    "未配置申报附加费，不追加发票明细"
                );
                Ok(invoice)
            }
        }
    }
}

fn resolve_currency(requested: Option<&str>, defaults: &InvoiceDefaults) -> String {
    requested
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(defaults.currency.as_str())
        .to_uppercase()
}
