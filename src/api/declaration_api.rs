// ==========================================
// 订舱履约核心 - 申报 API
// ==========================================
// 职责: 进口申报 / 出口报关（含费用入账）与发票查询
// ==========================================

use std::sync::Arc;

use crate::api::error::ApiResult;
use crate::api::{record_action, require_id, validator};
use crate::config::FulfillmentConfigReader;
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::declaration::{
    CustomsDeclarationRequest, CustomsFilingResult, ImportDeclarationRequest, ImportFilingResult,
};
use crate::domain::invoice::InvoiceWithLines;
use crate::engine::declaration_filing::{DeclarationFilingEngine, FilingSettings};
use crate::engine::invoice_ledger::{InvoiceDefaults, InvoiceLedger};
use crate::repository::action_log_repo::ActionLogRepository;
use serde_json::json;

/// 申报API
pub struct DeclarationApi {
    filing_engine: Arc<DeclarationFilingEngine>,
    ledger: Arc<InvoiceLedger>,
    config: Arc<dyn FulfillmentConfigReader>,
    action_log_repo: Arc<ActionLogRepository>,
}

impl DeclarationApi {
    pub fn new(
        filing_engine: Arc<DeclarationFilingEngine>,
        ledger: Arc<InvoiceLedger>,
        config: Arc<dyn FulfillmentConfigReader>,
        action_log_repo: Arc<ActionLogRepository>,
    ) -> Self {
        Self {
            filing_engine,
            ledger,
            config,
            action_log_repo,
        }
    }

    fn filing_settings(&self, fee_name: String) -> ApiResult<FilingSettings> {
        Ok(FilingSettings {
            invoice: InvoiceDefaults {
                currency: self.config.get_invoice_currency()?,
                invoice_no_prefix: self.config.get_invoice_no_prefix()?,
            },
            fee_name,
        })
    }

    /// 进口申报
    pub fn file_import_declaration(
        &self,
        booking_id: &str,
        request: &ImportDeclarationRequest,
        actor: &str,
    ) -> ApiResult<ImportFilingResult> {
        require_id("booking_id", booking_id)?;
        validator::validate_import_declaration(request)?;

        let settings = self.filing_settings(self.config.get_import_declaration_fee_name()?)?;
        let now = chrono::Utc::now().naive_utc();
        let result = self
            .filing_engine
            .file_import(booking_id, request, &settings, actor, now)?;

        record_action(
            &self.action_log_repo,
            ActionLog::new(
                booking_id,
                ActionType::FileImport,
                actor,
                Some(json!({
                    "declaration_no": result.declaration.declaration_no,
                    "invoice_id": result.invoice.invoice_id,
                    "total_amount_minor": result.invoice.total_amount_minor,
                })),
                "进口申报",
            ),
        );

        Ok(result)
    }

    /// 出口报关
    pub fn file_customs_declaration(
        &self,
        booking_id: &str,
        request: &CustomsDeclarationRequest,
        actor: &str,
    ) -> ApiResult<CustomsFilingResult> {
        require_id("booking_id", booking_id)?;
        validator::validate_customs_declaration(request)?;

        let settings = self.filing_settings(self.config.get_customs_filing_fee_name()?)?;
        let now = chrono::Utc::now().naive_utc();
        let result = self
            .filing_engine
            .file_customs(booking_id, request, &settings, actor, now)?;

        record_action(
            &self.action_log_repo,
            ActionLog::new(
                booking_id,
                ActionType::FileCustoms,
                actor,
                Some(json!({
                    "declaration_id": result.declaration.declaration_id,
                    "declaration_no": result.declaration.declaration_no,
                    "invoice_id": result.invoice.invoice_id,
                })),
                "出口报关",
            ),
        );

        Ok(result)
    }

    /// 发票及明细
    pub fn get_invoice(&self, invoice_id: &str) -> ApiResult<InvoiceWithLines> {
        require_id("invoice_id", invoice_id)?;
        Ok(self.ledger.lines(invoice_id)?)
    }

    /// 按明细重算发票总额（运维修复）
    pub fn recompute_invoice_total(&self, invoice_id: &str) -> ApiResult<i64> {
        require_id("invoice_id", invoice_id)?;
        let now = chrono::Utc::now().naive_utc();
        Ok(self.ledger.recompute_total(invoice_id, now)?)
    }
}
