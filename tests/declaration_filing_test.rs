// ==========================================
// 申报计费集成测试
// ==========================================
// 测试范围:
// 1. 进口申报 / 出口报关写入申报单并追加费用明细
// 2. 发票总额 = 明细金额之和
// 3. 缺少附加费 / 缺少托运单
// 4. 附加费币种与发票币种不一致时整体回滚
// ==========================================

mod test_helpers;

use freight_fulfillment::api::DeclarationApi;
use freight_fulfillment::app::AppState;
use freight_fulfillment::config::config_keys;
use freight_fulfillment::domain::declaration::{CustomsDeclarationRequest, ImportDeclarationRequest};
use freight_fulfillment::domain::types::{CustomsStatus, InvoiceLeg};
use std::sync::Arc;
use test_helpers::*;

fn setup() -> (tempfile::NamedTempFile, String, AppState) {
    let (tmp, db_path) = create_test_db().unwrap();
    {
        let conn = open_conn(&db_path);
        seed_booking(&conn, "BK1", "BKG0001", "SGSIN");
        seed_bank_account(&conn, "ACC-OLD", false, true);
        seed_bank_account(&conn, "ACC-MAIN", true, true);
    }
    let state = AppState::from_connection(db_path.clone(), shared_conn(&db_path));
    (tmp, db_path, state)
}

fn api(state: &AppState) -> Arc<DeclarationApi> {
    state.declaration_api.clone()
}

fn import_request(no: &str) -> ImportDeclarationRequest {
    ImportDeclarationRequest {
        declaration_no: no.to_string(),
        declared_value_minor: 1_250_000,
        currency: None,
    }
}

fn customs_request(no: &str) -> CustomsDeclarationRequest {
    CustomsDeclarationRequest {
        declaration_no: no.to_string(),
        hs_code: "8471.30".to_string(),
        declared_value_minor: 5_000_000,
        currency: Some("eur".to_string()),
    }
}

#[test]
fn test_import_filing_charges_fee_on_import_invoice() {
    let (_tmp, db_path, state) = setup();
    seed_surcharge(&open_conn(&db_path), "IMPORT_DECLARATION_FEE", 4_500);

    let result = api(&state)
        .file_import_declaration("BK1", &import_request("IMP-001"), "broker")
        .expect("进口申报失败");

    assert_eq!(result.declaration.currency, "USD");
    assert_eq!(result.invoice.leg, InvoiceLeg::Import);
    assert_eq!(result.invoice.invoice_no, "INV-IMPORT-BKG0001");
    assert_eq!(result.invoice.bank_account_id.as_deref(), Some("ACC-MAIN"));
    assert_eq!(result.invoice.total_amount_minor, 4_500);

    let detail = api(&state).get_invoice(&result.invoice.invoice_id).unwrap();
    assert_eq!(detail.lines.len(), 1);
    assert_eq!(detail.lines[0].charge_code, "IMPORT_DECLARATION_FEE");
    assert_eq!(detail.lines[0].source_ref.as_deref(), Some("IMP-001"));
}

#[test]
fn test_repeated_filings_reuse_invoice_and_total_matches_lines() {
    let (_tmp, db_path, state) = setup();
    seed_surcharge(&open_conn(&db_path), "IMPORT_DECLARATION_FEE", 4_500);

    let first = api(&state)
        .file_import_declaration("BK1", &import_request("IMP-001"), "broker")
        .unwrap();
    let second = api(&state)
        .file_import_declaration("BK1", &import_request("IMP-002"), "broker")
        .unwrap();

    assert_eq!(first.invoice.invoice_id, second.invoice.invoice_id);
    assert_eq!(second.invoice.total_amount_minor, 9_000);

    let detail = api(&state).get_invoice(&second.invoice.invoice_id).unwrap();
    let sum: i64 = detail.lines.iter().map(|l| l.amount_minor).sum();
    assert_eq!(detail.invoice.total_amount_minor, sum);

    // 重算与增量结果一致
    let recomputed = api(&state)
        .recompute_invoice_total(&second.invoice.invoice_id)
        .unwrap();
    assert_eq!(recomputed, sum);

    let conn = open_conn(&db_path);
    assert_eq!(count_rows(&conn, "invoice"), 1);
    assert_eq!(count_rows(&conn, "import_declaration"), 2);
}

#[test]
fn test_missing_surcharge_files_without_fee_line() {
    let (_tmp, db_path, state) = setup();

    let result = api(&state)
        .file_import_declaration("BK1", &import_request("IMP-001"), "broker")
        .unwrap();

    assert_eq!(result.invoice.total_amount_minor, 0);
    let conn = open_conn(&db_path);
    assert_eq!(count_rows(&conn, "import_declaration"), 1);
    assert_eq!(count_rows(&conn, "invoice_line"), 0);
}

#[test]
fn test_configured_fee_name_and_prefix_are_used() {
    let (_tmp, db_path, state) = setup();
    seed_surcharge(&open_conn(&db_path), "IMP_FEE_SG", 7_000);
    state
        .config_manager
        .set_global_config_value(config_keys::IMPORT_DECLARATION_FEE_NAME, "IMP_FEE_SG")
        .unwrap();
    state
        .config_manager
        .set_global_config_value(config_keys::INVOICE_NO_PREFIX, "SGINV")
        .unwrap();

    let result = api(&state)
        .file_import_declaration("BK1", &import_request("IMP-001"), "broker")
        .unwrap();
    assert_eq!(result.invoice.invoice_no, "SGINV-IMPORT-BKG0001");
    assert_eq!(result.invoice.total_amount_minor, 7_000);
}

#[test]
fn test_import_filing_for_unknown_booking_writes_nothing() {
    let (_tmp, db_path, state) = setup();

    let err = api(&state)
        .file_import_declaration("NOPE", &import_request("IMP-001"), "broker")
        .unwrap_err();
    assert_eq!(err.status_code(), 404);

    let conn = open_conn(&db_path);
    assert_eq!(count_rows(&conn, "import_declaration"), 0);
    assert_eq!(count_rows(&conn, "invoice"), 0);
}

#[test]
fn test_customs_filing_requires_shipping_instruction() {
    let (_tmp, db_path, state) = setup();
    seed_surcharge(&open_conn(&db_path), "CUSTOMS_FILING_FEE", 3_000);

    let err = api(&state)
        .file_customs_declaration("BK1", &customs_request("EXP-001"), "broker")
        .unwrap_err();
    assert_eq!(err.status_code(), 404);
    assert_eq!(count_rows(&open_conn(&db_path), "customs_declaration"), 0);
}

#[test]
fn test_customs_filing_creates_filed_declaration_and_export_fee() {
    let (_tmp, db_path, state) = setup();
    {
        let conn = open_conn(&db_path);
        seed_si(&conn, "SI1", "BK1");
        seed_surcharge(&conn, "CUSTOMS_FILING_FEE", 3_000);
    }

    let result = api(&state)
        .file_customs_declaration("BK1", &customs_request("EXP-001"), "broker")
        .unwrap();

    assert_eq!(result.declaration.status, CustomsStatus::Filed);
    assert_eq!(result.declaration.si_id, "SI1");
    assert_eq!(result.declaration.currency, "EUR");
    assert_eq!(result.invoice.leg, InvoiceLeg::Export);
    assert_eq!(result.invoice.total_amount_minor, 3_000);

    let logs = state.action_log_repo.find_by_booking("BK1", 10).unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].action_type.as_str(), "FILE_CUSTOMS");
}

#[test]
fn test_invalid_request_is_rejected_before_any_write() {
    let (_tmp, db_path, state) = setup();
    let mut req = customs_request("EXP-001");
    req.hs_code = "84".to_string();
    req.declared_value_minor = -1;

    let err = api(&state)
        .file_customs_declaration("BK1", &req, "broker")
        .unwrap_err();
    assert_eq!(err.status_code(), 422);
    let details = err.details().expect("应包含字段级错误");
    assert_eq!(details.as_array().map(|a| a.len()), Some(2));

    assert_eq!(count_rows(&open_conn(&db_path), "invoice"), 0);
}

#[test]
fn test_fee_in_other_currency_rolls_back_filing() {
    let (_tmp, db_path, state) = setup();
    seed_surcharge_in(&open_conn(&db_path), "IMPORT_DECLARATION_FEE", 4_500, "EUR");

    let err = api(&state)
        .file_import_declaration("BK1", &import_request("IMP-001"), "broker")
        .unwrap_err();
    assert_eq!(err.status_code(), 409);
    assert_eq!(err.code(), "BUSINESS_RULE_VIOLATION");

    let conn = open_conn(&db_path);
    assert_eq!(count_rows(&conn, "import_declaration"), 0);
    assert_eq!(count_rows(&conn, "invoice"), 0);
    assert_eq!(count_rows(&conn, "invoice_line"), 0);
}

#[test]
fn test_fee_currency_compared_case_insensitively_with_configured_invoice_currency() {
    let (_tmp, db_path, state) = setup();
    seed_surcharge_in(&open_conn(&db_path), "IMPORT_DECLARATION_FEE", 4_500, "sgd");
    state
        .config_manager
        .set_global_config_value(config_keys::INVOICE_CURRENCY, "SGD")
        .unwrap();

    let result = api(&state)
        .file_import_declaration("BK1", &import_request("IMP-001"), "broker")
        .unwrap();
    assert_eq!(result.invoice.currency, "SGD");
    assert_eq!(result.invoice.total_amount_minor, 4_500);
}
