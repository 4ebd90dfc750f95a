// ==========================================
// 路由集成测试
// ==========================================
// 测试范围: 状态码映射 / 错误体结构 / 404 / 405 / 422
// ==========================================

mod test_helpers;

use freight_fulfillment::app::{handle, AppState, HttpResponse};
use serde_json::{json, Value};
use test_helpers::*;

fn setup() -> (tempfile::NamedTempFile, AppState) {
    let (tmp, db_path) = create_test_db().unwrap();
    {
        let conn = open_conn(&db_path);
        seed_booking(&conn, "BK1", "BKG0001", "SGSIN");
        seed_demand(&conn, "BK1", "40HC", 1, false);
        seed_container(&conn, "C1", "40HC", "SGSIN", "AVAILABLE", None);
        // 截止时间早已过去
        set_cutoffs(
            &conn,
            "BK1",
            Some("2020-01-01 00:00:00"),
            Some("2020-01-01 00:00:00"),
            None,
        );
        seed_vgm(&conn, "T1", "BK1", "PENDING");
    }
    let state = AppState::new(db_path).unwrap();
    (tmp, state)
}

fn call(state: &AppState, method: &str, path: &str, body: Value) -> HttpResponse {
    handle(state, method, path, body, "tester")
}

fn error_code(resp: &HttpResponse) -> &str {
    resp.body["error"]["code"].as_str().unwrap_or_default()
}

#[test]
fn test_allocate_then_duplicate() {
    let (_tmp, state) = setup();
    let body = json!({ "released_to_type": "TRUCKER", "released_to_id": "TRK-001" });

    let created = call(&state, "POST", "/bookings/BK1/release-order", body.clone());
    assert_eq!(created.status, 201);
    assert_eq!(created.body["containers"][0]["container_id"], "C1");

    let fetched = call(&state, "GET", "/bookings/BK1/release-order", Value::Null);
    assert_eq!(fetched.status, 200);
    assert_eq!(fetched.body["cro_no"], created.body["cro_no"]);

    let duplicate = call(&state, "POST", "/bookings/BK1/release-order", body);
    assert_eq!(duplicate.status, 409);
    assert_eq!(error_code(&duplicate), "RELEASE_ORDER_EXISTS");
}

#[test]
fn test_unknown_route_and_method() {
    let (_tmp, state) = setup();

    let missing = call(&state, "GET", "/containers/C1", Value::Null);
    assert_eq!(missing.status, 404);
    assert_eq!(error_code(&missing), "ROUTE_NOT_FOUND");

    let wrong_method = call(&state, "DELETE", "/bookings/BK1/release-order", Value::Null);
    assert_eq!(wrong_method.status, 405);
    assert_eq!(error_code(&wrong_method), "METHOD_NOT_ALLOWED");
}

#[test]
fn test_malformed_body_is_unprocessable() {
    let (_tmp, state) = setup();

    let resp = call(
        &state,
        "POST",
        "/bookings/BK1/release-order",
        json!({ "released_to_type": "SPACESHIP", "released_to_id": "X" }),
    );
    assert_eq!(resp.status, 422);
    assert_eq!(error_code(&resp), "INVALID_INPUT");
}

#[test]
fn test_validation_failure_lists_fields() {
    let (_tmp, state) = setup();

    let resp = call(
        &state,
        "PATCH",
        "/bookings/BK1/vgm/T1",
        json!({ "container_no": "BAD", "verified_gross_mass_kg": 0.0 }),
    );
    assert_eq!(resp.status, 422);
    assert_eq!(error_code(&resp), "VALIDATION_FAILED");
    let fields: Vec<&str> = resp.body["error"]["details"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|v| v["field"].as_str())
        .collect();
    assert_eq!(fields, vec!["container_no", "verified_gross_mass_kg"]);
}

#[test]
fn test_vgm_after_cutoff_is_forbidden() {
    let (_tmp, state) = setup();

    let resp = call(
        &state,
        "PATCH",
        "/bookings/BK1/vgm/T1",
        json!({ "verified_gross_mass_kg": 20000.0 }),
    );
    assert_eq!(resp.status, 403);
    assert_eq!(error_code(&resp), "CUTOFF_PASSED");
    assert_eq!(resp.body["error"]["details"]["reason"], "CUTOFF_PASSED");

    let history = call(&state, "GET", "/documents/VGM_TRANSMISSION/T1/versions", Value::Null);
    assert_eq!(history.status, 200);
    assert_eq!(history.body.as_array().map(|a| a.len()), Some(0));
}

#[test]
fn test_unknown_booking_is_not_found() {
    let (_tmp, state) = setup();

    let resp = call(
        &state,
        "POST",
        "/bookings/NOPE/import-declaration",
        json!({ "declaration_no": "IMP-1", "declared_value_minor": 100 }),
    );
    assert_eq!(resp.status, 404);
    assert_eq!(error_code(&resp), "NOT_FOUND");
}

#[test]
fn test_depot_detention_prefers_depot_specific_term() {
    let (tmp, state) = setup();
    {
        let conn = open_conn(tmp.path().to_str().unwrap());
        seed_detention_term(&conn, "G1", None, 14, "2021-01-01 00:00:00", None);
        seed_detention_term(&conn, "D1", Some("SGSIN"), 7, "2020-01-01 00:00:00", None);
        seed_detention_term(&conn, "D0", Some("SGSIN"), 30, "2019-01-01 00:00:00", Some("2019-12-31 00:00:00"));
    }

    let resp = call(&state, "GET", "/depots/SGSIN/detention", Value::Null);
    assert_eq!(resp.status, 200);
    assert_eq!(resp.body["free_days"], 7);
    assert_eq!(resp.body["term_id"], "D1");

    let global = call(&state, "GET", "/depots/CNSHA/detention", Value::Null);
    assert_eq!(global.status, 200);
    assert_eq!(global.body["term_id"], "G1");

    let rejected = call(&state, "POST", "/depots/SGSIN/detention", Value::Null);
    assert_eq!(rejected.status, 405);
}
