// ==========================================
// 订舱履约核心 - 路由
// ==========================================
// 职责: (method, path, body, actor) -> HttpResponse
// 与传输层无关；二进制入口通过 stdin/stdout 承载
// ==========================================

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::api::error::{ApiError, ApiResult, ErrorKind};
use crate::app::state::AppState;
use crate::domain::types::DocumentKind;
use crate::perf::PerfGuard;

/// 路由请求（stdin 每行一个）
#[derive(Debug, Clone, Deserialize)]
pub struct HttpRequest {
    pub method: String,
    pub path: String,
    #[serde(default)]
    pub body: Value,
    #[serde(default = "default_actor")]
    pub actor: String,
}

fn default_actor() -> String {
    "system".to_string()
}

/// 路由响应
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Value,
}

impl HttpResponse {
    fn ok(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    fn error(status: u16, code: &str, message: String, details: Option<Value>) -> Self {
        Self {
            status,
            body: json!({
                "error": {
                    "code": code,
                    "message": message,
                    "details": details,
                }
            }),
        }
    }

    fn from_api_error(err: &ApiError) -> Self {
        Self::error(err.status_code(), err.code(), err.public_message(), err.details())
    }
}

// ==========================================
// 路由表
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route<'a> {
    ReleaseOrder { booking_id: &'a str },
    BlDraft { booking_id: &'a str, draft_id: &'a str },
    Vgm { booking_id: &'a str, transmission_id: &'a str },
    ImportDeclaration { booking_id: &'a str },
    CustomsDeclarations { booking_id: &'a str },
    CustomsDeclaration { booking_id: &'a str, declaration_id: &'a str },
    DocumentVersions { kind: &'a str, document_id: &'a str },
    Invoice { invoice_id: &'a str },
    InvoiceRecompute { invoice_id: &'a str },
    DepotDetention { depot: &'a str },
}

fn match_route(path: &str) -> Option<Route<'_>> {
    let path = path.split('?').next().unwrap_or_default();
    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();

    let route = match segments[..] {
        ["bookings", b, "release-order"] => Route::ReleaseOrder { booking_id: b },
        ["bookings", b, "bl-drafts", d] => Route::BlDraft {
            booking_id: b,
            draft_id: d,
        },
        ["bookings", b, "vgm", t] => Route::Vgm {
            booking_id: b,
            transmission_id: t,
        },
        ["bookings", b, "import-declaration"] => Route::ImportDeclaration { booking_id: b },
        ["bookings", b, "declaration", "customs"] => Route::CustomsDeclarations { booking_id: b },
        ["bookings", b, "declaration", "customs", c] => Route::CustomsDeclaration {
            booking_id: b,
            declaration_id: c,
        },
        ["documents", kind, id, "versions"] => Route::DocumentVersions {
            kind,
            document_id: id,
        },
        ["invoices", id] => Route::Invoice { invoice_id: id },
        ["invoices", id, "recompute"] => Route::InvoiceRecompute { invoice_id: id },
        ["depots", d, "detention"] => Route::DepotDetention { depot: d },
        _ => return None,
    };
    Some(route)
}

/// 处理一次请求
pub fn handle(state: &AppState, method: &str, path: &str, body: Value, actor: &str) -> HttpResponse {
    let Some(route) = match_route(path) else {
        return HttpResponse::error(404, "ROUTE_NOT_FOUND", format!("路由不存在: {}", path), None);
    };
    let method = method.trim().to_uppercase();

    match dispatch(state, &method, route, body, actor) {
        Ok(Some(resp)) => resp,
        Ok(None) => HttpResponse::error(
            405,
            "METHOD_NOT_ALLOWED",
            format!("不支持的方法: {} {}", method, path),
            None,
        ),
        Err(err) => {
            if err.kind() == ErrorKind::Internal {
                tracing::error!(method = %method, path, code = err.code(), error = %err, "请求处理失败");
            } else {
                tracing::debug!(method = %method, path, code = err.code(), error = %err, "请求被拒绝");
            }
            HttpResponse::from_api_error(&err)
        }
    }
}

/// 处理 stdin 上的一行请求
pub fn handle_request(state: &AppState, request: HttpRequest) -> HttpResponse {
    handle(state, &request.method, &request.path, request.body, &request.actor)
}

/// Ok(None) 表示路径存在但方法不支持
fn dispatch(
    state: &AppState,
    method: &str,
    route: Route<'_>,
    body: Value,
    actor: &str,
) -> ApiResult<Option<HttpResponse>> {
    let resp = match (method, route) {
        ("POST", Route::ReleaseOrder { booking_id }) => {
            let _perf = PerfGuard::new("route.allocate_release_order");
            let request = parse_body(body)?;
            let cro = state.cro_api.allocate_release_order(booking_id, &request, actor)?;
            respond(201, &cro)?
        }
        ("PATCH", Route::ReleaseOrder { booking_id }) => {
            let _perf = PerfGuard::new("route.amend_release_order");
            let patch = parse_body(body)?;
            let cro = state.cro_api.amend_release_order(booking_id, &patch, actor)?;
            respond(200, &cro)?
        }
        ("GET", Route::ReleaseOrder { booking_id }) => {
            let _perf = PerfGuard::new("route.get_release_order");
            respond(200, &state.cro_api.get_release_order(booking_id)?)?
        }
        ("PATCH", Route::BlDraft { booking_id, draft_id }) => {
            let _perf = PerfGuard::new("route.amend_bl_draft");
            let patch = parse_body(body)?;
            let outcome = state
                .document_api
                .amend_bl_draft(booking_id, draft_id, &patch, actor)?;
            respond(200, &outcome.document)?
        }
        ("PATCH", Route::Vgm { booking_id, transmission_id }) => {
            let _perf = PerfGuard::new("route.amend_vgm");
            let patch = parse_body(body)?;
            let outcome = state
                .document_api
                .amend_vgm(booking_id, transmission_id, &patch, actor)?;
            respond(200, &outcome.document)?
        }
        ("POST", Route::ImportDeclaration { booking_id }) => {
            let _perf = PerfGuard::new("route.file_import_declaration");
            let request = parse_body(body)?;
            let result = state
                .declaration_api
                .file_import_declaration(booking_id, &request, actor)?;
            respond(201, &result)?
        }
        ("POST", Route::CustomsDeclarations { booking_id }) => {
            let _perf = PerfGuard::new("route.file_customs_declaration");
            let request = parse_body(body)?;
            let result = state
                .declaration_api
                .file_customs_declaration(booking_id, &request, actor)?;
            respond(201, &result)?
        }
        ("PATCH", Route::CustomsDeclaration { booking_id, declaration_id }) => {
            let _perf = PerfGuard::new("route.amend_customs_declaration");
            let patch = parse_body(body)?;
            let outcome = state
                .document_api
                .amend_customs_declaration(booking_id, declaration_id, &patch, actor)?;
            respond(200, &outcome.document)?
        }
        ("GET", Route::DocumentVersions { kind, document_id }) => {
            let _perf = PerfGuard::new("route.document_history");
            let kind = DocumentKind::parse(kind)
                .ok_or_else(|| ApiError::InvalidInput(format!("未知单证类型: {}", kind)))?;
            respond(200, &state.document_api.document_history(kind, document_id)?)?
        }
        ("GET", Route::Invoice { invoice_id }) => {
            let _perf = PerfGuard::new("route.get_invoice");
            respond(200, &state.declaration_api.get_invoice(invoice_id)?)?
        }
        ("POST", Route::InvoiceRecompute { invoice_id }) => {
            let _perf = PerfGuard::new("route.recompute_invoice_total");
            let total = state.declaration_api.recompute_invoice_total(invoice_id)?;
            HttpResponse::ok(200, json!({ "invoice_id": invoice_id, "total_amount_minor": total }))
        }
        ("GET", Route::DepotDetention { depot }) => {
            let _perf = PerfGuard::new("route.effective_detention");
            respond(200, &state.cro_api.effective_detention(depot)?)?
        }
        _ => return Ok(None),
    };
    Ok(Some(resp))
}

fn parse_body<T: DeserializeOwned>(body: Value) -> ApiResult<T> {
    serde_json::from_value(body).map_err(|e| ApiError::InvalidInput(format!("请求体格式错误: {}", e)))
}

fn respond<T: Serialize>(status: u16, value: &T) -> ApiResult<HttpResponse> {
    let body = serde_json::to_value(value)
        .map_err(|e| ApiError::InternalError(format!("响应序列化失败: {}", e)))?;
    Ok(HttpResponse::ok(status, body))
}
