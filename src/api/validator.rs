// ==========================================
// 订舱履约核心 - 请求载荷校验器
// ==========================================
// 职责: 在开启事务之前完成全部字段校验，失败返回 422 且零写入
// 输出: 字段级违规明细 (ValidationViolation)
// ==========================================

use crate::api::error::{ApiError, ApiResult, ValidationViolation};
use crate::domain::declaration::{CustomsDeclarationRequest, ImportDeclarationRequest};
use crate::domain::document::{BlDraftPatch, CustomsPatch, VgmPatch};
use crate::domain::release_order::{AllocationRequest, CroAmendment, CroDocumentInput};

/// 违规收集器
#[derive(Debug, Default)]
struct Violations(Vec<ValidationViolation>);

impl Violations {
    fn push(&mut self, field: impl Into<String>, reason: impl Into<String>) {
        self.0.push(ValidationViolation::new(field, reason));
    }

    fn require_text(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.push(field, "不能为空");
        }
    }

    fn optional_text(&mut self, field: &str, value: Option<&str>) {
        if let Some(v) = value {
            self.require_text(field, v);
        }
    }

    fn finish(self, reason: &str) -> ApiResult<()> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(ApiError::ValidationFailed {
                reason: reason.to_string(),
                violations: self.0,
            })
        }
    }
}

fn is_unlocode(s: &str) -> bool {
    s.len() == 5 && s.chars().all(|c| c.is_ascii_alphanumeric())
}

fn is_currency_code(s: &str) -> bool {
    s.len() == 3 && s.chars().all(|c| c.is_ascii_alphabetic())
}

/// ISO 6346 箱号外形: 4 位字母 + 7 位数字（不校验校验位）
fn is_container_no(s: &str) -> bool {
    s.len() == 11
        && s.is_ascii()
        && s[..4].chars().all(|c| c.is_ascii_alphabetic())
        && s[4..].chars().all(|c| c.is_ascii_digit())
}

fn is_hs_code(s: &str) -> bool {
    let digits = s.chars().filter(|c| c.is_ascii_digit()).count();
    digits >= 4 && s.chars().all(|c| c.is_ascii_digit() || c == '.')
}

fn check_documents(v: &mut Violations, docs: &[CroDocumentInput]) {
    for (i, doc) in docs.iter().enumerate() {
        v.require_text(&format!("documents[{}].document_type", i), &doc.document_type);
        v.require_text(&format!("documents[{}].file_name", i), &doc.file_name);
        v.require_text(&format!("documents[{}].file_ref", i), &doc.file_ref);
    }
}

fn check_currency(v: &mut Violations, currency: Option<&str>) {
    if let Some(c) = currency {
        if !is_currency_code(c.trim()) {
            v.push("currency", "必须为 3 位字母币种代码");
        }
    }
}

// ==========================================
// 放箱单
// ==========================================

pub fn validate_allocation_request(req: &AllocationRequest) -> ApiResult<()> {
    let mut v = Violations::default();
    v.require_text("released_to_id", &req.released_to_id);
    check_documents(&mut v, &req.documents);
    v.finish("放箱分配请求不合法")
}

pub fn validate_cro_amendment(patch: &CroAmendment) -> ApiResult<()> {
    let mut v = Violations::default();
    if patch.is_empty() {
        v.push("body", "至少需要修改一个字段");
    }
    v.optional_text("released_to_id", patch.released_to_id.as_deref());
    if let Some(depot) = &patch.depot_unlocode {
        if !is_unlocode(depot.trim()) {
            v.push("depot_unlocode", "必须为 5 位 UN/LOCODE");
        }
    }
    if let Some(docs) = &patch.documents {
        check_documents(&mut v, docs);
    }
    v.finish("放箱单修改请求不合法")
}

// ==========================================
// 可修订单证
// ==========================================

pub fn validate_bl_draft_patch(patch: &BlDraftPatch) -> ApiResult<()> {
    let mut v = Violations::default();
    if patch.is_empty() {
        v.push("body", "至少需要修改一个字段");
    }
    v.optional_text("shipper", patch.shipper.as_deref());
    v.optional_text("consignee", patch.consignee.as_deref());
    v.optional_text("cargo_description", patch.cargo_description.as_deref());
    v.optional_text("notify_party", patch.notify_party.as_ref().and_then(|p| p.as_deref()));
    v.optional_text(
        "marks_and_numbers",
        patch.marks_and_numbers.as_ref().and_then(|m| m.as_deref()),
    );
    if let Some(w) = patch.gross_weight_kg {
        if !(w.is_finite() && w > 0.0) {
            v.push("gross_weight_kg", "必须为正数");
        }
    }
    if let Some(Some(m)) = patch.measurement_cbm {
        if !(m.is_finite() && m >= 0.0) {
            v.push("measurement_cbm", "不能为负数");
        }
    }
    v.finish("提单草稿修改请求不合法")
}

pub fn validate_vgm_patch(patch: &VgmPatch) -> ApiResult<()> {
    let mut v = Violations::default();
    if patch.is_empty() {
        v.push("body", "至少需要修改一个字段");
    }
    if let Some(no) = &patch.container_no {
        if !is_container_no(no.trim()) {
            v.push("container_no", "箱号格式应为 4 位字母 + 7 位数字");
        }
    }
    if let Some(mass) = patch.verified_gross_mass_kg {
        if !(mass.is_finite() && mass > 0.0) {
            v.push("verified_gross_mass_kg", "必须为正数");
        }
    }
    v.optional_text("authorized_person", patch.authorized_person.as_deref());
    v.finish("VGM 修改请求不合法")
}

pub fn validate_customs_patch(patch: &CustomsPatch) -> ApiResult<()> {
    let mut v = Violations::default();
    if patch.is_empty() {
        v.push("body", "至少需要修改一个字段");
    }
    if let Some(hs) = &patch.hs_code {
        if !is_hs_code(hs.trim()) {
            v.push("hs_code", "HS 编码至少 4 位数字");
        }
    }
    if let Some(value) = patch.declared_value_minor {
        if value < 0 {
            v.push("declared_value_minor", "不能为负数");
        }
    }
    check_currency(&mut v, patch.currency.as_deref());
    v.finish("报关单修改请求不合法")
}

// ==========================================
// 申报
// ==========================================

pub fn validate_import_declaration(req: &ImportDeclarationRequest) -> ApiResult<()> {
    let mut v = Violations::default();
    v.require_text("declaration_no", &req.declaration_no);
    if req.declared_value_minor < 0 {
        v.push("declared_value_minor", "不能为负数");
    }
    check_currency(&mut v, req.currency.as_deref());
    v.finish("进口申报请求不合法")
}

pub fn validate_customs_declaration(req: &CustomsDeclarationRequest) -> ApiResult<()> {
    let mut v = Violations::default();
    v.require_text("declaration_no", &req.declaration_no);
    if !is_hs_code(req.hs_code.trim()) {
        v.push("hs_code", "HS 编码至少 4 位数字");
    }
    if req.declared_value_minor < 0 {
        v.push("declared_value_minor", "不能为负数");
    }
    check_currency(&mut v, req.currency.as_deref());
    v.finish("出口报关请求不合法")
}
