// ==========================================
// 订舱履约核心 - 进口申报
// ==========================================
// 出口报关单为可修订单证，见 document.rs
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::document::CustomsDeclaration;
use crate::domain::invoice::Invoice;

// ==========================================
// ImportDeclaration - 进口申报
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportDeclaration {
    pub declaration_id: String,
    pub booking_id: String,
    pub declaration_no: String,
    pub declared_value_minor: i64,
    pub currency: String,
    pub filed_by: String,
    pub filed_at: NaiveDateTime,
}

/// 进口申报请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportDeclarationRequest {
    pub declaration_no: String,
    pub declared_value_minor: i64,
    #[serde(default)]
    pub currency: Option<String>,
}

/// 出口报关请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomsDeclarationRequest {
    pub declaration_no: String,
    pub hs_code: String,
    pub declared_value_minor: i64,
    #[serde(default)]
    pub currency: Option<String>,
}

/// 进口申报结果（申报 + 发票）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportFilingResult {
    pub declaration: ImportDeclaration,
    pub invoice: Invoice,
}

/// 出口报关结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomsFilingResult {
    pub declaration: CustomsDeclaration,
    pub invoice: Invoice,
}
