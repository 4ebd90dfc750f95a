// ==========================================
// 订舱履约核心 - 发票台账
// ==========================================
// 红线: total_amount_minor 为派生字段，始终等于当前明细行金额之和
// 金额统一以最小货币单位（分）存储
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::types::InvoiceLeg;

// ==========================================
// Invoice - 发票（每个订舱每个航段至多一张）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub invoice_id: String,
    pub booking_id: String,
    pub leg: InvoiceLeg,
    pub invoice_no: String,
    pub currency: String,
    pub bank_account_id: Option<String>,
    pub total_amount_minor: i64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

// ==========================================
// InvoiceLine - 发票明细行
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceLine {
    pub line_id: String,
    pub invoice_id: String,
    pub charge_code: String,
    pub description: String,
    pub quantity: i64,
    pub unit_amount_minor: i64,
    pub amount_minor: i64,
    pub source_ref: Option<String>, // 产生费用的业务单据（报关单号等）
    pub created_at: NaiveDateTime,
}

/// 新增明细行输入
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewInvoiceLine {
    pub charge_code: String,
    pub description: String,
    pub quantity: i64,
    pub unit_amount_minor: i64,
    pub source_ref: Option<String>,
}

impl NewInvoiceLine {
    /// 行金额 = 数量 × 单价
    pub fn amount_minor(&self) -> i64 {
        self.quantity.saturating_mul(self.unit_amount_minor)
    }
}

/// 发票及明细
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceWithLines {
    pub invoice: Invoice,
    pub lines: Vec<InvoiceLine>,
}
