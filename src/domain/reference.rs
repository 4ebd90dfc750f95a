// ==========================================
// 订舱履约核心 - 参考数据（外部协作方只读）
// ==========================================

use serde::{Deserialize, Serialize};

/// 收款银行账户
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankAccount {
    pub account_id: String,
    pub bank_name: String,
    pub account_no: String,
    pub currency: String,
    pub is_active: bool,
    pub is_default: bool,
}

/// 附加费（按名称查询费率）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Surcharge {
    pub surcharge_id: String,
    pub name: String,
    pub amount_minor: i64,
    pub currency: String,
}
