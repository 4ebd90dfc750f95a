// ==========================================
// 订舱履约核心 - 免费期（滞箱）条款
// ==========================================
// 条款一经生效不可修改；管理员通过新增行调整政策
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// DetentionTerm - 免费期条款
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetentionTerm {
    pub term_id: String,
    pub depot_id: Option<String>,   // None = 全局条款
    pub carrier_id: Option<String>,
    pub free_days: i32,
    pub effective_from: NaiveDateTime,
    pub effective_to: Option<NaiveDateTime>, // None = 长期有效；否则含当日（闭区间）
    pub created_at: NaiveDateTime,
}

impl DetentionTerm {
    /// 是否为堆场专属条款
    pub fn is_depot_specific(&self) -> bool {
        self.depot_id.is_some()
    }

    /// 在 as_of 时点是否生效
    pub fn is_effective_at(&self, as_of: NaiveDateTime) -> bool {
        self.effective_from <= as_of && self.effective_to.map_or(true, |to| to >= as_of)
    }

    /// 是否适用于指定堆场（堆场专属匹配或全局）
    pub fn applies_to_depot(&self, depot_unlocode: &str) -> bool {
        match &self.depot_id {
            Some(depot) => depot == depot_unlocode,
            None => true,
        }
    }
}

// ==========================================
// ResolvedDetention - 解析结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedDetention {
    pub free_days: i32,
    pub term_id: Option<String>,
}

impl ResolvedDetention {
    /// 无候选条款时的结果
    pub fn none() -> Self {
        Self {
            free_days: 0,
            term_id: None,
        }
    }
}

/// 免费期条款查询条件（堆场 + 生效时点）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetentionQuery {
    pub depot: String,
    pub as_of: NaiveDateTime,
}

impl DetentionQuery {
    pub fn new(depot: impl Into<String>, as_of: NaiveDateTime) -> Self {
        Self {
            depot: depot.into(),
            as_of,
        }
    }
}
