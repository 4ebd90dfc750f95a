// ==========================================
// 订舱履约核心 - 操作日志领域模型
// ==========================================
// 红线: 所有履约写操作必须记录
// 用途: 审计追踪
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

// ==========================================
// ActionLog - 操作日志
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionLog {
    pub action_id: String,
    pub booking_id: Option<String>,
    pub action_type: ActionType,
    pub action_ts: NaiveDateTime,
    pub actor: String,
    pub payload_json: Option<JsonValue>,
    pub detail: Option<String>,
}

impl ActionLog {
    pub fn new(
        booking_id: &str,
        action_type: ActionType,
        actor: &str,
        payload_json: Option<JsonValue>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            action_id: uuid::Uuid::new_v4().to_string(),
            booking_id: Some(booking_id.to_string()),
            action_type,
            action_ts: chrono::Utc::now().naive_utc(),
            actor: actor.to_string(),
            payload_json,
            detail: Some(detail.into()),
        }
    }
}

// ==========================================
// ActionType - 操作类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionType {
    AllocateRelease, // 放箱分配
    AmendRelease,    // 修改放箱单
    AmendDocument,   // 修改单证
    FileImport,      // 进口申报
    FileCustoms,     // 出口报关
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::AllocateRelease => "ALLOCATE_RELEASE",
            ActionType::AmendRelease => "AMEND_RELEASE",
            ActionType::AmendDocument => "AMEND_DOCUMENT",
            ActionType::FileImport => "FILE_IMPORT",
            ActionType::FileCustoms => "FILE_CUSTOMS",
        }
    }

    pub fn parse(s: &str) -> Option<ActionType> {
        match s.trim().to_uppercase().as_str() {
            "ALLOCATE_RELEASE" => Some(ActionType::AllocateRelease),
            "AMEND_RELEASE" => Some(ActionType::AmendRelease),
            "AMEND_DOCUMENT" => Some(ActionType::AmendDocument),
            "FILE_IMPORT" => Some(ActionType::FileImport),
            "FILE_CUSTOMS" => Some(ActionType::FileCustoms),
            _ => None,
        }
    }
}
