// ==========================================
// 订舱履约核心 - 放箱单 (Container Release Order)
// ==========================================
// 红线: 每个订舱至多一张放箱单；放箱单与箱状态迁移同一事务落库
// 红线: 修改放箱单不重新分配、不触碰箱状态
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::types::ReleasedToType;

// ==========================================
// ContainerReleaseOrder - 放箱单
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerReleaseOrder {
    pub cro_id: String,
    pub booking_id: String,
    pub cro_no: String,
    pub released_to_type: ReleasedToType,
    pub released_to_id: String,
    pub depot_unlocode: String,
    pub free_days: i32,
    pub detention_term_id: Option<String>,
    pub containers: Vec<ReleasedContainer>, // 按分配顺序
    pub documents: Vec<CroDocument>,
    pub created_by: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl ContainerReleaseOrder {
    pub fn container_ids(&self) -> Vec<&str> {
        self.containers.iter().map(|c| c.container_id.as_str()).collect()
    }
}

// ==========================================
// ReleasedContainer - 放箱单关联箱
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleasedContainer {
    pub container_id: String,
    pub container_no: String,
    pub container_type: String,
    pub seq_no: i32,
}

// ==========================================
// CroDocument - 放箱单附件（仅存引用，不存文件）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CroDocument {
    pub document_id: String,
    pub document_type: String,
    pub file_name: String,
    pub file_ref: String,
    pub seq_no: i32,
}

/// 附件输入（创建/整体替换时使用）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CroDocumentInput {
    pub document_type: String,
    pub file_name: String,
    pub file_ref: String,
}

// ==========================================
// 请求体
// ==========================================

/// 放箱请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationRequest {
    pub released_to_type: ReleasedToType,
    pub released_to_id: String,
    #[serde(default)]
    pub documents: Vec<CroDocumentInput>,
}

/// 放箱单修改请求（字段均可选；documents 出现时整体替换）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CroAmendment {
    #[serde(default)]
    pub released_to_type: Option<ReleasedToType>,
    #[serde(default)]
    pub released_to_id: Option<String>,
    #[serde(default)]
    pub depot_unlocode: Option<String>,
    #[serde(default)]
    pub documents: Option<Vec<CroDocumentInput>>,
}

impl CroAmendment {
    pub fn is_empty(&self) -> bool {
        self.released_to_type.is_none()
            && self.released_to_id.is_none()
            && self.depot_unlocode.is_none()
            && self.documents.is_none()
    }
}
