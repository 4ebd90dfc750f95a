// ==========================================
// 订舱履约核心 - 箱库存领域模型
// ==========================================
// 红线: 箱状态只能由放箱分配引擎从 AVAILABLE 迁移到 ALLOCATED
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::types::ContainerStatus;

// ==========================================
// Container - 实体箱
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Container {
    pub container_id: String,
    pub container_no: String,               // 箱号 (如 MSKU1234567)
    pub container_type: String,             // 箱型代码 (如 40HC)
    pub status: ContainerStatus,
    pub current_depot: String,              // 当前所在堆场 (UN/LOCODE)
    pub last_used_at: Option<NaiveDateTime>, // 最近使用时间，FIFO 排序依据；None 视为从未使用
    pub updated_at: NaiveDateTime,
}

// ==========================================
// AvailabilityQuery - 可用箱查询条件
// ==========================================
// 箱型 + 堆场确定一个竞争池
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AvailabilityQuery {
    pub container_type: String,
    pub depot: String,
}

impl AvailabilityQuery {
    pub fn new(container_type: impl Into<String>, depot: impl Into<String>) -> Self {
        Self {
            container_type: container_type.into(),
            depot: depot.into(),
        }
    }
}
