// ==========================================
// 订舱履约核心 - 订舱（外部协作方只读视图）
// ==========================================
// 订舱 CRUD 不属于本核心；这里只定义履约流程需要读取的字段
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// Booking - 订舱
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub booking_id: String,
    pub booking_no: String,
    pub depot_unlocode: String,                 // 放箱堆场
    pub carrier_id: Option<String>,
    pub si_cutoff_at: Option<NaiveDateTime>,      // 截单时间（提单草稿）
    pub vgm_cutoff_at: Option<NaiveDateTime>,     // VGM 截止时间
    pub customs_cutoff_at: Option<NaiveDateTime>, // 截关时间
}

// ==========================================
// BookingContainerDemand - 订舱箱需求行
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingContainerDemand {
    pub line_id: String,
    pub booking_id: String,
    pub container_type: String,
    pub quantity: u32,
    pub is_soc: bool, // 货主自有箱，承运人不分配
}

// ==========================================
// ShippingInstruction - 提单补料（只读）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShippingInstruction {
    pub si_id: String,
    pub booking_id: String,
    pub status: String,
}

/// 合并同箱型需求，剔除 SOC 行与数量为 0 的行
///
/// 返回按箱型首次出现顺序排列的 (箱型, 数量) 列表
pub fn carrier_demand(lines: &[BookingContainerDemand]) -> Vec<(String, u32)> {
    let mut merged: Vec<(String, u32)> = Vec::new();
    for line in lines.iter().filter(|l| !l.is_soc && l.quantity > 0) {
        match merged.iter_mut().find(|(t, _)| *t == line.container_type) {
            Some((_, qty)) => *qty += line.quantity,
            None => merged.push((line.container_type.clone(), line.quantity)),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(id: &str, container_type: &str, quantity: u32, is_soc: bool) -> BookingContainerDemand {
        BookingContainerDemand {
            line_id: id.to_string(),
            booking_id: "B1".to_string(),
            container_type: container_type.to_string(),
            quantity,
            is_soc,
        }
    }

    #[test]
    fn test_carrier_demand_excludes_soc_lines() {
        let lines = vec![line("L1", "40HC", 2, false), line("L2", "20GP", 3, true)];
        assert_eq!(carrier_demand(&lines), vec![("40HC".to_string(), 2)]);
    }

    #[test]
    fn test_carrier_demand_merges_same_type() {
        let lines = vec![
            line("L1", "40HC", 1, false),
            line("L2", "20GP", 1, false),
            line("L3", "40HC", 2, false),
            line("L4", "45HC", 0, false),
        ];
        assert_eq!(
            carrier_demand(&lines),
            vec![("40HC".to_string(), 3), ("20GP".to_string(), 1)]
        );
    }
}
