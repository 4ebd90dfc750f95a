// ==========================================
// 订舱履约核心 - 领域类型定义
// ==========================================
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

/// 为状态类枚举生成 as_str / parse / Display
///
/// parse 严格匹配（大小写不敏感），未知值返回 None，由调用方决定如何报错。
macro_rules! db_enum {
    ($name:ident { $($variant:ident => $code:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $code,)+
                }
            }

            pub fn parse(s: &str) -> Option<$name> {
                match s.trim().to_uppercase().as_str() {
                    $($code => Some($name::$variant),)+
                    _ => None,
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }
    };
}

// ==========================================
// 箱状态 (Container Status)
// ==========================================
// AVAILABLE -> ALLOCATED 只能由放箱分配引擎完成
// 提箱/还箱流程（IN_USE 等）由外部系统驱动
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContainerStatus {
    Available,   // 可用
    Allocated,   // 已分配（放箱单锁定）
    InUse,       // 已提箱使用中
    UnderRepair, // 修箱
}

db_enum!(ContainerStatus {
    Available => "AVAILABLE",
    Allocated => "ALLOCATED",
    InUse => "IN_USE",
    UnderRepair => "UNDER_REPAIR",
});

// ==========================================
// 放箱对象类型 (Released-To Type)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReleasedToType {
    Shipper,
    Forwarder,
    Trucker,
    Consignee,
}

db_enum!(ReleasedToType {
    Shipper => "SHIPPER",
    Forwarder => "FORWARDER",
    Trucker => "TRUCKER",
    Consignee => "CONSIGNEE",
});

// ==========================================
// 提单草稿状态 (BL Draft Status)
// ==========================================
// 终态: APPROVED / RELEASED
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlDraftStatus {
    Draft,
    Submitted,
    Approved,
    Released,
}

db_enum!(BlDraftStatus {
    Draft => "DRAFT",
    Submitted => "SUBMITTED",
    Approved => "APPROVED",
    Released => "RELEASED",
});

// ==========================================
// VGM 传输状态 (VGM Transmission Status)
// ==========================================
// 无终态；修订后复位为 PENDING（需重新校验）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VgmStatus {
    Pending,
    Transmitted,
    Accepted,
    Rejected,
}

db_enum!(VgmStatus {
    Pending => "PENDING",
    Transmitted => "TRANSMITTED",
    Accepted => "ACCEPTED",
    Rejected => "REJECTED",
});

// ==========================================
// 称重方法 (VGM Weighing Method, SOLAS)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WeighingMethod {
    Method1, // 整箱过磅
    Method2, // 货物+皮重累加
}

db_enum!(WeighingMethod {
    Method1 => "METHOD1",
    Method2 => "METHOD2",
});

// ==========================================
// 报关单状态 (Customs Declaration Status)
// ==========================================
// 终态: CLEARED；修订后复位为 FILED
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CustomsStatus {
    Filed,
    Accepted,
    Cleared,
    Rejected,
}

db_enum!(CustomsStatus {
    Filed => "FILED",
    Accepted => "ACCEPTED",
    Cleared => "CLEARED",
    Rejected => "REJECTED",
});

// ==========================================
// 可修订单证类型 (Document Kind)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentKind {
    BlDraft,
    VgmTransmission,
    CustomsDeclaration,
}

db_enum!(DocumentKind {
    BlDraft => "BL_DRAFT",
    VgmTransmission => "VGM_TRANSMISSION",
    CustomsDeclaration => "CUSTOMS_DECLARATION",
});

// ==========================================
// 版本快照类型 (Snapshot Kind)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SnapshotKind {
    PreEdit,
    PostEdit,
}

db_enum!(SnapshotKind {
    PreEdit => "PRE_EDIT",
    PostEdit => "POST_EDIT",
});

// ==========================================
// 发票航段 (Invoice Leg)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceLeg {
    Export,
    Import,
}

db_enum!(InvoiceLeg {
    Export => "EXPORT",
    Import => "IMPORT",
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(ContainerStatus::parse("available"), Some(ContainerStatus::Available));
        assert_eq!(ReleasedToType::parse(" Trucker "), Some(ReleasedToType::Trucker));
        assert_eq!(BlDraftStatus::parse("RELEASED"), Some(BlDraftStatus::Released));
    }

    #[test]
    fn test_parse_unknown_returns_none() {
        assert_eq!(ContainerStatus::parse("LOST"), None);
        assert_eq!(InvoiceLeg::parse(""), None);
    }

    #[test]
    fn test_serde_matches_db_code() {
        let json = serde_json::to_string(&DocumentKind::VgmTransmission).unwrap();
        assert_eq!(json, "\"VGM_TRANSMISSION\"");
        assert_eq!(
            serde_json::to_string(&ContainerStatus::UnderRepair).unwrap(),
            format!("\"{}\"", ContainerStatus::UnderRepair.as_str())
        );
    }
}
