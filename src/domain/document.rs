// ==========================================
// 订舱履约核心 - 可修订单证
// ==========================================
// 提单草稿 / VGM 传输 / 报关单
// 红线: 终态或已过截止时间的单证不可修改
// 红线: 每次成功修改追加修改前/修改后两条不可变快照
// ==========================================

use chrono::NaiveDateTime;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::types::{
    BlDraftStatus, CustomsStatus, DocumentKind, SnapshotKind, VgmStatus, WeighingMethod,
};

// ==========================================
// AmendableDocument - 可修订单证抽象
// ==========================================

/// 可修订单证
///
/// 快照以完整单证状态序列化，可通过 [`DocumentVersion::replay`] 还原为强类型单证。
pub trait AmendableDocument: Clone + Serialize + DeserializeOwned {
    /// 单证类型
    const KIND: DocumentKind;

    /// 修改请求体
    type Patch;

    fn document_id(&self) -> &str;

    fn booking_id(&self) -> &str;

    /// 当前状态代码（用于冻结判定）
    fn status_code(&self) -> &'static str;

    /// 应用修改
    fn apply_patch(&mut self, patch: &Self::Patch);

    /// 单证自带的校验/受理状态复位为初始待校验值；无此类状态的单证不做处理
    fn reset_validation_status(&mut self) {}

    fn touch(&mut self, now: NaiveDateTime);
}

// ==========================================
// BlDraft - 提单草稿
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlDraft {
    pub bl_draft_id: String,
    pub booking_id: String,
    pub draft_no: String,
    pub status: BlDraftStatus,
    pub shipper: String,
    pub consignee: String,
    pub notify_party: Option<String>,
    pub cargo_description: String,
    pub marks_and_numbers: Option<String>,
    pub gross_weight_kg: f64,
    pub measurement_cbm: Option<f64>,
    pub updated_at: NaiveDateTime,
}

/// 可清空字段: 缺省 = 不修改，显式 null = 清空，有值 = 覆盖
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlDraftPatch {
    #[serde(default)]
    pub shipper: Option<String>,
    #[serde(default)]
    pub consignee: Option<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub notify_party: Option<Option<String>>,
    #[serde(default)]
    pub cargo_description: Option<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub marks_and_numbers: Option<Option<String>>,
    #[serde(default)]
    pub gross_weight_kg: Option<f64>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub measurement_cbm: Option<Option<f64>>,
}

/// 字段出现即为 Some，其值为 null 时得到 Some(None)
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl BlDraftPatch {
    pub fn is_empty(&self) -> bool {
        self.shipper.is_none()
            && self.consignee.is_none()
            && self.notify_party.is_none()
            && self.cargo_description.is_none()
            && self.marks_and_numbers.is_none()
            && self.gross_weight_kg.is_none()
            && self.measurement_cbm.is_none()
    }
}

impl AmendableDocument for BlDraft {
    const KIND: DocumentKind = DocumentKind::BlDraft;
    type Patch = BlDraftPatch;

    fn document_id(&self) -> &str {
        &self.bl_draft_id
    }

    fn booking_id(&self) -> &str {
        &self.booking_id
    }

    fn status_code(&self) -> &'static str {
        self.status.as_str()
    }

    fn apply_patch(&mut self, patch: &BlDraftPatch) {
        if let Some(v) = &patch.shipper {
            self.shipper = v.clone();
        }
        if let Some(v) = &patch.consignee {
            self.consignee = v.clone();
        }
        if let Some(v) = &patch.notify_party {
            self.notify_party = v.clone();
        }
        if let Some(v) = &patch.cargo_description {
            self.cargo_description = v.clone();
        }
        if let Some(v) = &patch.marks_and_numbers {
            self.marks_and_numbers = v.clone();
        }
        if let Some(v) = patch.gross_weight_kg {
            self.gross_weight_kg = v;
        }
        if let Some(v) = patch.measurement_cbm {
            self.measurement_cbm = v;
        }
    }

    fn touch(&mut self, now: NaiveDateTime) {
        self.updated_at = now;
    }
}

// ==========================================
// VgmTransmission - VGM 传输
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VgmTransmission {
    pub transmission_id: String,
    pub booking_id: String,
    pub container_no: String,
    pub verified_gross_mass_kg: f64,
    pub weighing_method: WeighingMethod,
    pub authorized_person: String,
    pub status: VgmStatus,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VgmPatch {
    #[serde(default)]
    pub container_no: Option<String>,
    #[serde(default)]
    pub verified_gross_mass_kg: Option<f64>,
    #[serde(default)]
    pub weighing_method: Option<WeighingMethod>,
    #[serde(default)]
    pub authorized_person: Option<String>,
}

impl VgmPatch {
    pub fn is_empty(&self) -> bool {
        self.container_no.is_none()
            && self.verified_gross_mass_kg.is_none()
            && self.weighing_method.is_none()
            && self.authorized_person.is_none()
    }
}

impl AmendableDocument for VgmTransmission {
    const KIND: DocumentKind = DocumentKind::VgmTransmission;
    type Patch = VgmPatch;

    fn document_id(&self) -> &str {
        &self.transmission_id
    }

    fn booking_id(&self) -> &str {
        &self.booking_id
    }

    fn status_code(&self) -> &'static str {
        self.status.as_str()
    }

    fn apply_patch(&mut self, patch: &VgmPatch) {
        if let Some(v) = &patch.container_no {
            self.container_no = v.clone();
        }
        if let Some(v) = patch.verified_gross_mass_kg {
            self.verified_gross_mass_kg = v;
        }
        if let Some(v) = patch.weighing_method {
            self.weighing_method = v;
        }
        if let Some(v) = &patch.authorized_person {
            self.authorized_person = v.clone();
        }
    }

    fn reset_validation_status(&mut self) {
        self.status = VgmStatus::Pending;
    }

    fn touch(&mut self, now: NaiveDateTime) {
        self.updated_at = now;
    }
}

// ==========================================
// CustomsDeclaration - 出口报关单
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomsDeclaration {
    pub declaration_id: String,
    pub booking_id: String,
    pub si_id: String,
    pub declaration_no: String,
    pub hs_code: String,
    pub declared_value_minor: i64,
    pub currency: String,
    pub status: CustomsStatus,
    pub filed_by: String,
    pub filed_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomsPatch {
    #[serde(default)]
    pub hs_code: Option<String>,
    #[serde(default)]
    pub declared_value_minor: Option<i64>,
    #[serde(default)]
    pub currency: Option<String>,
}

impl CustomsPatch {
    pub fn is_empty(&self) -> bool {
        self.hs_code.is_none() && self.declared_value_minor.is_none() && self.currency.is_none()
    }
}

impl AmendableDocument for CustomsDeclaration {
    const KIND: DocumentKind = DocumentKind::CustomsDeclaration;
    type Patch = CustomsPatch;

    fn document_id(&self) -> &str {
        &self.declaration_id
    }

    fn booking_id(&self) -> &str {
        &self.booking_id
    }

    fn status_code(&self) -> &'static str {
        self.status.as_str()
    }

    fn apply_patch(&mut self, patch: &CustomsPatch) {
        if let Some(v) = &patch.hs_code {
            self.hs_code = v.clone();
        }
        if let Some(v) = patch.declared_value_minor {
            self.declared_value_minor = v;
        }
        if let Some(v) = &patch.currency {
            self.currency = v.to_uppercase();
        }
    }

    fn reset_validation_status(&mut self) {
        self.status = CustomsStatus::Filed;
    }

    fn touch(&mut self, now: NaiveDateTime) {
        self.updated_at = now;
    }
}

// ==========================================
// DocumentVersion - 单证版本快照（只追加）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentVersion {
    pub version_id: String,
    pub document_kind: DocumentKind,
    pub document_id: String,
    pub seq_no: i64,
    pub snapshot_kind: SnapshotKind,
    pub snapshot: serde_json::Value,
    pub actor: String,
    pub created_at: NaiveDateTime,
}

impl DocumentVersion {
    /// 将快照还原为强类型单证
    pub fn replay<D: AmendableDocument>(&self) -> Result<D, serde_json::Error> {
        serde_json::from_value(self.snapshot.clone())
    }
}

/// 单次修改结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmendmentOutcome<D> {
    pub document: D,
    pub pre_version_seq: i64,
    pub post_version_seq: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 1)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn vgm() -> VgmTransmission {
        VgmTransmission {
            transmission_id: "T1".to_string(),
            booking_id: "B1".to_string(),
            container_no: "MSKU0000001".to_string(),
            verified_gross_mass_kg: 21_000.0,
            weighing_method: WeighingMethod::Method1,
            authorized_person: "J. Doe".to_string(),
            status: VgmStatus::Accepted,
            updated_at: ts(8),
        }
    }

    #[test]
    fn test_vgm_patch_and_reset() {
        let mut doc = vgm();
        doc.apply_patch(&VgmPatch {
            verified_gross_mass_kg: Some(22_500.0),
            ..Default::default()
        });
        doc.reset_validation_status();

        assert_eq!(doc.verified_gross_mass_kg, 22_500.0);
        assert_eq!(doc.container_no, "MSKU0000001");
        assert_eq!(doc.status, VgmStatus::Pending);
    }

    #[test]
    fn test_bl_draft_has_no_validation_status_reset() {
        let mut draft = BlDraft {
            bl_draft_id: "D1".to_string(),
            booking_id: "B1".to_string(),
            draft_no: "BL-1".to_string(),
            status: BlDraftStatus::Submitted,
            shipper: "ACME".to_string(),
            consignee: "Globex".to_string(),
            notify_party: None,
            cargo_description: "Machinery".to_string(),
            marks_and_numbers: None,
            gross_weight_kg: 10_000.0,
            measurement_cbm: None,
            updated_at: ts(8),
        };
        draft.reset_validation_status();
        assert_eq!(draft.status, BlDraftStatus::Submitted);
    }

    #[test]
    fn test_bl_draft_patch_null_clears_and_absent_keeps() {
        let mut draft = BlDraft {
            bl_draft_id: "D1".to_string(),
            booking_id: "B1".to_string(),
            draft_no: "BL-1".to_string(),
            status: BlDraftStatus::Draft,
            shipper: "ACME".to_string(),
            consignee: "Globex".to_string(),
            notify_party: Some("SAME AS CONSIGNEE".to_string()),
            cargo_description: "Machinery".to_string(),
            marks_and_numbers: Some("N/M".to_string()),
            gross_weight_kg: 10_000.0,
            measurement_cbm: Some(30.5),
            updated_at: ts(8),
        };

        let patch: BlDraftPatch =
            serde_json::from_str(r#"{"notify_party": null, "measurement_cbm": null}"#).unwrap();
        assert_eq!(patch.notify_party, Some(None));
        assert_eq!(patch.marks_and_numbers, None);
        assert!(!patch.is_empty());

        draft.apply_patch(&patch);
        assert_eq!(draft.notify_party, None);
        assert_eq!(draft.measurement_cbm, None);
        assert_eq!(draft.marks_and_numbers.as_deref(), Some("N/M"));

        let patch: BlDraftPatch = serde_json::from_str(r#"{"marks_and_numbers": "PKG 1-20"}"#).unwrap();
        draft.apply_patch(&patch);
        assert_eq!(draft.marks_and_numbers.as_deref(), Some("PKG 1-20"));

        let empty: BlDraftPatch = serde_json::from_str("{}").unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_version_replay_restores_typed_document() {
        let doc = vgm();
        let version = DocumentVersion {
            version_id: "V1".to_string(),
            document_kind: DocumentKind::VgmTransmission,
            document_id: "T1".to_string(),
            seq_no: 1,
            snapshot_kind: SnapshotKind::PreEdit,
            snapshot: serde_json::to_value(&doc).unwrap(),
            actor: "ops".to_string(),
            created_at: ts(9),
        };

        let replayed: VgmTransmission = version.replay().unwrap();
        assert_eq!(replayed, doc);
    }
}
