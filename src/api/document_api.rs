// ==========================================
// 订舱履约核心 - 单证修订 API
// ==========================================
// 职责: 提单草稿 / VGM / 出口报关单的修订与版本历史查询
// ==========================================

use std::sync::Arc;

use crate::api::error::ApiResult;
use crate::api::{record_action, require_id, validator};
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::document::{
    AmendableDocument, AmendmentOutcome, BlDraft, BlDraftPatch, CustomsDeclaration, CustomsPatch,
    DocumentVersion, VgmPatch, VgmTransmission,
};
use crate::domain::types::DocumentKind;
use crate::engine::document_amendment::DocumentAmendmentEngine;
use crate::repository::action_log_repo::ActionLogRepository;
use crate::repository::document_repo::DocumentStore;
use serde_json::json;

/// 单证修订API
pub struct DocumentApi {
    amendment_engine: Arc<DocumentAmendmentEngine>,
    action_log_repo: Arc<ActionLogRepository>,
}

impl DocumentApi {
    pub fn new(
        amendment_engine: Arc<DocumentAmendmentEngine>,
        action_log_repo: Arc<ActionLogRepository>,
    ) -> Self {
        Self {
            amendment_engine,
            action_log_repo,
        }
    }

    pub fn amend_bl_draft(
        &self,
        booking_id: &str,
        draft_id: &str,
        patch: &BlDraftPatch,
        actor: &str,
    ) -> ApiResult<AmendmentOutcome<BlDraft>> {
        validator::validate_bl_draft_patch(patch)?;
        self.amend::<BlDraft>(booking_id, draft_id, patch, actor)
    }

    /// 修订 VGM；成功后状态复位为 PENDING
    pub fn amend_vgm(
        &self,
        booking_id: &str,
        transmission_id: &str,
        patch: &VgmPatch,
        actor: &str,
    ) -> ApiResult<AmendmentOutcome<VgmTransmission>> {
        validator::validate_vgm_patch(patch)?;
        self.amend::<VgmTransmission>(booking_id, transmission_id, patch, actor)
    }

    /// 修订出口报关单；成功后状态复位为 FILED
    pub fn amend_customs_declaration(
        &self,
        booking_id: &str,
        declaration_id: &str,
        patch: &CustomsPatch,
        actor: &str,
    ) -> ApiResult<AmendmentOutcome<CustomsDeclaration>> {
        validator::validate_customs_patch(patch)?;
        self.amend::<CustomsDeclaration>(booking_id, declaration_id, patch, actor)
    }

    /// 单证版本历史
    pub fn document_history(
        &self,
        kind: DocumentKind,
        document_id: &str,
    ) -> ApiResult<Vec<DocumentVersion>> {
        require_id("document_id", document_id)?;
        Ok(self.amendment_engine.history(kind, document_id)?)
    }

    fn amend<D: DocumentStore>(
        &self,
        booking_id: &str,
        document_id: &str,
        patch: &D::Patch,
        actor: &str,
    ) -> ApiResult<AmendmentOutcome<D>> {
        require_id("booking_id", booking_id)?;
        require_id("document_id", document_id)?;

        let now = chrono::Utc::now().naive_utc();
        let outcome = self
            .amendment_engine
            .amend::<D>(booking_id, document_id, patch, actor, now)?;

        record_action(
            &self.action_log_repo,
            ActionLog::new(
                booking_id,
                ActionType::AmendDocument,
                actor,
                Some(json!({
                    "document_kind": D::KIND,
                    "document_id": outcome.document.document_id(),
                    "pre_version_seq": outcome.pre_version_seq,
                    "post_version_seq": outcome.post_version_seq,
                })),
                format!("修订{}", D::KIND),
            ),
        );

        Ok(outcome)
    }
}
