// ==========================================
// 订舱履约核心 - 放箱单 API
// ==========================================
// 职责: 放箱分配、放箱单修改与查询、堆场免费期查询；写操作成功后写操作日志
// ==========================================

use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::api::{record_action, require_id, validator};
use crate::config::FulfillmentConfigReader;
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::detention::ResolvedDetention;
use crate::domain::release_order::{AllocationRequest, ContainerReleaseOrder, CroAmendment};
use crate::engine::allocation::AllocationEngine;
use crate::engine::detention::DetentionResolver;
use crate::repository::action_log_repo::ActionLogRepository;
use serde_json::json;

/// 放箱单API
pub struct CroApi {
    allocation_engine: Arc<AllocationEngine>,
    detention_resolver: Arc<DetentionResolver>,
    config: Arc<dyn FulfillmentConfigReader>,
    action_log_repo: Arc<ActionLogRepository>,
}

impl CroApi {
    pub fn new(
        allocation_engine: Arc<AllocationEngine>,
        detention_resolver: Arc<DetentionResolver>,
        config: Arc<dyn FulfillmentConfigReader>,
        action_log_repo: Arc<ActionLogRepository>,
    ) -> Self {
        Self {
            allocation_engine,
            detention_resolver,
            config,
            action_log_repo,
        }
    }

    /// 放箱分配
    ///
    /// # 返回
    /// - Ok(ContainerReleaseOrder): 新放箱单（含分配的箱，按选箱顺序）
    /// - Err(ApiError): 422 请求不合法 / 404 订舱不存在 / 409 库存不足或已有放箱单
    pub fn allocate_release_order(
        &self,
        booking_id: &str,
        request: &AllocationRequest,
        actor: &str,
    ) -> ApiResult<ContainerReleaseOrder> {
        require_id("booking_id", booking_id)?;
        validator::validate_allocation_request(request)?;

        let prefix = self.config.get_cro_no_prefix()?;
        let now = chrono::Utc::now().naive_utc();
        let cro = self
            .allocation_engine
            .allocate(booking_id, request, actor, &prefix, now)?;

        record_action(
            &self.action_log_repo,
            ActionLog::new(
                booking_id,
                ActionType::AllocateRelease,
                actor,
                Some(json!({
                    "cro_no": cro.cro_no,
                    "container_ids": cro.container_ids(),
                    "free_days": cro.free_days,
                    "detention_term_id": cro.detention_term_id,
                })),
                format!("放箱分配: {}个箱", cro.containers.len()),
            ),
        );

        Ok(cro)
    }

    /// 修改放箱单
    pub fn amend_release_order(
        &self,
        booking_id: &str,
        patch: &CroAmendment,
        actor: &str,
    ) -> ApiResult<ContainerReleaseOrder> {
        require_id("booking_id", booking_id)?;
        validator::validate_cro_amendment(patch)?;

        let now = chrono::Utc::now().naive_utc();
        let cro = self.allocation_engine.amend(booking_id, patch, now)?;

        record_action(
            &self.action_log_repo,
            ActionLog::new(
                booking_id,
                ActionType::AmendRelease,
                actor,
                Some(json!({
                    "cro_no": cro.cro_no,
                    "documents_replaced": patch.documents.is_some(),
                })),
                "修改放箱单",
            ),
        );

        Ok(cro)
    }

    /// 查询放箱单
    pub fn get_release_order(&self, booking_id: &str) -> ApiResult<ContainerReleaseOrder> {
        if booking_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("订舱ID不能为空".to_string()));
        }
        Ok(self.allocation_engine.find_by_booking(booking_id)?)
    }

    /// 查询堆场当前生效的免费期（只读，与放箱分配同一择优规则）
    pub fn effective_detention(&self, depot_unlocode: &str) -> ApiResult<ResolvedDetention> {
        require_id("depot", depot_unlocode)?;
        let now = chrono::Utc::now().naive_utc();
        Ok(self.detention_resolver.resolve(depot_unlocode.trim(), now)?)
    }
}
