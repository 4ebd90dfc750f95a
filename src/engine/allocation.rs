// ==========================================
// 订舱履约核心 - 放箱分配引擎
// ==========================================
// 红线: 分配要么全部成功（箱状态迁移 + 放箱单），要么全部失败（零写入）
// 红线: 每个订舱只分配一次；放箱单修改不重新分配、不触碰箱
// ==========================================
// 并发: 所有写事务以 BEGIN IMMEDIATE 开启，选箱前即持有写锁；
//       箱状态更新另以比较交换兜底
// ==========================================

use crate::domain::booking::carrier_demand;
use crate::domain::container::AvailabilityQuery;
use crate::domain::detention::DetentionQuery;
use crate::domain::release_order::{
    AllocationRequest, ContainerReleaseOrder, CroAmendment, CroDocument, CroDocumentInput,
    ReleasedContainer,
};
use crate::engine::detention::DetentionResolver;
use crate::engine::error::{EngineError, EngineResult};
use crate::repository::booking_repo::BookingRepository;
use crate::repository::container_repo::{ContainerRepository, ReservationOutcome};
use crate::repository::error::RepositoryError;
use crate::repository::release_order_repo::ReleaseOrderRepository;
use chrono::NaiveDateTime;
use rusqlite::{Connection, TransactionBehavior};
use std::sync::{Arc, Mutex};
use tracing::{info, instrument, warn};

pub struct AllocationEngine {
    conn: Arc<Mutex<Connection>>,
    booking_repo: BookingRepository,
}

impl AllocationEngine {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        let booking_repo = BookingRepository::new(conn.clone());
        Self { conn, booking_repo }
    }

    fn get_conn(&self) -> EngineResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| EngineError::Repository(RepositoryError::LockError(e.to_string())))
    }

    /// 为订舱分配箱并生成放箱单
    ///
    /// # 步骤
    /// 0. 只读预检: 订舱存在且有承运人箱需求，否则不开启写事务直接返回
    /// 1. 写事务内重新载入订舱与非 SOC 箱需求（同箱型合并）
    /// 2. 解析堆场免费期
    /// 3. 按 FIFO 选箱；任一箱型不足 → InventoryShortfall，整体回滚
    /// 4. 箱 AVAILABLE → ALLOCATED，写入放箱单、箱明细与初始附件，提交
    ///
    /// # 错误
    /// - NotFound: 订舱不存在
    /// - ReleaseOrderExists: 订舱已有放箱单
    /// - Validation: 订舱没有需要承运人放箱的箱需求
    /// - InventoryShortfall: 可用箱不足
    #[instrument(skip(self, request, cro_no_prefix), fields(released_to = %request.released_to_id))]
    pub fn allocate(
        &self,
        booking_id: &str,
        request: &AllocationRequest,
        actor: &str,
        cro_no_prefix: &str,
        now: NaiveDateTime,
    ) -> EngineResult<ContainerReleaseOrder> {
        if self.booking_repo.find_by_id(booking_id)?.is_none() {
            return Err(EngineError::not_found("Booking", booking_id));
        }
        if carrier_demand(&self.booking_repo.list_demand(booking_id)?).is_empty() {
            return Err(no_carrier_demand(booking_id));
        }

        let mut conn = self.get_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let booking = BookingRepository::find_by_id_tx(&tx, booking_id)?
            .ok_or_else(|| EngineError::not_found("Booking", booking_id))?;

        if let Some(existing) = ReleaseOrderRepository::find_by_booking_tx(&tx, booking_id)? {
            return Err(EngineError::ReleaseOrderExists {
                booking_id: booking_id.to_string(),
                cro_no: existing.cro_no,
            });
        }

        let demand = carrier_demand(&BookingRepository::list_demand_tx(&tx, booking_id)?);
        if demand.is_empty() {
            return Err(no_carrier_demand(booking_id));
        }

        let detention =
            DetentionResolver::resolve_tx(&tx, &DetentionQuery::new(&booking.depot_unlocode, now))?;

        let pools: Vec<(AvailabilityQuery, u32)> = demand
            .into_iter()
            .map(|(container_type, qty)| {
                (AvailabilityQuery::new(container_type, booking.depot_unlocode.as_str()), qty)
            })
            .collect();

        let selected = match ContainerRepository::reserve_fifo_tx(&tx, &pools, now)? {
            ReservationOutcome::Reserved(selected) => selected,
            ReservationOutcome::Shortfall {
                query,
                requested,
                available,
            } => {
                warn!(
                    booking_id,
                    container_type = %query.container_type,
                    depot = %query.depot,
                    requested,
                    available,
                    "可用箱不足，放箱分配回滚"
                );
                return Err(EngineError::InventoryShortfall {
                    container_type: query.container_type,
                    depot: query.depot,
                    requested,
                    available,
                });
            }
        };

        let containers: Vec<ReleasedContainer> = selected
            .into_iter()
            .flat_map(|(_, containers)| containers)
            .enumerate()
            .map(|(idx, c)| ReleasedContainer {
                container_id: c.container_id,
                container_no: c.container_no,
                container_type: c.container_type,
                seq_no: idx as i32 + 1,
            })
            .collect();

        let cro = ContainerReleaseOrder {
            cro_id: uuid::Uuid::new_v4().to_string(),
            booking_id: booking.booking_id.clone(),
            cro_no: generate_cro_no(cro_no_prefix, now),
            released_to_type: request.released_to_type,
            released_to_id: request.released_to_id.trim().to_string(),
            depot_unlocode: booking.depot_unlocode.clone(),
            free_days: detention.free_days,
            detention_term_id: detention.term_id,
            containers,
            documents: build_documents(&request.documents),
            created_by: actor.to_string(),
            created_at: now,
            updated_at: now,
        };

        ReleaseOrderRepository::insert_tx(&tx, &cro)?;
        tx.commit()?;

        info!(
            booking_id,
            cro_id = %cro.cro_id,
            cro_no = %cro.cro_no,
            container_count = cro.containers.len(),
            free_days = cro.free_days,
            "放箱分配完成"
        );
        Ok(cro)
    }

    /// 修改放箱单（放箱对象 / 堆场 / 附件整体替换）
    ///
    /// 不重新分配，不触碰箱状态
    pub fn amend(
        &self,
        booking_id: &str,
        patch: &CroAmendment,
        now: NaiveDateTime,
    ) -> EngineResult<ContainerReleaseOrder> {
        if patch.is_empty() {
            return Err(EngineError::Validation("放箱单修改内容为空".to_string()));
        }

        let mut conn = self.get_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let current = ReleaseOrderRepository::find_by_booking_tx(&tx, booking_id)?
            .ok_or_else(|| EngineError::not_found("ContainerReleaseOrder", booking_id))?;

        let released_to_type = patch.released_to_type.unwrap_or(current.released_to_type);
        let released_to_id = patch
            .released_to_id
            .as_deref()
            .map(str::trim)
            .unwrap_or(current.released_to_id.as_str());
        let depot_unlocode = patch
            .depot_unlocode
            .as_deref()
            .map(str::trim)
            .unwrap_or(current.depot_unlocode.as_str());

        ReleaseOrderRepository::update_header_tx(
            &tx,
            &current.cro_id,
            released_to_type,
            released_to_id,
            depot_unlocode,
            now,
        )?;

        if let Some(inputs) = &patch.documents {
            let removed =
                ReleaseOrderRepository::replace_documents_tx(&tx, &current.cro_id, &build_documents(inputs))?;
            info!(
                cro_id = %current.cro_id,
                removed,
                added = inputs.len(),
                "放箱单附件整体替换"
            );
        }

        let updated = ReleaseOrderRepository::find_by_booking_tx(&tx, booking_id)?
            .ok_or_else(|| EngineError::not_found("ContainerReleaseOrder", booking_id))?;
        tx.commit()?;

        info!(booking_id, cro_id = %updated.cro_id, "放箱单已修改");
        Ok(updated)
    }

    /// 查询订舱的放箱单
    pub fn find_by_booking(&self, booking_id: &str) -> EngineResult<ContainerReleaseOrder> {
        let conn = self.get_conn()?;
        ReleaseOrderRepository::find_by_booking_tx(&conn, booking_id)?
            .ok_or_else(|| EngineError::not_found("ContainerReleaseOrder", booking_id))
    }
}

fn no_carrier_demand(booking_id: &str) -> EngineError {
    EngineError::Validation(format!("订舱{}没有需要承运人放箱的箱需求", booking_id))
}

/// 放箱单号: {前缀}-{yyyyMMdd}-{8位随机}
fn generate_cro_no(prefix: &str, now: NaiveDateTime) -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string()[..8].to_uppercase();
    format!("{}-{}-{}", prefix, now.format("%Y%m%d"), suffix)
}

fn build_documents(inputs: &[CroDocumentInput]) -> Vec<CroDocument> {
    inputs
        .iter()
        .enumerate()
        .map(|(idx, input)| CroDocument {
            document_id: uuid::Uuid::new_v4().to_string(),
            document_type: input.document_type.trim().to_string(),
            file_name: input.file_name.trim().to_string(),
            file_ref: input.file_ref.trim().to_string(),
            seq_no: idx as i32 + 1,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_cro_no_format() {
        let now = NaiveDate::from_ymd_opt(2026, 8, 9)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let no = generate_cro_no("CRO", now);
        assert!(no.starts_with("CRO-20260809-"));
        assert_eq!(no.len(), "CRO-20260809-".len() + 8);
    }

    #[test]
    fn test_build_documents_numbers_from_one() {
        let docs = build_documents(&[
            CroDocumentInput {
                document_type: "DO".to_string(),
                file_name: " a.pdf ".to_string(),
                file_ref: "ref-a".to_string(),
            },
            CroDocumentInput {
                document_type: "DO".to_string(),
                file_name: "b.pdf".to_string(),
                file_ref: "ref-b".to_string(),
            },
        ]);
        assert_eq!(docs[0].seq_no, 1);
        assert_eq!(docs[0].file_name, "a.pdf");
        assert_eq!(docs[1].seq_no, 2);
    }
}
