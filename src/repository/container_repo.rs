// ==========================================
// 订舱履约核心 - 箱库存数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 红线: 箱型+堆场池的“选箱+状态迁移”只通过 reserve_fifo_tx 完成
// ==========================================
// 并发控制: 调用方必须在 BEGIN IMMEDIATE 事务内调用 *_tx 写方法；
// 状态更新额外以 WHERE status='AVAILABLE' 做比较交换
// ==========================================

use crate::domain::container::{AvailabilityQuery, Container};
use crate::domain::types::ContainerStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::row_utils::{fmt_ts, get_enum, get_opt_ts, get_ts};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Row, Transaction};

const CONTAINER_COLUMNS: &str = r#"container_id, container_no, container_type, status,
       current_depot, last_used_at, updated_at"#;

// ==========================================
// ReservationOutcome - 批量预留结果
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub enum ReservationOutcome {
    /// 全部满足，按需求顺序返回每个池选中的箱（池内按 FIFO 顺序）
    Reserved(Vec<(AvailabilityQuery, Vec<Container>)>),
    /// 某个池不足；未做任何写入
    Shortfall {
        query: AvailabilityQuery,
        requested: u32,
        available: u32,
    },
}

// ==========================================
// ContainerRepository - 箱库存仓储
// ==========================================
pub struct ContainerRepository;

impl ContainerRepository {
    // ==========================================
    // 事务内操作
    // ==========================================

    /// 按 FIFO 选出至多 limit 个可用箱
    ///
    /// 排序: last_used_at 升序（NULL 视为从未使用，最先选出），箱号升序兜底保证确定性
    pub fn select_available_fifo_tx(
        conn: &Connection,
        query: &AvailabilityQuery,
        limit: u32,
    ) -> RepositoryResult<Vec<Container>> {
        let sql = format!(
            r#"SELECT {} FROM container
               WHERE container_type = ?1 AND current_depot = ?2 AND status = 'AVAILABLE'
               ORDER BY last_used_at IS NOT NULL, last_used_at ASC, container_no ASC
               LIMIT ?3"#,
            CONTAINER_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let containers = stmt
            .query_map(
                params![query.container_type, query.depot, limit as i64],
                map_row,
            )?
            .collect::<Result<Vec<Container>, _>>()?;
        Ok(containers)
    }

    /// AVAILABLE -> ALLOCATED 比较交换
    ///
    /// 影响行数不为 1 即视为并发冲突
    pub fn mark_allocated_tx(
        tx: &Transaction,
        container_id: &str,
        now: NaiveDateTime,
    ) -> RepositoryResult<()> {
        let affected = tx.execute(
            r#"UPDATE container SET status = 'ALLOCATED', updated_at = ?2
               WHERE container_id = ?1 AND status = 'AVAILABLE'"#,
            params![container_id, fmt_ts(now)],
        )?;
        if affected != 1 {
            return Err(RepositoryError::CompareAndSwapFailed {
                entity: "Container".to_string(),
                id: container_id.to_string(),
                expected: ContainerStatus::Available.as_str().to_string(),
            });
        }
        Ok(())
    }

    /// 批量预留（选箱 + 状态迁移）
    ///
    /// # 步骤
    /// 1. 对每个池按 FIFO 选箱；任一池不足立即返回 Shortfall，不做任何写入
    /// 2. 全部满足后逐个比较交换为 ALLOCATED
    ///
    /// # 红线
    /// - 必须在 BEGIN IMMEDIATE 事务中调用，确保选箱与迁移之间无其他写者
    pub fn reserve_fifo_tx(
        tx: &Transaction,
        demands: &[(AvailabilityQuery, u32)],
        now: NaiveDateTime,
    ) -> RepositoryResult<ReservationOutcome> {
        let mut selected = Vec::with_capacity(demands.len());

        for (query, requested) in demands {
            let candidates = Self::select_available_fifo_tx(tx, query, *requested)?;
            if (candidates.len() as u32) < *requested {
                return Ok(ReservationOutcome::Shortfall {
                    query: query.clone(),
                    requested: *requested,
                    available: candidates.len() as u32,
                });
            }
            selected.push((query.clone(), candidates));
        }

        for (_, containers) in selected.iter_mut() {
            for container in containers.iter_mut() {
                Self::mark_allocated_tx(tx, &container.container_id, now)?;
                container.status = ContainerStatus::Allocated;
                container.updated_at = now;
            }
        }

        Ok(ReservationOutcome::Reserved(selected))
    }
}

/// 映射数据库行到Container对象
fn map_row(row: &Row) -> rusqlite::Result<Container> {
    Ok(Container {
        container_id: row.get(0)?,
        container_no: row.get(1)?,
        container_type: row.get(2)?,
        status: get_enum(row, 3, ContainerStatus::parse)?,
        current_depot: row.get(4)?,
        last_used_at: get_opt_ts(row, 5)?,
        updated_at: get_ts(row, 6)?,
    })
}
