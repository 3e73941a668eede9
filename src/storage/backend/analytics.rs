//! 分析事件写入与统计查询
//!
//! view 事件的去重由 deal_view_marks 上的条件 upsert 完成：
//!
//! ```sql
//! INSERT INTO deal_view_marks (deal_id, viewer_key, last_viewed_at) VALUES (?, ?, ?)
//! ON CONFLICT (deal_id, viewer_key) DO UPDATE
//!   SET last_viewed_at = excluded.last_viewed_at
//!   WHERE deal_view_marks.last_viewed_at < ?   -- 窗口起点
//! ```
//!
//! 影响行数为 1 表示本次浏览计入统计，随后在同一事务内写入事件行。

use chrono::{DateTime, Duration, Utc};
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ExprTrait, FromQueryResult, PaginatorTrait,
    QueryFilter, QuerySelect, TransactionTrait,
    sea_query::{Expr, OnConflict},
};
use tracing::trace;

use super::{SeaOrmStorage, retry};
use crate::errors::{DealdropError, Result};
use crate::storage::models::{EventType, NewEvent};

use migration::entities::{deal_analytics, deal_view_mark};

/// 按 (deal, 事件类型) 分组的计数行
#[derive(Debug, FromQueryResult)]
pub struct EventCountRow {
    pub deal_id: i64,
    pub event_type: String,
    pub count: i64,
}

fn event_to_active_model(event: &NewEvent) -> deal_analytics::ActiveModel {
    deal_analytics::ActiveModel {
        id: NotSet,
        deal_id: Set(event.deal_id),
        event_type: Set(event.event_type.as_ref().to_string()),
        user_id: Set(event.user_id.clone()),
        session_id: Set(event.session_id.clone()),
        user_agent: Set(event.user_agent.clone()),
        created_at: Set(event.created_at),
    }
}

impl SeaOrmStorage {
    /// 追加一条事件（click / share / save）
    pub async fn insert_event(&self, event: &NewEvent) -> Result<()> {
        let db = &self.db;
        retry::with_retry("insert_event", self.retry_config, || async {
            event_to_active_model(event).insert(db).await
        })
        .await?;
        Ok(())
    }

    /// 在去重窗口内记录一次浏览
    ///
    /// 返回 `true` 表示写入了新的 view 事件，`false` 表示窗口内已记录过。
    pub async fn record_view(&self, event: &NewEvent, window: Duration) -> Result<bool> {
        let viewer_key = event.viewer_key().ok_or_else(|| {
            DealdropError::validation("A view needs a signed-in user or a session id")
        })?;
        let cutoff = event.created_at - window;
        let db = &self.db;

        let recorded = retry::with_retry("record_view", self.retry_config, || async {
            let txn = db.begin().await?;

            let affected = deal_view_mark::Entity::insert(deal_view_mark::ActiveModel {
                id: NotSet,
                deal_id: Set(event.deal_id),
                viewer_key: Set(viewer_key.clone()),
                last_viewed_at: Set(event.created_at),
            })
            .on_conflict(
                OnConflict::columns([
                    deal_view_mark::Column::DealId,
                    deal_view_mark::Column::ViewerKey,
                ])
                .update_column(deal_view_mark::Column::LastViewedAt)
                .action_and_where(
                    Expr::col((deal_view_mark::Entity, deal_view_mark::Column::LastViewedAt))
                        .lt(cutoff),
                )
                .to_owned(),
            )
            .exec_without_returning(&txn)
            .await?;

            if affected == 0 {
                txn.rollback().await?;
                return Ok(false);
            }

            event_to_active_model(event).insert(&txn).await?;
            txn.commit().await?;
            Ok(true)
        })
        .await?;

        trace!(
            "View on deal {} by {}: recorded={}",
            event.deal_id, viewer_key, recorded
        );
        Ok(recorded)
    }

    /// 单个 deal 某类事件的总数
    pub async fn count_events(&self, deal_id: i64, event_type: EventType) -> Result<u64> {
        let count = deal_analytics::Entity::find()
            .filter(deal_analytics::Column::DealId.eq(deal_id))
            .filter(deal_analytics::Column::EventType.eq(event_type.as_ref()))
            .count(&self.db)
            .await?;
        Ok(count)
    }

    /// 多个 deal 在 since 之后的事件计数（按 deal、事件类型分组）
    pub async fn event_counts_since(
        &self,
        deal_ids: &[i64],
        since: DateTime<Utc>,
    ) -> Result<Vec<EventCountRow>> {
        if deal_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = deal_analytics::Entity::find()
            .select_only()
            .column(deal_analytics::Column::DealId)
            .column(deal_analytics::Column::EventType)
            .column_as(deal_analytics::Column::Id.count(), "count")
            .filter(deal_analytics::Column::DealId.is_in(deal_ids.iter().copied()))
            .filter(deal_analytics::Column::CreatedAt.gte(since))
            .group_by(deal_analytics::Column::DealId)
            .group_by(deal_analytics::Column::EventType)
            .into_model::<EventCountRow>()
            .all(&self.db)
            .await?;
        Ok(rows)
    }
}
