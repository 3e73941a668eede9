//! 投票 / 已使用标记 / 评论 / 分享
//!
//! deal_interactions 以 (deal_id, user_id) 唯一索引为冲突目标做 upsert，
//! 每个用户每个 deal 至多一行。

use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
    sea_query::{Expr, OnConflict},
};
use tracing::debug;

use super::converters::model_to_comment;
use super::{SeaOrmStorage, retry};
use crate::errors::{DealdropError, Result};
use crate::storage::models::{Comment, InteractionState};

use migration::entities::{deal_comment, deal_interaction, deal_share};

impl SeaOrmStorage {
    /// 切换有用/没用投票
    ///
    /// 与已有投票相同的值视为撤销，`None` 直接撤销。判断与写入在同一条
    /// upsert 中完成，并发的重复投票不会互相覆盖。
    pub async fn toggle_helpful(
        &self,
        deal_id: i64,
        user_id: &str,
        is_helpful: Option<bool>,
    ) -> Result<InteractionState> {
        let now = Utc::now();
        let db = &self.db;

        retry::with_retry("toggle_helpful", self.retry_config, || async {
            let model = new_interaction(deal_id, user_id, now, is_helpful, false);
            deal_interaction::Entity::insert(model)
                .on_conflict(
                    OnConflict::columns([
                        deal_interaction::Column::DealId,
                        deal_interaction::Column::UserId,
                    ])
                    .value(
                        deal_interaction::Column::IsHelpful,
                        Expr::cust(
                            "CASE WHEN deal_interactions.is_helpful = excluded.is_helpful \
                             THEN NULL ELSE excluded.is_helpful END",
                        ),
                    )
                    .update_column(deal_interaction::Column::UpdatedAt)
                    .to_owned(),
                )
                .exec_without_returning(db)
                .await
        })
        .await?;

        let state = self.interaction_state(deal_id, user_id).await?;
        debug!(
            "Helpful vote toggled: deal={}, user={}, requested={:?}, now={:?}",
            deal_id, user_id, is_helpful, state.is_helpful
        );
        Ok(state)
    }

    /// 设置“已使用”标记
    pub async fn upsert_used(
        &self,
        deal_id: i64,
        user_id: &str,
        is_used: bool,
    ) -> Result<InteractionState> {
        let now = Utc::now();
        let db = &self.db;

        retry::with_retry("upsert_used", self.retry_config, || async {
            let model = new_interaction(deal_id, user_id, now, None, is_used);
            deal_interaction::Entity::insert(model)
                .on_conflict(
                    OnConflict::columns([
                        deal_interaction::Column::DealId,
                        deal_interaction::Column::UserId,
                    ])
                    .update_columns([
                        deal_interaction::Column::IsUsed,
                        deal_interaction::Column::UpdatedAt,
                    ])
                    .to_owned(),
                )
                .exec_without_returning(db)
                .await
        })
        .await?;

        self.interaction_state(deal_id, user_id).await
    }

    pub async fn interaction_state(&self, deal_id: i64, user_id: &str) -> Result<InteractionState> {
        let model = deal_interaction::Entity::find()
            .filter(deal_interaction::Column::DealId.eq(deal_id))
            .filter(deal_interaction::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?;

        Ok(model
            .map(|m| InteractionState {
                is_helpful: m.is_helpful,
                is_used: m.is_used,
            })
            .unwrap_or_default())
    }

    pub async fn insert_comment(&self, deal_id: i64, user_id: &str, content: &str) -> Result<Comment> {
        let model = deal_comment::ActiveModel {
            id: NotSet,
            deal_id: Set(deal_id),
            user_id: Set(user_id.to_string()),
            content: Set(content.to_string()),
            created_at: Set(Utc::now()),
        }
        .insert(&self.db)
        .await?;
        Ok(model_to_comment(model))
    }

    /// 某个 deal 的评论（最新在前），返回 (评论, 总数)
    pub async fn list_comments(
        &self,
        deal_id: i64,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<Comment>, u64)> {
        let total = deal_comment::Entity::find()
            .filter(deal_comment::Column::DealId.eq(deal_id))
            .count(&self.db)
            .await?;

        let models = deal_comment::Entity::find()
            .filter(deal_comment::Column::DealId.eq(deal_id))
            .order_by_desc(deal_comment::Column::CreatedAt)
            .order_by_desc(deal_comment::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(&self.db)
            .await?;

        Ok((models.into_iter().map(model_to_comment).collect(), total))
    }

    /// 删除评论；只有作者本人可以删除
    pub async fn delete_comment(&self, comment_id: i64, user_id: &str) -> Result<()> {
        let comment = deal_comment::Entity::find_by_id(comment_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| DealdropError::not_found(format!("Comment {} not found", comment_id)))?;

        if comment.user_id != user_id {
            return Err(DealdropError::forbidden("Only the author can delete this comment"));
        }

        deal_comment::Entity::delete_by_id(comment_id)
            .exec(&self.db)
            .await?;
        Ok(())
    }

    pub async fn insert_share(
        &self,
        deal_id: i64,
        user_id: Option<&str>,
        platform: &str,
        now: DateTime<Utc>,
    ) -> Result<()> {
        deal_share::ActiveModel {
            id: NotSet,
            deal_id: Set(deal_id),
            user_id: Set(user_id.map(str::to_string)),
            platform: Set(platform.to_string()),
            created_at: Set(now),
        }
        .insert(&self.db)
        .await?;
        Ok(())
    }
}

fn new_interaction(
    deal_id: i64,
    user_id: &str,
    now: DateTime<Utc>,
    is_helpful: Option<bool>,
    is_used: bool,
) -> deal_interaction::ActiveModel {
    deal_interaction::ActiveModel {
        id: NotSet,
        deal_id: Set(deal_id),
        user_id: Set(user_id.to_string()),
        is_helpful: Set(is_helpful),
        is_used: Set(is_used),
        created_at: Set(now),
        updated_at: Set(now),
    }
}
