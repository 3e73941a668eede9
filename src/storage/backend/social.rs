//! 收藏与关注
//!
//! 两者都是“切换”语义：先删，删不到再插。插入用 ON CONFLICT DO NOTHING，
//! 并发切换不会产生重复行。

use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::{
    ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, sea_query::OnConflict,
};
use tracing::debug;

use super::converters::model_to_profile;
use super::{SeaOrmStorage, retry};
use crate::errors::Result;
use crate::storage::models::UserProfile;

use migration::entities::{deal_save, follow, user_profile};

impl SeaOrmStorage {
    /// 切换收藏状态，返回切换后是否为已收藏
    pub async fn toggle_save(&self, deal_id: i64, user_id: &str, now: DateTime<Utc>) -> Result<bool> {
        let db = &self.db;

        let removed = retry::with_retry("toggle_save(delete)", self.retry_config, || async {
            deal_save::Entity::delete_many()
                .filter(deal_save::Column::DealId.eq(deal_id))
                .filter(deal_save::Column::UserId.eq(user_id))
                .exec(db)
                .await
        })
        .await?;

        if removed.rows_affected > 0 {
            debug!("Deal {} unsaved by {}", deal_id, user_id);
            return Ok(false);
        }

        retry::with_retry("toggle_save(insert)", self.retry_config, || async {
            deal_save::Entity::insert(deal_save::ActiveModel {
                id: NotSet,
                deal_id: Set(deal_id),
                user_id: Set(user_id.to_string()),
                created_at: Set(now),
            })
            .on_conflict(
                OnConflict::columns([deal_save::Column::DealId, deal_save::Column::UserId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(db)
            .await
        })
        .await?;

        debug!("Deal {} saved by {}", deal_id, user_id);
        Ok(true)
    }

    pub async fn is_saved(&self, deal_id: i64, user_id: &str) -> Result<bool> {
        let count = deal_save::Entity::find()
            .filter(deal_save::Column::DealId.eq(deal_id))
            .filter(deal_save::Column::UserId.eq(user_id))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    /// 切换关注状态，返回切换后是否为已关注
    pub async fn toggle_follow(&self, promoter_id: &str, follower_id: &str) -> Result<bool> {
        let db = &self.db;

        let removed = follow::Entity::delete_many()
            .filter(follow::Column::PromoterId.eq(promoter_id))
            .filter(follow::Column::FollowerId.eq(follower_id))
            .exec(db)
            .await?;

        if removed.rows_affected > 0 {
            return Ok(false);
        }

        follow::Entity::insert(follow::ActiveModel {
            id: NotSet,
            promoter_id: Set(promoter_id.to_string()),
            follower_id: Set(follower_id.to_string()),
            created_at: Set(Utc::now()),
        })
        .on_conflict(
            OnConflict::columns([follow::Column::PromoterId, follow::Column::FollowerId])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

        Ok(true)
    }

    pub async fn follower_count(&self, promoter_id: &str) -> Result<u64> {
        let count = follow::Entity::find()
            .filter(follow::Column::PromoterId.eq(promoter_id))
            .count(&self.db)
            .await?;
        Ok(count)
    }

    pub async fn following_count(&self, follower_id: &str) -> Result<u64> {
        let count = follow::Entity::find()
            .filter(follow::Column::FollowerId.eq(follower_id))
            .count(&self.db)
            .await?;
        Ok(count)
    }

    /// 关注者资料（最近关注在前）
    pub async fn list_followers(&self, promoter_id: &str) -> Result<Vec<UserProfile>> {
        let follower_ids: Vec<String> = follow::Entity::find()
            .filter(follow::Column::PromoterId.eq(promoter_id))
            .order_by_desc(follow::Column::CreatedAt)
            .all(&self.db)
            .await?
            .into_iter()
            .map(|f| f.follower_id)
            .collect();

        if follower_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut profiles: Vec<UserProfile> = user_profile::Entity::find()
            .filter(user_profile::Column::Id.is_in(follower_ids.iter().cloned()))
            .all(&self.db)
            .await?
            .into_iter()
            .map(model_to_profile)
            .collect();

        profiles.sort_by_key(|p| follower_ids.iter().position(|id| *id == p.id));
        Ok(profiles)
    }
}
