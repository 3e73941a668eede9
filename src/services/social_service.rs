//! 投票、使用标记、评论、分享、收藏与关注

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};
use tracing::info;

use super::analytics_service::{AnalyticsService, EventContext};
use crate::errors::{DealdropError, Result};
use crate::storage::{Comment, EventType, InteractionState, SeaOrmStorage, UserProfile, UserType};

pub const COMMENT_MAX_LEN: usize = 1000;
pub const DEFAULT_COMMENT_PAGE_SIZE: u64 = 20;

/// 分享渠道；未知渠道归为 `other`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum SharePlatform {
    Whatsapp,
    Facebook,
    Twitter,
    Telegram,
    Email,
    CopyLink,
    Other,
}

impl SharePlatform {
    pub fn parse_lenient(input: &str) -> Self {
        input.trim().parse().unwrap_or(SharePlatform::Other)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentPage {
    pub comments: Vec<Comment>,
    pub page: u64,
    pub page_size: u64,
    pub total: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SaveToggle {
    pub saved: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct FollowToggle {
    pub following: bool,
    pub follower_count: u64,
}

pub struct SocialService {
    storage: Arc<SeaOrmStorage>,
    analytics: Arc<AnalyticsService>,
}

impl SocialService {
    pub fn new(storage: Arc<SeaOrmStorage>, analytics: Arc<AnalyticsService>) -> Self {
        Self { storage, analytics }
    }

    async fn ensure_deal(&self, deal_id: i64) -> Result<()> {
        match self.storage.find_deal(deal_id).await? {
            Some(_) => Ok(()),
            None => Err(DealdropError::not_found(format!(
                "Deal {} not found",
                deal_id
            ))),
        }
    }

    /// 设置有用/没用投票；再次提交相同的值视为撤销
    pub async fn set_helpful(
        &self,
        deal_id: i64,
        user_id: &str,
        helpful: Option<bool>,
    ) -> Result<InteractionState> {
        self.ensure_deal(deal_id).await?;
        self.storage.toggle_helpful(deal_id, user_id, helpful).await
    }

    pub async fn mark_used(
        &self,
        deal_id: i64,
        user_id: &str,
        used: bool,
    ) -> Result<InteractionState> {
        self.ensure_deal(deal_id).await?;
        self.storage.upsert_used(deal_id, user_id, used).await
    }

    pub async fn add_comment(&self, deal_id: i64, user_id: &str, content: &str) -> Result<Comment> {
        let content = content.trim();
        if content.is_empty() {
            return Err(DealdropError::validation("Comment cannot be empty"));
        }
        if content.chars().count() > COMMENT_MAX_LEN {
            return Err(DealdropError::validation(format!(
                "Comment must be at most {} characters",
                COMMENT_MAX_LEN
            )));
        }

        self.ensure_deal(deal_id).await?;
        self.storage.insert_comment(deal_id, user_id, content).await
    }

    pub async fn list_comments(
        &self,
        deal_id: i64,
        page: Option<u64>,
        page_size: Option<u64>,
    ) -> Result<CommentPage> {
        let page = page.unwrap_or(1).max(1);
        let page_size = page_size.unwrap_or(DEFAULT_COMMENT_PAGE_SIZE).clamp(1, 100);

        let (comments, total) = self
            .storage
            .list_comments(deal_id, (page - 1) * page_size, page_size)
            .await?;

        Ok(CommentPage {
            comments,
            page,
            page_size,
            total,
        })
    }

    pub async fn delete_comment(&self, comment_id: i64, user_id: &str) -> Result<()> {
        self.storage.delete_comment(comment_id, user_id).await?;
        info!("Comment {} deleted by {}", comment_id, user_id);
        Ok(())
    }

    /// 记录分享，同时追加一条 share 事件
    pub async fn share(
        &self,
        deal_id: i64,
        platform: SharePlatform,
        ctx: &EventContext,
    ) -> Result<()> {
        self.ensure_deal(deal_id).await?;
        self.storage
            .insert_share(deal_id, ctx.user_id.as_deref(), platform.as_ref(), Utc::now())
            .await?;

        self.analytics
            .record_event_quietly(deal_id, EventType::Share, ctx)
            .await;
        Ok(())
    }

    /// 切换收藏；收藏时追加一条 save 事件
    pub async fn toggle_save(&self, deal_id: i64, ctx: &EventContext) -> Result<SaveToggle> {
        let user_id = ctx
            .user_id
            .as_deref()
            .ok_or_else(|| DealdropError::unauthorized("Sign in to save deals"))?;

        self.ensure_deal(deal_id).await?;
        let saved = self.storage.toggle_save(deal_id, user_id, Utc::now()).await?;

        if saved {
            self.analytics
                .record_event_quietly(deal_id, EventType::Save, ctx)
                .await;
        }
        Ok(SaveToggle { saved })
    }

    /// 切换关注；不能关注自己，目标必须是推广者
    pub async fn toggle_follow(&self, promoter_id: &str, follower_id: &str) -> Result<FollowToggle> {
        if promoter_id == follower_id {
            return Err(DealdropError::validation("You cannot follow yourself"));
        }

        let promoter = self
            .storage
            .find_profile(promoter_id)
            .await?
            .ok_or_else(|| DealdropError::not_found(format!("Profile {} not found", promoter_id)))?;
        if promoter.user_type != UserType::Promoter {
            return Err(DealdropError::validation("Only promoters can be followed"));
        }

        let following = self.storage.toggle_follow(promoter_id, follower_id).await?;
        let follower_count = self.storage.follower_count(promoter_id).await?;

        info!(
            "{} {} promoter {}",
            follower_id,
            if following { "followed" } else { "unfollowed" },
            promoter_id
        );
        Ok(FollowToggle {
            following,
            follower_count,
        })
    }

    pub async fn list_followers(&self, promoter_id: &str) -> Result<Vec<UserProfile>> {
        self.storage.list_followers(promoter_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_share_platform_parse() {
        assert_eq!(SharePlatform::parse_lenient("whatsapp"), SharePlatform::Whatsapp);
        assert_eq!(SharePlatform::parse_lenient("Copy_Link"), SharePlatform::CopyLink);
        assert_eq!(SharePlatform::parse_lenient("myspace"), SharePlatform::Other);
        assert_eq!(SharePlatform::CopyLink.as_ref(), "copy_link");
    }
}
