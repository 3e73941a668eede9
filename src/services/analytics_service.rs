//! Analytics service layer
//!
//! 事件写入与推广者汇总。
//!
//! - view：按 viewer key（`user:<id>` / `session:<id>`）在滚动窗口内去重，
//!   去重由存储层的条件 upsert 原子完成
//! - click / share / save：只追加，不去重

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::profile_service::require_promoter;
use crate::config::get_config;
use crate::errors::{DealdropError, Result};
use crate::storage::{EventCounts, EventType, NewEvent, SeaOrmStorage};

pub const DEFAULT_SUMMARY_DAYS: i64 = 30;
pub const MAX_SUMMARY_DAYS: i64 = 365;

// ============ 公共类型定义 ============

/// 事件来源：登录用户、匿名会话与 UA
#[derive(Debug, Clone, Default)]
pub struct EventContext {
    pub user_id: Option<String>,
    pub session_id: Option<String>,
    pub user_agent: Option<String>,
}

/// 单个 deal 的统计
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DealStats {
    pub deal_id: i64,
    pub title: String,
    #[serde(flatten)]
    pub counts: EventCounts,
    pub helpful_votes: u64,
    pub not_helpful_votes: u64,
}

/// 推广者汇总
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PromoterSummary {
    pub promoter_id: String,
    pub days: i64,
    pub since: DateTime<Utc>,
    pub totals: EventCounts,
    pub follower_count: u64,
    pub helpful_votes: u64,
    pub not_helpful_votes: u64,
    pub deals: Vec<DealStats>,
}

// ============ AnalyticsService ============

pub struct AnalyticsService {
    storage: Arc<SeaOrmStorage>,
}

impl AnalyticsService {
    pub fn new(storage: Arc<SeaOrmStorage>) -> Self {
        Self { storage }
    }

    fn dedup_window() -> Duration {
        let hours = get_config().analytics.view_dedup_window_hours.max(1);
        Duration::hours(hours as i64)
    }

    /// 记录一次事件；返回是否写入（窗口内重复的 view 返回 false）
    pub async fn record_event(
        &self,
        deal_id: i64,
        event_type: EventType,
        ctx: &EventContext,
    ) -> Result<bool> {
        self.record_event_at(deal_id, event_type, ctx, Utc::now())
            .await
    }

    pub async fn record_event_at(
        &self,
        deal_id: i64,
        event_type: EventType,
        ctx: &EventContext,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        if self.storage.find_deal(deal_id).await?.is_none() {
            return Err(DealdropError::not_found(format!(
                "Deal {} not found",
                deal_id
            )));
        }

        let event = NewEvent {
            deal_id,
            event_type,
            user_id: ctx.user_id.clone(),
            session_id: ctx.session_id.clone(),
            user_agent: ctx.user_agent.clone(),
            created_at: now,
        };

        match event_type {
            EventType::View => self.storage.record_view(&event, Self::dedup_window()).await,
            _ => {
                self.storage.insert_event(&event).await?;
                debug!("Recorded {} on deal {}", event_type, deal_id);
                Ok(true)
            }
        }
    }

    /// 记录事件但不向调用方暴露失败
    pub async fn record_event_quietly(
        &self,
        deal_id: i64,
        event_type: EventType,
        ctx: &EventContext,
    ) -> bool {
        match self.record_event(deal_id, event_type, ctx).await {
            Ok(recorded) => recorded,
            Err(e) => {
                warn!(
                    "Failed to record {} event for deal {}: {}",
                    event_type, deal_id, e
                );
                false
            }
        }
    }

    /// 推广者在最近 `days` 天内的事件汇总
    pub async fn promoter_summary(
        &self,
        user_id: &str,
        days: Option<i64>,
    ) -> Result<PromoterSummary> {
        let promoter = require_promoter(&self.storage, user_id).await?;
        let days = days
            .unwrap_or(DEFAULT_SUMMARY_DAYS)
            .clamp(1, MAX_SUMMARY_DAYS);
        let since = Utc::now() - Duration::days(days);

        let deals = self.storage.promoter_deal_ids(&promoter.id).await?;
        let ids: Vec<i64> = deals.iter().map(|(id, _)| *id).collect();

        let mut counts: HashMap<i64, EventCounts> = HashMap::new();
        for row in self.storage.event_counts_since(&ids, since).await? {
            let Ok(event_type) = EventType::from_str(&row.event_type) else {
                warn!("Unknown event type in analytics: {}", row.event_type);
                continue;
            };
            counts
                .entry(row.deal_id)
                .or_default()
                .add(event_type, row.count.max(0) as u64);
        }

        let votes = self.storage.vote_counts(&ids).await?;

        let mut totals = EventCounts::default();
        let mut helpful_votes = 0;
        let mut not_helpful_votes = 0;
        let mut stats = Vec::with_capacity(deals.len());

        for (deal_id, title) in deals {
            let deal_counts = counts.remove(&deal_id).unwrap_or_default();
            let (helpful, not_helpful) = votes.get(&deal_id).copied().unwrap_or_default();

            totals.add(EventType::View, deal_counts.views);
            totals.add(EventType::Click, deal_counts.clicks);
            totals.add(EventType::Share, deal_counts.shares);
            totals.add(EventType::Save, deal_counts.saves);
            helpful_votes += helpful;
            not_helpful_votes += not_helpful;

            stats.push(DealStats {
                deal_id,
                title,
                counts: deal_counts,
                helpful_votes: helpful,
                not_helpful_votes: not_helpful,
            });
        }

        let follower_count = self.storage.follower_count(&promoter.id).await?;

        Ok(PromoterSummary {
            promoter_id: promoter.id,
            days,
            since,
            totals,
            follower_count,
            helpful_votes,
            not_helpful_votes,
            deals: stats,
        })
    }
}
