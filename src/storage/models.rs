use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// 账户类型
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, AsRefStr, EnumString, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum UserType {
    Shopper,
    Promoter,
}

/// 分析事件类型
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, AsRefStr, EnumString, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EventType {
    View,
    Click,
    Share,
    Save,
}

/// 列表排序方式
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, AsRefStr, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DealSort {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    Discount,
}

/// 价格敏感度（个人资料设置）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PriceSensitivity {
    Low,
    Medium,
    High,
}

/// 对外返回的 deal（附带投票统计与过期标记）
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Deal {
    pub id: i64,
    pub promoter_id: String,
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub current_price: f64,
    pub retail_price: f64,
    pub discount_percentage: i32,
    pub expiry_date: DateTime<Utc>,
    pub affiliate_link: String,
    pub image_url: Option<String>,
    pub archived_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub helpful_count: u64,
    #[serde(default)]
    pub not_helpful_count: u64,
    #[serde(default)]
    pub is_expired: bool,
}

/// 待插入的 deal（已通过校验）
#[derive(Debug, Clone, PartialEq)]
pub struct NewDeal {
    pub promoter_id: String,
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub current_price: f64,
    pub retail_price: f64,
    pub discount_percentage: i32,
    pub expiry_date: DateTime<Utc>,
    pub affiliate_link: String,
    pub image_url: Option<String>,
}

/// deal 的部分更新，None 字段保持不变
#[derive(Debug, Clone, Default)]
pub struct DealChanges {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub category: Option<String>,
    pub current_price: Option<f64>,
    pub retail_price: Option<f64>,
    pub discount_percentage: Option<i32>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub affiliate_link: Option<String>,
    pub image_url: Option<Option<String>>,
}

/// deal 列表过滤条件
#[derive(Default, Clone, Debug)]
pub struct DealFilter {
    /// 模糊搜索 title 或 description
    pub search: Option<String>,
    pub category: Option<String>,
    /// 创建时间 >= created_after（由年龄窗口换算）
    pub created_after: Option<DateTime<Utc>>,
    pub promoter_id: Option<String>,
    pub sort: DealSort,
    pub include_archived: bool,
}

impl DealFilter {
    /// COUNT 缓存 key；带年龄窗口的过滤条件随时间变化，不缓存
    pub fn cache_key(&self) -> Option<String> {
        if self.created_after.is_some() {
            return None;
        }
        Some(format!(
            "count:s={:?}:c={:?}:p={:?}:ar={}",
            self.search, self.category, self.promoter_id, self.include_archived
        ))
    }
}

/// 一页 deal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DealPage {
    pub deals: Vec<Deal>,
    pub page: u64,
    pub page_size: u64,
    pub active_total: u64,
    pub expired_total: u64,
    pub total: u64,
    pub total_pages: u64,
}

/// 对外返回的用户资料（不含密码哈希）
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub username: String,
    pub user_type: UserType,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub preferred_categories: Vec<String>,
    pub price_sensitivity: Option<PriceSensitivity>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 注册时写入的资料
#[derive(Debug, Clone)]
pub struct NewProfile {
    pub id: String,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub user_type: UserType,
}

/// 资料的部分更新
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub username: Option<String>,
    pub display_name: Option<Option<String>>,
    pub bio: Option<Option<String>>,
    pub avatar_url: Option<Option<String>>,
    pub preferred_categories: Option<Vec<String>>,
    pub price_sensitivity: Option<Option<PriceSensitivity>>,
}

/// 用户对某个 deal 的投票/使用状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct InteractionState {
    pub is_helpful: Option<bool>,
    pub is_used: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Comment {
    pub id: i64,
    pub deal_id: i64,
    pub user_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// 待写入的分析事件
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub deal_id: i64,
    pub event_type: EventType,
    pub user_id: Option<String>,
    pub session_id: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NewEvent {
    /// 浏览去重身份：登录用户优先，其次匿名会话
    pub fn viewer_key(&self) -> Option<String> {
        match (&self.user_id, &self.session_id) {
            (Some(user_id), _) => Some(format!("user:{}", user_id)),
            (None, Some(session_id)) => Some(format!("session:{}", session_id)),
            (None, None) => None,
        }
    }
}

/// 单个 deal 的事件计数
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventCounts {
    pub views: u64,
    pub clicks: u64,
    pub shares: u64,
    pub saves: u64,
}

impl EventCounts {
    pub fn add(&mut self, event: EventType, count: u64) {
        match event {
            EventType::View => self.views += count,
            EventType::Click => self.clicks += count,
            EventType::Share => self.shares += count,
            EventType::Save => self.saves += count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_parse() {
        assert_eq!("view".parse::<EventType>().unwrap(), EventType::View);
        assert_eq!(EventType::Share.as_ref(), "share");
        assert!("like".parse::<EventType>().is_err());
    }

    #[test]
    fn test_sort_parse() {
        assert_eq!("price_asc".parse::<DealSort>().unwrap(), DealSort::PriceAsc);
        assert_eq!(DealSort::default(), DealSort::Newest);
    }

    #[test]
    fn test_viewer_key_prefers_user() {
        let mut event = NewEvent {
            deal_id: 1,
            event_type: EventType::View,
            user_id: Some("u-1".to_string()),
            session_id: Some("session_1_abc".to_string()),
            user_agent: None,
            created_at: Utc::now(),
        };
        assert_eq!(event.viewer_key().as_deref(), Some("user:u-1"));

        event.user_id = None;
        assert_eq!(event.viewer_key().as_deref(), Some("session:session_1_abc"));

        event.session_id = None;
        assert!(event.viewer_key().is_none());
    }

    #[test]
    fn test_event_counts_add() {
        let mut counts = EventCounts::default();
        counts.add(EventType::View, 3);
        counts.add(EventType::Save, 1);
        assert_eq!(counts.views, 3);
        assert_eq!(counts.saves, 1);
        assert_eq!(counts.clicks, 0);
    }
}
