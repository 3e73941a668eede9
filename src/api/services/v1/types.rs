//! v1 API 类型定义

use serde::{Deserialize, Serialize};

use crate::storage::EventType;

/// 统一响应信封 `{code, message, data}`
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct UsernameQuery {
    pub username: String,
}

#[derive(Serialize, Clone, Debug)]
pub struct UsernameAvailability {
    pub username: String,
    pub available: bool,
}

/// `helpful: null` 表示撤销投票
#[derive(Deserialize, Clone, Debug)]
pub struct HelpfulBody {
    pub helpful: Option<bool>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct UsedBody {
    pub used: bool,
}

#[derive(Deserialize, Clone, Debug)]
pub struct EventBody {
    pub event_type: EventType,
}

#[derive(Serialize, Clone, Debug)]
pub struct EventRecorded {
    pub recorded: bool,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct ShareBody {
    #[serde(default)]
    pub platform: Option<String>,
}

#[derive(Serialize, Clone, Debug)]
pub struct ShareRecorded {
    pub platform: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct CommentBody {
    pub content: String,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct PageQuery {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct SummaryQuery {
    pub days: Option<i64>,
}
