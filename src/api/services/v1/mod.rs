//! 公共 API v1
//!
//! 所有端点返回统一信封 `{code, message, data}`：
//! - 认证（注册、登录、登出、当前用户）
//! - 资料、关注
//! - Deal 列表、创建、更新、批量上传
//! - 投票、评论、分享、收藏
//! - Analytics 事件与推广者统计
//! - 图片上传

pub mod analytics;
pub mod auth;
mod deals;
pub mod error_code;
mod helpers;
mod profiles;
pub mod routes;
mod social;
mod types;
mod uploads;

pub use types::*;

pub use helpers::{api_result, error_from_dealdrop, error_response, success_response};

pub use error_code::ErrorCode;

pub use routes::api_v1_routes;
