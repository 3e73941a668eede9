//! v1 路由配置
//!
//! 按功能拆分 scope，最后在 [`api_v1_routes`] 中组合。

use actix_web::web;

use super::analytics::{promoter_summary, record_event};
use super::auth::{login, login_rate_limiter, logout, me, signup};
use super::deals::{create_deal, get_deal, list_deals, saved_deals, update_deal};
use super::helpers::{json_error_handler, query_error_handler};
use super::profiles::{get_profile, list_followers, toggle_follow, update_me, username_available};
use super::social::{
    add_comment, delete_comment, list_comments, mark_used, set_helpful, share, toggle_save,
};
use super::uploads::{bulk_upload, upload_media};

/// 认证路由 `/auth`
///
/// - POST /auth/signup（带限流）
/// - POST /auth/login（带限流）
/// - POST /auth/logout
/// - GET /auth/me
pub fn auth_routes() -> actix_web::Scope {
    web::scope("/auth")
        .route("/signup", web::post().to(signup).wrap(login_rate_limiter()))
        .route("/login", web::post().to(login).wrap(login_rate_limiter()))
        .route("/logout", web::post().to(logout))
        .route("/me", web::get().to(me))
}

/// 资料路由 `/profiles`
pub fn profiles_routes() -> actix_web::Scope {
    web::scope("/profiles")
        // must be before /{id}
        .route("/username-available", web::get().to(username_available))
        .route("/me", web::put().to(update_me))
        .route("/{id}", web::get().to(get_profile))
}

/// Deal 路由 `/deals`
///
/// 包含：
/// - GET/POST /deals
/// - POST /deals/bulk-upload
/// - GET/PUT /deals/{id}
/// - POST /deals/{id}/events
/// - PUT /deals/{id}/helpful, PUT /deals/{id}/used
/// - GET/POST /deals/{id}/comments
/// - POST /deals/{id}/share, POST /deals/{id}/save
pub fn deals_routes() -> actix_web::Scope {
    web::scope("/deals")
        .route("", web::get().to(list_deals))
        .route("", web::post().to(create_deal))
        // Bulk upload (must be before /{id})
        .route("/bulk-upload", web::post().to(bulk_upload))
        .route("/{id}/events", web::post().to(record_event))
        .route("/{id}/helpful", web::put().to(set_helpful))
        .route("/{id}/used", web::put().to(mark_used))
        .route("/{id}/comments", web::get().to(list_comments))
        .route("/{id}/comments", web::post().to(add_comment))
        .route("/{id}/share", web::post().to(share))
        .route("/{id}/save", web::post().to(toggle_save))
        .route("/{id}", web::get().to(get_deal))
        .route("/{id}", web::put().to(update_deal))
}

pub fn comments_routes() -> actix_web::Scope {
    web::scope("/comments").route("/{id}", web::delete().to(delete_comment))
}

pub fn me_routes() -> actix_web::Scope {
    web::scope("/me").route("/saved", web::get().to(saved_deals))
}

pub fn promoters_routes() -> actix_web::Scope {
    web::scope("/promoters")
        .route("/{id}/follow", web::post().to(toggle_follow))
        .route("/{id}/followers", web::get().to(list_followers))
}

pub fn analytics_routes() -> actix_web::Scope {
    web::scope("/analytics").route("/summary", web::get().to(promoter_summary))
}

pub fn media_upload_routes() -> actix_web::Scope {
    web::scope("/media").route("", web::post().to(upload_media))
}

/// API v1 路由，挂载在 `/api/v1`
pub fn api_v1_routes() -> actix_web::Scope {
    web::scope(crate::api::constants::API_PREFIX)
        .app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::QueryConfig::default().error_handler(query_error_handler))
        .service(auth_routes())
        .service(profiles_routes())
        .service(deals_routes())
        .service(comments_routes())
        .service(me_routes())
        .service(promoters_routes())
        .service(analytics_routes())
        .service(media_upload_routes())
}
