//! 函数端点 `/functions/v1`
//!
//! 供定时器/外部调度调用，返回纯文本。配置了 `functions.token` 时需要
//! `Authorization: Bearer <token>`。

use actix_web::{HttpRequest, HttpResponse, Responder, web};
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tracing::{error, info, warn};

use crate::api::constants::FUNCTIONS_PREFIX;
use crate::config::get_config;
use crate::services::ArchiveTask;

fn authorized(req: &HttpRequest) -> bool {
    let config = get_config();
    let Some(expected) = config.functions.token.as_deref().filter(|t| !t.is_empty()) else {
        return true;
    };
    bearer_token_matches(req, expected)
}

/// 常量时间比较 Bearer token
fn bearer_token_matches(req: &HttpRequest, expected: &str) -> bool {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .is_some_and(|token| token.trim().as_bytes().ct_eq(expected.as_bytes()).into())
}

/// 归档所有已过期的 deal
pub async fn archive_expired_deals(
    req: HttpRequest,
    archive: web::Data<Arc<ArchiveTask>>,
) -> impl Responder {
    if !authorized(&req) {
        warn!("Function call rejected: invalid token");
        return HttpResponse::Unauthorized()
            .content_type("text/plain; charset=utf-8")
            .body("Unauthorized");
    }

    match archive.run_once().await {
        Ok(count) => {
            info!("Archived {} expired deals", count);
            HttpResponse::Ok()
                .content_type("text/plain; charset=utf-8")
                .body(format!("Archived {} expired deals", count))
        }
        Err(e) => {
            error!("Failed to archive expired deals: {}", e);
            HttpResponse::InternalServerError()
                .content_type("text/plain; charset=utf-8")
                .body("Failed to archive expired deals")
        }
    }
}

pub fn functions_routes() -> actix_web::Scope {
    web::scope(FUNCTIONS_PREFIX).route(
        "/archive-expired-deals",
        web::post().to(archive_expired_deals),
    )
}
