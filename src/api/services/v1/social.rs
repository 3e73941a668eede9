//! 投票、使用标记、评论、分享、收藏

use actix_web::{HttpResponse, Result as ActixResult, web};
use std::sync::Arc;

use crate::api::middleware::Identity;
use crate::services::{SharePlatform, SocialService};

use super::helpers::{api_result, created_response, error_from_dealdrop};
use super::types::{
    CommentBody, HelpfulBody, MessageResponse, PageQuery, ShareBody, ShareRecorded, UsedBody,
};

pub async fn set_helpful(
    identity: Identity,
    path: web::Path<i64>,
    body: web::Json<HelpfulBody>,
    social: web::Data<Arc<SocialService>>,
) -> ActixResult<HttpResponse> {
    let user_id = match identity.require_user() {
        Ok(id) => id,
        Err(e) => return Ok(error_from_dealdrop(&e)),
    };
    Ok(api_result(
        social
            .set_helpful(path.into_inner(), user_id, body.helpful)
            .await,
    ))
}

pub async fn mark_used(
    identity: Identity,
    path: web::Path<i64>,
    body: web::Json<UsedBody>,
    social: web::Data<Arc<SocialService>>,
) -> ActixResult<HttpResponse> {
    let user_id = match identity.require_user() {
        Ok(id) => id,
        Err(e) => return Ok(error_from_dealdrop(&e)),
    };
    Ok(api_result(
        social.mark_used(path.into_inner(), user_id, body.used).await,
    ))
}

pub async fn list_comments(
    path: web::Path<i64>,
    query: web::Query<PageQuery>,
    social: web::Data<Arc<SocialService>>,
) -> ActixResult<HttpResponse> {
    Ok(api_result(
        social
            .list_comments(path.into_inner(), query.page, query.page_size)
            .await,
    ))
}

pub async fn add_comment(
    identity: Identity,
    path: web::Path<i64>,
    body: web::Json<CommentBody>,
    social: web::Data<Arc<SocialService>>,
) -> ActixResult<HttpResponse> {
    let user_id = match identity.require_user() {
        Ok(id) => id,
        Err(e) => return Ok(error_from_dealdrop(&e)),
    };
    Ok(
        match social
            .add_comment(path.into_inner(), user_id, &body.content)
            .await
        {
            Ok(comment) => created_response(comment),
            Err(e) => error_from_dealdrop(&e),
        },
    )
}

/// 只能删除自己的评论
pub async fn delete_comment(
    identity: Identity,
    path: web::Path<i64>,
    social: web::Data<Arc<SocialService>>,
) -> ActixResult<HttpResponse> {
    let user_id = match identity.require_user() {
        Ok(id) => id,
        Err(e) => return Ok(error_from_dealdrop(&e)),
    };
    Ok(api_result(
        social
            .delete_comment(path.into_inner(), user_id)
            .await
            .map(|_| MessageResponse {
                message: "Comment deleted".to_string(),
            }),
    ))
}

/// 匿名用户也可以分享
pub async fn share(
    identity: Identity,
    path: web::Path<i64>,
    body: Option<web::Json<ShareBody>>,
    social: web::Data<Arc<SocialService>>,
) -> ActixResult<HttpResponse> {
    let platform = body
        .and_then(|b| b.into_inner().platform)
        .map(|p| SharePlatform::parse_lenient(&p))
        .unwrap_or(SharePlatform::Other);

    Ok(api_result(
        social
            .share(path.into_inner(), platform, &identity.event_context())
            .await
            .map(|_| ShareRecorded {
                platform: platform.as_ref().to_string(),
            }),
    ))
}

pub async fn toggle_save(
    identity: Identity,
    path: web::Path<i64>,
    social: web::Data<Arc<SocialService>>,
) -> ActixResult<HttpResponse> {
    if let Err(e) = identity.require_user() {
        return Ok(error_from_dealdrop(&e));
    }
    Ok(api_result(
        social
            .toggle_save(path.into_inner(), &identity.event_context())
            .await,
    ))
}
