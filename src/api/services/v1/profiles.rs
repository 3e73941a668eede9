//! 用户资料与关注

use actix_web::{HttpResponse, Result as ActixResult, web};
use std::sync::Arc;
use tracing::trace;

use crate::api::middleware::Identity;
use crate::services::{ProfileService, SocialService, UpdateProfileRequest};

use super::helpers::{api_result, error_from_dealdrop};
use super::types::{UsernameAvailability, UsernameQuery};

pub async fn get_profile(
    path: web::Path<String>,
    profiles: web::Data<Arc<ProfileService>>,
) -> ActixResult<HttpResponse> {
    let id = path.into_inner();
    trace!("API: get profile {}", id);
    Ok(api_result(profiles.get_profile(&id).await))
}

/// 仅作表单提示
pub async fn username_available(
    query: web::Query<UsernameQuery>,
    profiles: web::Data<Arc<ProfileService>>,
) -> ActixResult<HttpResponse> {
    let username = query.into_inner().username;
    Ok(api_result(
        profiles
            .username_available(&username)
            .await
            .map(|available| UsernameAvailability {
                username: username.trim().to_lowercase(),
                available,
            }),
    ))
}

pub async fn update_me(
    identity: Identity,
    body: web::Json<UpdateProfileRequest>,
    profiles: web::Data<Arc<ProfileService>>,
) -> ActixResult<HttpResponse> {
    let user_id = match identity.require_user() {
        Ok(id) => id,
        Err(e) => return Ok(error_from_dealdrop(&e)),
    };
    Ok(api_result(
        profiles.update_profile(user_id, body.into_inner()).await,
    ))
}

pub async fn toggle_follow(
    identity: Identity,
    path: web::Path<String>,
    social: web::Data<Arc<SocialService>>,
) -> ActixResult<HttpResponse> {
    let user_id = match identity.require_user() {
        Ok(id) => id,
        Err(e) => return Ok(error_from_dealdrop(&e)),
    };
    Ok(api_result(social.toggle_follow(&path, user_id).await))
}

pub async fn list_followers(
    path: web::Path<String>,
    social: web::Data<Arc<SocialService>>,
) -> ActixResult<HttpResponse> {
    Ok(api_result(social.list_followers(&path).await))
}
