//! 注册、登录、登出

use actix_governor::{Governor, GovernorConfigBuilder, KeyExtractor, SimpleKeyExtractionError};
use actix_web::dev::ServiceRequest;
use actix_web::{HttpResponse, Responder, Result as ActixResult, web};
use governor::middleware::NoOpMiddleware;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::api::middleware::{Identity, expired_session_cookie};
use crate::services::{AuthService, LoginRequest, SignupRequest};

use super::helpers::{api_result, created_response, error_from_dealdrop, success_response};
use super::types::MessageResponse;

/// 按连接 IP 限流
#[derive(Clone, Copy)]
pub struct LoginKeyExtractor;

impl KeyExtractor for LoginKeyExtractor {
    type Key = String;
    type KeyExtractionError = SimpleKeyExtractionError<&'static str>;

    fn extract(&self, req: &ServiceRequest) -> Result<Self::Key, Self::KeyExtractionError> {
        // 测试请求没有 peer 地址，统一归到一个桶
        Ok(req
            .connection_info()
            .peer_addr()
            .unwrap_or("unknown")
            .to_string())
    }
}

/// 登录/注册限流：每秒补充 1 个令牌，突发 5 次
pub fn login_rate_limiter() -> Governor<LoginKeyExtractor, NoOpMiddleware> {
    let config = GovernorConfigBuilder::default()
        .seconds_per_request(1)
        .burst_size(5)
        .key_extractor(LoginKeyExtractor)
        .finish()
        .expect("Invalid rate limit config");

    debug!("Login rate limiter created: 1 req/s, burst 5");
    Governor::new(&config)
}

pub async fn signup(
    body: web::Json<SignupRequest>,
    auth: web::Data<Arc<AuthService>>,
) -> ActixResult<impl Responder> {
    let req = body.into_inner();
    info!("API: signup request for '{}'", req.username);

    Ok(match auth.signup(req).await {
        Ok(session) => created_response(session),
        Err(e) => {
            warn!("API: signup rejected: {}", e);
            error_from_dealdrop(&e)
        }
    })
}

pub async fn login(
    body: web::Json<LoginRequest>,
    auth: web::Data<Arc<AuthService>>,
) -> ActixResult<impl Responder> {
    Ok(api_result(auth.login(body.into_inner()).await))
}

/// 令牌无状态，登出只清理会话 cookie
pub async fn logout() -> ActixResult<impl Responder> {
    let mut resp = success_response(MessageResponse {
        message: "Signed out".to_string(),
    });
    resp.add_cookie(&expired_session_cookie())
        .map_err(actix_web::error::ErrorInternalServerError)?;
    Ok(resp)
}

pub async fn me(
    identity: Identity,
    auth: web::Data<Arc<AuthService>>,
) -> ActixResult<HttpResponse> {
    let user_id = match identity.require_user() {
        Ok(id) => id,
        Err(e) => return Ok(error_from_dealdrop(&e)),
    };
    Ok(api_result(auth.me(user_id).await))
}
