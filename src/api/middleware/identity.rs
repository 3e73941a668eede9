//! 请求身份中间件
//!
//! - `Authorization: Bearer <jwt>` → 登录用户
//! - `dd_session` cookie 或 `X-Session-Id` 头 → 匿名会话；都没有时生成新 id，
//!   并在响应里写回 cookie（浏览器会话期，无 max-age）
//!
//! 解析结果以 [`Identity`] 放入请求扩展，handler 直接作为参数提取。

use actix_web::{
    Error, FromRequest, HttpMessage, HttpRequest,
    cookie::{Cookie, SameSite},
    dev::{Payload, Service, ServiceRequest, ServiceResponse, Transform},
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::rc::Rc;
use tracing::{debug, trace};

use crate::api::constants::SESSION_HEADER;
use crate::api::jwt::get_jwt_service;
use crate::config::get_config;
use crate::errors::DealdropError;
use crate::services::EventContext;
use crate::storage::UserType;
use crate::utils::{generate_session_id, is_valid_session_id};

/// 当前请求的身份
#[derive(Debug, Clone, Default)]
pub struct Identity {
    pub user_id: Option<String>,
    pub user_type: Option<UserType>,
    pub session_id: Option<String>,
    pub user_agent: Option<String>,
    /// 携带了 token 但校验失败
    pub token_rejected: bool,
}

impl Identity {
    /// 需要登录的接口使用
    pub fn require_user(&self) -> Result<&str, DealdropError> {
        match self.user_id.as_deref() {
            Some(id) => Ok(id),
            None if self.token_rejected => {
                Err(DealdropError::unauthorized("Invalid or expired token"))
            }
            None => Err(DealdropError::unauthorized("Sign in required")),
        }
    }

    pub fn event_context(&self) -> EventContext {
        EventContext {
            user_id: self.user_id.clone(),
            session_id: self.session_id.clone(),
            user_agent: self.user_agent.clone(),
        }
    }
}

impl FromRequest for Identity {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(Ok(req.extensions().get::<Identity>().cloned().unwrap_or_default()))
    }
}

/// 会话 cookie（无 max-age，随浏览器会话结束）
pub fn session_cookie(session_id: &str) -> Cookie<'static> {
    let config = get_config();
    let mut cookie = Cookie::new(config.auth.session_cookie_name.clone(), session_id.to_string());
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_secure(config.auth.cookie_secure);
    cookie.set_same_site(SameSite::Lax);
    cookie
}

/// 登出时清除会话 cookie
pub fn expired_session_cookie() -> Cookie<'static> {
    let mut cookie = session_cookie("");
    cookie.make_removal();
    cookie
}

#[derive(Clone)]
pub struct IdentityResolver;

impl<S, B> Transform<S, ServiceRequest> for IdentityResolver
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = IdentityMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(IdentityMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct IdentityMiddleware<S> {
    service: Rc<S>,
}

impl<S> IdentityMiddleware<S> {
    fn extract_bearer_token(req: &ServiceRequest) -> Option<String> {
        req.headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.strip_prefix("Bearer "))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    /// cookie 优先，其次请求头；格式不对的 id 丢弃
    fn extract_session_id(req: &ServiceRequest, cookie_name: &str) -> Option<String> {
        req.cookie(cookie_name)
            .map(|c| c.value().to_string())
            .or_else(|| {
                req.headers()
                    .get(SESSION_HEADER)
                    .and_then(|h| h.to_str().ok())
                    .map(str::to_string)
            })
            .filter(|id| is_valid_session_id(id))
    }

    fn resolve(req: &ServiceRequest) -> (Identity, bool) {
        let config = get_config();
        let mut identity = Identity {
            user_agent: req
                .headers()
                .get("User-Agent")
                .and_then(|h| h.to_str().ok())
                .map(str::to_string),
            ..Default::default()
        };

        if let Some(token) = Self::extract_bearer_token(req) {
            match get_jwt_service().validate_access_token(&token) {
                Ok(claims) => {
                    trace!("Bearer token accepted for {}", claims.sub);
                    identity.user_id = Some(claims.sub);
                    identity.user_type = Some(claims.user_type);
                }
                Err(e) => {
                    debug!("Bearer token rejected: {}", e);
                    identity.token_rejected = true;
                }
            }
        }

        let (session_id, created) =
            match Self::extract_session_id(req, &config.auth.session_cookie_name) {
                Some(id) => (id, false),
                None => (generate_session_id(), true),
            };
        identity.session_id = Some(session_id);

        (identity, created)
    }
}

impl<S, B> Service<ServiceRequest> for IdentityMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();

        Box::pin(async move {
            let (identity, session_created) = Self::resolve(&req);
            let new_session = session_created
                .then(|| identity.session_id.clone())
                .flatten();
            req.extensions_mut().insert(identity);

            let mut res = srv.call(req).await?;

            if let Some(session_id) = new_session {
                res.response_mut()
                    .add_cookie(&session_cookie(&session_id))
                    .map_err(actix_web::error::ErrorInternalServerError)?;
            }
            Ok(res)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, HttpResponse, test, web};

    async fn whoami(identity: Identity) -> HttpResponse {
        HttpResponse::Ok().json(serde_json::json!({
            "user": identity.user_id,
            "session": identity.session_id,
        }))
    }

    #[actix_rt::test]
    async fn test_anonymous_request_gets_session_cookie() {
        let app = test::init_service(
            App::new()
                .wrap(IdentityResolver)
                .route("/whoami", web::get().to(whoami)),
        )
        .await;

        let req = test::TestRequest::get().uri("/whoami").to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());

        let cookie_name = get_config().auth.session_cookie_name.clone();
        let cookie = resp
            .response()
            .cookies()
            .find(|c| c.name() == cookie_name)
            .expect("session cookie");
        assert!(is_valid_session_id(cookie.value()));
        assert!(cookie.max_age().is_none());
    }

    #[actix_rt::test]
    async fn test_existing_session_header_is_reused() {
        let app = test::init_service(
            App::new()
                .wrap(IdentityResolver)
                .route("/whoami", web::get().to(whoami)),
        )
        .await;

        let session_id = generate_session_id();
        let req = test::TestRequest::get()
            .uri("/whoami")
            .insert_header((SESSION_HEADER, session_id.clone()))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.response().cookies().count(), 0);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["session"], session_id);
        assert!(body["user"].is_null());
    }

    #[actix_rt::test]
    async fn test_bearer_token_sets_user() {
        let app = test::init_service(
            App::new()
                .wrap(IdentityResolver)
                .route("/whoami", web::get().to(whoami)),
        )
        .await;

        let token = get_jwt_service()
            .generate_access_token("user-7", UserType::Shopper)
            .unwrap();
        let req = test::TestRequest::get()
            .uri("/whoami")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["user"], "user-7");
    }

    #[::core::prelude::v1::test]
    fn test_require_user_messages() {
        let anonymous = Identity::default();
        assert!(matches!(
            anonymous.require_user(),
            Err(DealdropError::Unauthorized(_))
        ));

        let signed_in = Identity {
            user_id: Some("u".to_string()),
            ..Default::default()
        };
        assert_eq!(signed_in.require_user().unwrap(), "u");
    }
}
