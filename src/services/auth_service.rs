//! 注册与登录

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::profile_service::{validate_email, validate_username};
use crate::api::jwt::get_jwt_service;
use crate::errors::{DealdropError, Result};
use crate::storage::{NewProfile, SeaOrmStorage, UserProfile, UserType};
use crate::utils::password::{check_password_strength, hash_password, verify_password};

#[derive(Debug, Clone, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub username: String,
    pub user_type: UserType,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// 登录成功返回的令牌与资料
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: u64,
    pub profile: UserProfile,
}

pub struct AuthService {
    storage: Arc<SeaOrmStorage>,
}

impl AuthService {
    pub fn new(storage: Arc<SeaOrmStorage>) -> Self {
        Self { storage }
    }

    fn issue_session(&self, profile: UserProfile) -> Result<AuthSession> {
        let jwt = get_jwt_service();
        let access_token = jwt
            .generate_access_token(&profile.id, profile.user_type)
            .map_err(|e| DealdropError::unauthorized(format!("Failed to issue token: {}", e)))?;

        Ok(AuthSession {
            access_token,
            token_type: "Bearer",
            expires_in: jwt.access_token_minutes() * 60,
            profile,
        })
    }

    /// 注册并直接登录
    ///
    /// email / username 唯一性由唯一索引保证，冲突返回 Conflict。
    pub async fn signup(&self, req: SignupRequest) -> Result<AuthSession> {
        let email = validate_email(&req.email)?;
        let username = validate_username(&req.username)?;
        check_password_strength(&req.password)?;

        let new_profile = NewProfile {
            id: uuid::Uuid::new_v4().to_string(),
            email,
            username,
            password_hash: hash_password(&req.password)?,
            user_type: req.user_type,
        };

        let profile = self
            .storage
            .insert_profile(&new_profile)
            .await
            .map_err(|e| match e {
                DealdropError::Conflict(detail) if detail.to_lowercase().contains("email") => {
                    DealdropError::conflict("Email already registered")
                }
                DealdropError::Conflict(_) => DealdropError::conflict("Username already taken"),
                other => other,
            })?;

        info!(
            "AuthService: signup '{}' as {}",
            profile.username, profile.user_type
        );
        self.issue_session(profile)
    }

    pub async fn login(&self, req: LoginRequest) -> Result<AuthSession> {
        let invalid = || DealdropError::unauthorized("Invalid email or password");

        let email = req.email.trim().to_lowercase();
        let (profile, password_hash) = self
            .storage
            .find_login(&email)
            .await?
            .ok_or_else(invalid)?;

        if !verify_password(&req.password, &password_hash)? {
            warn!("AuthService: failed login for '{}'", email);
            return Err(invalid());
        }

        info!("AuthService: login '{}'", profile.username);
        self.issue_session(profile)
    }

    /// 当前登录用户的资料
    pub async fn me(&self, user_id: &str) -> Result<UserProfile> {
        self.storage
            .find_profile(user_id)
            .await?
            .ok_or_else(|| DealdropError::unauthorized("Profile not found"))
    }
}
