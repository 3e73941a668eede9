//! 用户资料服务

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::get_config;
use crate::errors::{DealdropError, Result};
use crate::storage::{PriceSensitivity, ProfileChanges, SeaOrmStorage, UserProfile, UserType};
use crate::utils::is_valid_image_url;

pub const USERNAME_MIN_LEN: usize = 3;
pub const USERNAME_MAX_LEN: usize = 30;
const DISPLAY_NAME_MAX_LEN: usize = 60;
const BIO_MAX_LEN: usize = 500;
const MAX_PREFERRED_CATEGORIES: usize = 20;

// ============ Request/Response DTOs ============

/// 资料设置更新；缺省字段保持不变，显式 null 清空
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProfileRequest {
    pub username: Option<String>,
    #[serde(default, with = "double_option")]
    pub display_name: Option<Option<String>>,
    #[serde(default, with = "double_option")]
    pub bio: Option<Option<String>>,
    #[serde(default, with = "double_option")]
    pub avatar_url: Option<Option<String>>,
    pub preferred_categories: Option<Vec<String>>,
    #[serde(default, with = "double_option")]
    pub price_sensitivity: Option<Option<PriceSensitivity>>,
}

/// 公开资料（附带关注统计）
#[derive(Debug, Clone, Serialize)]
pub struct PublicProfile {
    #[serde(flatten)]
    pub profile: UserProfile,
    pub follower_count: u64,
    pub following_count: u64,
}

/// 区分“字段缺省”和“字段为 null”
pub(crate) mod double_option {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}

// ============ Validation ============

/// 用户名规则：3..=30 个字符，仅 `[a-z0-9_]`；返回规范化（小写）结果
pub fn validate_username(input: &str) -> Result<String> {
    let username = input.trim().to_lowercase();
    let len = username.chars().count();

    if !(USERNAME_MIN_LEN..=USERNAME_MAX_LEN).contains(&len) {
        return Err(DealdropError::validation(format!(
            "Username must be between {} and {} characters",
            USERNAME_MIN_LEN, USERNAME_MAX_LEN
        )));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
    {
        return Err(DealdropError::validation(
            "Username may only contain letters, numbers and underscores",
        ));
    }
    Ok(username)
}

/// 简单的邮箱格式检查：local@domain.tld
pub fn validate_email(input: &str) -> Result<String> {
    let email = input.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && domain.contains('.')
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };

    if valid {
        Ok(email)
    } else {
        Err(DealdropError::validation("Invalid email address"))
    }
}

/// 头像地址：https 图片，或本服务媒体目录下的文件
pub fn is_valid_avatar_url(url: &str) -> bool {
    let media_prefix = format!(
        "{}/media/",
        get_config().media.public_base_url.trim_end_matches('/')
    );
    is_valid_image_url(url) || (url.starts_with(&media_prefix) && url.len() > media_prefix.len())
}

fn optional_text(value: Option<String>, max_len: usize, field: &str) -> Result<Option<String>> {
    let Some(text) = value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    if text.chars().count() > max_len {
        return Err(DealdropError::validation(format!(
            "{} must be at most {} characters",
            field, max_len
        )));
    }
    Ok(Some(text))
}

/// 当前用户必须是推广者
pub async fn require_promoter(storage: &SeaOrmStorage, user_id: &str) -> Result<UserProfile> {
    let profile = storage
        .find_profile(user_id)
        .await?
        .ok_or_else(|| DealdropError::unauthorized("Profile not found"))?;

    if profile.user_type != UserType::Promoter {
        return Err(DealdropError::forbidden(
            "Only promoter accounts can perform this action",
        ));
    }
    Ok(profile)
}

// ============ ProfileService Implementation ============

pub struct ProfileService {
    storage: Arc<SeaOrmStorage>,
}

impl ProfileService {
    pub fn new(storage: Arc<SeaOrmStorage>) -> Self {
        Self { storage }
    }

    pub async fn get_profile(&self, id: &str) -> Result<PublicProfile> {
        let profile = self
            .storage
            .find_profile(id)
            .await?
            .ok_or_else(|| DealdropError::not_found(format!("Profile {} not found", id)))?;

        let follower_count = self.storage.follower_count(id).await?;
        let following_count = self.storage.following_count(id).await?;

        Ok(PublicProfile {
            profile,
            follower_count,
            following_count,
        })
    }

    /// 用户名是否可用（仅供表单提示，最终以唯一索引为准）
    pub async fn username_available(&self, username: &str) -> Result<bool> {
        let username = validate_username(username)?;
        Ok(!self.storage.username_exists(&username).await?)
    }

    pub async fn update_profile(
        &self,
        user_id: &str,
        req: UpdateProfileRequest,
    ) -> Result<UserProfile> {
        let mut changes = ProfileChanges::default();

        if let Some(username) = req.username {
            changes.username = Some(validate_username(&username)?);
        }
        if let Some(display_name) = req.display_name {
            changes.display_name = Some(optional_text(
                display_name,
                DISPLAY_NAME_MAX_LEN,
                "Display name",
            )?);
        }
        if let Some(bio) = req.bio {
            changes.bio = Some(optional_text(bio, BIO_MAX_LEN, "Bio")?);
        }
        if let Some(avatar_url) = req.avatar_url {
            let avatar_url = avatar_url
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty());
            if let Some(ref url) = avatar_url
                && !is_valid_avatar_url(url)
            {
                return Err(DealdropError::invalid_image("Invalid image URL"));
            }
            changes.avatar_url = Some(avatar_url);
        }
        if let Some(categories) = req.preferred_categories {
            let mut cleaned: Vec<String> = Vec::new();
            for category in categories.iter().map(|c| c.trim().to_lowercase()) {
                if !category.is_empty() && !cleaned.contains(&category) {
                    cleaned.push(category);
                }
            }
            if cleaned.len() > MAX_PREFERRED_CATEGORIES {
                return Err(DealdropError::validation(format!(
                    "At most {} preferred categories",
                    MAX_PREFERRED_CATEGORIES
                )));
            }
            changes.preferred_categories = Some(cleaned);
        }
        if let Some(price_sensitivity) = req.price_sensitivity {
            changes.price_sensitivity = Some(price_sensitivity);
        }

        let profile = self
            .storage
            .update_profile(user_id, changes)
            .await
            .map_err(|e| match e {
                DealdropError::Conflict(_) => DealdropError::conflict("Username already taken"),
                other => other,
            })?;

        info!("ProfileService: updated profile '{}'", user_id);
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_username() {
        assert_eq!(validate_username("  Deal_Hunter99 ").unwrap(), "deal_hunter99");
        assert!(validate_username("ab").is_err());
        assert!(validate_username(&"a".repeat(31)).is_err());
        assert!(validate_username(&"a".repeat(30)).is_ok());
        assert!(validate_username("has space").is_err());
        assert!(validate_username("dash-name").is_err());
        assert!(validate_username("josé").is_err());
    }

    #[test]
    fn test_validate_email() {
        assert_eq!(validate_email(" Ana@Example.com ").unwrap(), "ana@example.com");
        assert!(validate_email("no-at-sign.com").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("ana@localhost").is_err());
        assert!(validate_email("ana@.com").is_err());
        assert!(validate_email("a b@example.com").is_err());
    }

    #[test]
    fn test_avatar_url() {
        assert!(is_valid_avatar_url("https://cdn.example.com/me.png"));
        assert!(!is_valid_avatar_url("https://cdn.example.com/me.gif"));

        let base = get_config().media.public_base_url.clone();
        let local = format!("{}/media/abc.png", base.trim_end_matches('/'));
        assert!(is_valid_avatar_url(&local));
        assert!(!is_valid_avatar_url(&format!("{}/media/", base.trim_end_matches('/'))));
    }

    #[test]
    fn test_update_request_distinguishes_null() {
        let req: UpdateProfileRequest =
            serde_json::from_str(r#"{"bio": null, "display_name": "Ana"}"#).unwrap();
        assert_eq!(req.bio, Some(None));
        assert_eq!(req.display_name, Some(Some("Ana".to_string())));
        assert!(req.avatar_url.is_none());
    }

    #[test]
    fn test_optional_text_limits() {
        assert_eq!(optional_text(Some("  ".into()), 10, "Bio").unwrap(), None);
        assert_eq!(
            optional_text(Some(" hi ".into()), 10, "Bio").unwrap(),
            Some("hi".to_string())
        );
        assert!(optional_text(Some("x".repeat(11)), 10, "Bio").is_err());
    }
}
