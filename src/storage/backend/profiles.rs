//! 用户资料存储
//!
//! email / username 的唯一性由唯一索引保证，冲突经 `From<DbErr>` 映射为 Conflict。

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use tracing::info;

use super::SeaOrmStorage;
use super::converters::{apply_profile_changes, model_to_profile, profile_to_active_model};
use crate::errors::{DealdropError, Result};
use crate::storage::models::{NewProfile, ProfileChanges, UserProfile};

use migration::entities::user_profile;

impl SeaOrmStorage {
    pub async fn insert_profile(&self, profile: &NewProfile) -> Result<UserProfile> {
        let model = profile_to_active_model(profile, Utc::now())
            .insert(&self.db)
            .await?;
        info!("Profile created: id={}, type={}", model.id, model.user_type);
        Ok(model_to_profile(model))
    }

    pub async fn find_profile(&self, id: &str) -> Result<Option<UserProfile>> {
        let model = user_profile::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await?;
        Ok(model.map(model_to_profile))
    }

    /// 登录用：资料连同密码哈希
    pub async fn find_login(&self, email: &str) -> Result<Option<(UserProfile, String)>> {
        let model = user_profile::Entity::find()
            .filter(user_profile::Column::Email.eq(email))
            .one(&self.db)
            .await?;
        Ok(model.map(|m| {
            let hash = m.password_hash.clone();
            (model_to_profile(m), hash)
        }))
    }

    pub async fn username_exists(&self, username: &str) -> Result<bool> {
        let count = user_profile::Entity::find()
            .filter(user_profile::Column::Username.eq(username))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    pub async fn update_profile(&self, id: &str, changes: ProfileChanges) -> Result<UserProfile> {
        let model = user_profile::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await?
            .ok_or_else(|| DealdropError::not_found(format!("Profile {} not found", id)))?;

        let mut active: user_profile::ActiveModel = model.into();
        apply_profile_changes(&mut active, changes, Utc::now());
        let updated = active.update(&self.db).await?;

        Ok(model_to_profile(updated))
    }
}
