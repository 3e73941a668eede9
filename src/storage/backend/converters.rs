use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::{NotSet, Set};

use crate::storage::models::{
    Comment, Deal, DealChanges, NewDeal, NewProfile, PriceSensitivity, ProfileChanges, UserProfile,
    UserType,
};
use migration::entities::{deal, deal_comment, user_profile};

/// 将 deal Model 转换为对外 Deal（投票数由调用方补充）
pub fn model_to_deal(model: deal::Model, now: DateTime<Utc>) -> Deal {
    Deal {
        is_expired: model.expiry_date < now,
        id: model.id,
        promoter_id: model.promoter_id,
        title: model.title,
        description: model.description,
        category: model.category,
        current_price: model.current_price,
        retail_price: model.retail_price,
        discount_percentage: model.discount_percentage,
        expiry_date: model.expiry_date,
        affiliate_link: model.affiliate_link,
        image_url: model.image_url,
        archived_at: model.archived_at,
        created_at: model.created_at,
        updated_at: model.updated_at,
        helpful_count: 0,
        not_helpful_count: 0,
    }
}

/// 将 NewDeal 转换为 ActiveModel（用于插入）
pub fn deal_to_active_model(new_deal: &NewDeal, now: DateTime<Utc>) -> deal::ActiveModel {
    deal::ActiveModel {
        id: NotSet,
        promoter_id: Set(new_deal.promoter_id.clone()),
        title: Set(new_deal.title.clone()),
        description: Set(new_deal.description.clone()),
        category: Set(new_deal.category.clone()),
        current_price: Set(new_deal.current_price),
        retail_price: Set(new_deal.retail_price),
        discount_percentage: Set(new_deal.discount_percentage),
        expiry_date: Set(new_deal.expiry_date),
        affiliate_link: Set(new_deal.affiliate_link.clone()),
        image_url: Set(new_deal.image_url.clone()),
        archived_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
}

/// 把部分更新叠加到已有 ActiveModel 上
pub fn apply_deal_changes(active: &mut deal::ActiveModel, changes: DealChanges, now: DateTime<Utc>) {
    if let Some(title) = changes.title {
        active.title = Set(title);
    }
    if let Some(description) = changes.description {
        active.description = Set(description);
    }
    if let Some(category) = changes.category {
        active.category = Set(category);
    }
    if let Some(price) = changes.current_price {
        active.current_price = Set(price);
    }
    if let Some(price) = changes.retail_price {
        active.retail_price = Set(price);
    }
    if let Some(discount) = changes.discount_percentage {
        active.discount_percentage = Set(discount);
    }
    if let Some(expiry) = changes.expiry_date {
        active.expiry_date = Set(expiry);
        // 延期后重新上架
        if expiry > now {
            active.archived_at = Set(None);
        }
    }
    if let Some(link) = changes.affiliate_link {
        active.affiliate_link = Set(link);
    }
    if let Some(image) = changes.image_url {
        active.image_url = Set(image);
    }
    active.updated_at = Set(now);
}

pub fn model_to_profile(model: user_profile::Model) -> UserProfile {
    UserProfile {
        user_type: model.user_type.parse().unwrap_or(UserType::Shopper),
        preferred_categories: serde_json::from_str(&model.preferred_categories).unwrap_or_default(),
        price_sensitivity: model
            .price_sensitivity
            .as_deref()
            .and_then(|s| s.parse::<PriceSensitivity>().ok()),
        id: model.id,
        email: model.email,
        username: model.username,
        display_name: model.display_name,
        bio: model.bio,
        avatar_url: model.avatar_url,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

pub fn profile_to_active_model(profile: &NewProfile, now: DateTime<Utc>) -> user_profile::ActiveModel {
    user_profile::ActiveModel {
        id: Set(profile.id.clone()),
        email: Set(profile.email.clone()),
        username: Set(profile.username.clone()),
        password_hash: Set(profile.password_hash.clone()),
        user_type: Set(profile.user_type.as_ref().to_string()),
        display_name: Set(None),
        bio: Set(None),
        avatar_url: Set(None),
        preferred_categories: Set("[]".to_string()),
        price_sensitivity: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
}

pub fn apply_profile_changes(
    active: &mut user_profile::ActiveModel,
    changes: ProfileChanges,
    now: DateTime<Utc>,
) {
    if let Some(username) = changes.username {
        active.username = Set(username);
    }
    if let Some(display_name) = changes.display_name {
        active.display_name = Set(display_name);
    }
    if let Some(bio) = changes.bio {
        active.bio = Set(bio);
    }
    if let Some(avatar_url) = changes.avatar_url {
        active.avatar_url = Set(avatar_url);
    }
    if let Some(categories) = changes.preferred_categories {
        active.preferred_categories =
            Set(serde_json::to_string(&categories).unwrap_or_else(|_| "[]".to_string()));
    }
    if let Some(sensitivity) = changes.price_sensitivity {
        active.price_sensitivity = Set(sensitivity.map(|s| s.as_ref().to_string()));
    }
    active.updated_at = Set(now);
}

pub fn model_to_comment(model: deal_comment::Model) -> Comment {
    Comment {
        id: model.id,
        deal_id: model.deal_id,
        user_id: model.user_id,
        content: model.content,
        created_at: model.created_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use sea_orm::ActiveValue;

    fn sample_deal_model(expiry: DateTime<Utc>) -> deal::Model {
        let now = Utc::now();
        deal::Model {
            id: 7,
            promoter_id: "p-1".to_string(),
            title: "Headphones".to_string(),
            description: None,
            category: "electronics".to_string(),
            current_price: 49.9,
            retail_price: 99.9,
            discount_percentage: 50,
            expiry_date: expiry,
            affiliate_link: "https://shop.example.com/item?ref=p1".to_string(),
            image_url: None,
            archived_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_model_to_deal_marks_expired() {
        let now = Utc::now();
        let expired = model_to_deal(sample_deal_model(now - Duration::hours(1)), now);
        assert!(expired.is_expired);

        let active = model_to_deal(sample_deal_model(now + Duration::hours(1)), now);
        assert!(!active.is_expired);
        assert_eq!(active.helpful_count, 0);
    }

    #[test]
    fn test_apply_deal_changes_extending_expiry_unarchives() {
        let now = Utc::now();
        let mut model = sample_deal_model(now - Duration::days(2));
        model.archived_at = Some(now - Duration::days(1));
        let mut active: deal::ActiveModel = model.into();

        apply_deal_changes(
            &mut active,
            DealChanges {
                expiry_date: Some(now + Duration::days(3)),
                ..Default::default()
            },
            now,
        );

        assert!(matches!(active.archived_at, ActiveValue::Set(None)));
        assert!(matches!(active.updated_at, ActiveValue::Set(t) if t == now));
    }

    #[test]
    fn test_profile_categories_round_trip_through_json_column() {
        let now = Utc::now();
        let model = user_profile::Model {
            id: "u-1".to_string(),
            email: "ana@example.com".to_string(),
            username: "ana".to_string(),
            password_hash: "hash".to_string(),
            user_type: "promoter".to_string(),
            display_name: Some("Ana".to_string()),
            bio: None,
            avatar_url: None,
            preferred_categories: r#"["electronics","home"]"#.to_string(),
            price_sensitivity: Some("high".to_string()),
            created_at: now,
            updated_at: now,
        };

        let profile = model_to_profile(model);
        assert_eq!(profile.user_type, UserType::Promoter);
        assert_eq!(profile.preferred_categories, vec!["electronics", "home"]);
        assert_eq!(profile.price_sensitivity, Some(PriceSensitivity::High));
    }
}
