//! DealService 集成测试
//!
//! 覆盖过期补齐分页、创建/更新校验、归档过滤与收藏列表。

use std::sync::{Arc, Once};

use chrono::{Duration, Utc};
use serde_json::json;
use tempfile::TempDir;

use dealdrop::config::init_config;
use dealdrop::errors::DealdropError;
use dealdrop::services::{
    CreateDealRequest, DealListQuery, DealService, UpdateDealRequest,
};
use dealdrop::storage::{DealSort, NewDeal, NewProfile, SeaOrmStorage, UserType};

static INIT: Once = Once::new();

fn init_static_config() {
    INIT.call_once(|| {
        init_config();
    });
}

async fn create_temp_storage() -> (Arc<SeaOrmStorage>, TempDir) {
    init_static_config();
    let td = TempDir::new().unwrap();
    let p = td.path().join("deal_svc_test.db");
    let u = format!("sqlite://{}?mode=rwc", p.display());
    let s = SeaOrmStorage::new(&u, "sqlite").await.unwrap();
    (Arc::new(s), td)
}

async fn create_user(storage: &SeaOrmStorage, id: &str, user_type: UserType) {
    storage
        .insert_profile(&NewProfile {
            id: id.to_string(),
            email: format!("{}@example.com", id),
            username: id.replace('-', "_"),
            password_hash: "x".to_string(),
            user_type,
        })
        .await
        .unwrap();
}

fn new_deal(promoter_id: &str, title: &str, expires_in_hours: i64, price: f64) -> NewDeal {
    NewDeal {
        promoter_id: promoter_id.to_string(),
        title: title.to_string(),
        description: Some(format!("{} description", title)),
        category: "home".to_string(),
        current_price: price,
        retail_price: price * 2.0,
        discount_percentage: 50,
        expiry_date: Utc::now() + Duration::hours(expires_in_hours),
        affiliate_link: "https://shop.example.com/item?ref=promo".to_string(),
        image_url: None,
    }
}

fn create_request(value: serde_json::Value) -> CreateDealRequest {
    serde_json::from_value(value).unwrap()
}

fn query(page: u64, page_size: u64) -> DealListQuery {
    DealListQuery {
        page: Some(page),
        page_size: Some(page_size),
        ..Default::default()
    }
}

// =============================================================================
// 列表与补齐
// =============================================================================

#[tokio::test]
async fn test_expired_deals_pad_short_page() {
    let (storage, _td) = create_temp_storage().await;
    create_user(&storage, "promoter-1", UserType::Promoter).await;
    for i in 0..3 {
        storage
            .insert_deal(&new_deal("promoter-1", &format!("active {}", i), 48, 10.0))
            .await
            .unwrap();
    }
    for i in 0..4 {
        storage
            .insert_deal(&new_deal("promoter-1", &format!("expired {}", i), -48, 10.0))
            .await
            .unwrap();
    }
    let service = DealService::new(storage);

    let first = service.list_deals(query(1, 5)).await.unwrap();
    assert_eq!(first.active_total, 3);
    assert_eq!(first.expired_total, 4);
    assert_eq!(first.total, 7);
    assert_eq!(first.total_pages, 2);
    assert_eq!(first.deals.len(), 5);
    assert!(first.deals[..3].iter().all(|d| !d.is_expired));
    assert!(first.deals[3..].iter().all(|d| d.is_expired));

    let second = service.list_deals(query(2, 5)).await.unwrap();
    assert_eq!(second.deals.len(), 2);
    assert!(second.deals.iter().all(|d| d.is_expired));

    // 两页之间不重复
    let mut ids: Vec<i64> = first
        .deals
        .iter()
        .chain(second.deals.iter())
        .map(|d| d.id)
        .collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 7);
}

#[tokio::test]
async fn test_deal_moves_to_expired_as_time_passes() {
    let (storage, _td) = create_temp_storage().await;
    create_user(&storage, "promoter-1", UserType::Promoter).await;
    let deal = storage
        .insert_deal(&new_deal("promoter-1", "flash sale", 1, 10.0))
        .await
        .unwrap();
    let service = DealService::new(storage);
    let now = Utc::now();

    let before = service.list_deals_at(query(1, 10), now).await.unwrap();
    assert_eq!(before.active_total, 1);
    assert_eq!(before.expired_total, 0);
    assert_eq!(before.deals.len(), 1);
    assert!(!before.deals[0].is_expired);

    // 两小时后同样的查询：deal 已过期，仍出现在补齐部分
    let later = now + Duration::hours(2);
    let after = service.list_deals_at(query(1, 10), later).await.unwrap();
    assert_eq!(after.active_total, 0);
    assert_eq!(after.expired_total, 1);
    assert_eq!(after.total, 1);
    assert_eq!(after.deals.len(), 1);
    assert_eq!(after.deals[0].id, deal.id);
    assert!(after.deals[0].is_expired);

    // 带年龄窗口的查询同样按 now 计算
    let windowed = DealListQuery {
        age: Some("7d".to_string()),
        ..query(1, 10)
    };
    let after = service.list_deals_at(windowed, later).await.unwrap();
    assert_eq!(after.active_total, 0);
    assert_eq!(after.expired_total, 1);
    assert_eq!(after.deals.len(), 1);
}

#[tokio::test]
async fn test_full_page_of_active_deals_has_no_padding() {
    let (storage, _td) = create_temp_storage().await;
    create_user(&storage, "promoter-2", UserType::Promoter).await;
    for i in 0..4 {
        storage
            .insert_deal(&new_deal("promoter-2", &format!("active {}", i), 48, 5.0 + i as f64))
            .await
            .unwrap();
    }
    storage
        .insert_deal(&new_deal("promoter-2", "old", -1, 1.0))
        .await
        .unwrap();
    let service = DealService::new(storage);

    let page = service
        .list_deals(DealListQuery {
            sort: Some(DealSort::PriceAsc),
            ..query(1, 4)
        })
        .await
        .unwrap();
    assert_eq!(page.deals.len(), 4);
    assert!(page.deals.iter().all(|d| !d.is_expired));
    let prices: Vec<f64> = page.deals.iter().map(|d| d.current_price).collect();
    assert_eq!(prices, vec![5.0, 6.0, 7.0, 8.0]);
}

#[tokio::test]
async fn test_archived_deals_hidden_unless_requested() {
    let (storage, _td) = create_temp_storage().await;
    create_user(&storage, "promoter-3", UserType::Promoter).await;
    storage
        .insert_deal(&new_deal("promoter-3", "live", 24, 10.0))
        .await
        .unwrap();
    storage
        .insert_deal(&new_deal("promoter-3", "gone", -24, 10.0))
        .await
        .unwrap();

    assert_eq!(storage.archive_expired_deals(Utc::now()).await.unwrap(), 1);
    // 已归档的不再重复归档
    assert_eq!(storage.archive_expired_deals(Utc::now()).await.unwrap(), 0);

    let service = DealService::new(storage);
    let page = service.list_deals(query(1, 10)).await.unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.deals[0].title, "live");

    let with_archived = service
        .list_deals(DealListQuery {
            include_archived: true,
            ..query(1, 10)
        })
        .await
        .unwrap();
    assert_eq!(with_archived.total, 2);
    assert!(with_archived.deals[1].archived_at.is_some());
}

#[tokio::test]
async fn test_search_and_category_filters() {
    let (storage, _td) = create_temp_storage().await;
    create_user(&storage, "promoter-4", UserType::Promoter).await;
    storage
        .insert_deal(&new_deal("promoter-4", "Espresso machine", 24, 99.0))
        .await
        .unwrap();
    let mut tv = new_deal("promoter-4", "OLED TV", 24, 899.0);
    tv.category = "electronics".to_string();
    storage.insert_deal(&tv).await.unwrap();
    let service = DealService::new(storage);

    let found = service
        .list_deals(DealListQuery {
            search: Some("espresso".to_string()),
            ..query(1, 10)
        })
        .await
        .unwrap();
    assert_eq!(found.total, 1);

    let electronics = service
        .list_deals(DealListQuery {
            category: Some("electronics".to_string()),
            ..query(1, 10)
        })
        .await
        .unwrap();
    assert_eq!(electronics.deals.len(), 1);
    assert_eq!(electronics.deals[0].title, "OLED TV");

    let all = service
        .list_deals(DealListQuery {
            category: Some("all".to_string()),
            ..query(1, 10)
        })
        .await
        .unwrap();
    assert_eq!(all.total, 2);
}

// =============================================================================
// 创建与更新
// =============================================================================

#[tokio::test]
async fn test_create_deal_computes_discount() {
    let (storage, _td) = create_temp_storage().await;
    create_user(&storage, "promoter-5", UserType::Promoter).await;
    let service = DealService::new(storage);

    let deal = service
        .create_deal(
            "promoter-5",
            create_request(json!({
                "title": "  Air fryer  ",
                "category": "kitchen",
                "current_price": "59,90",
                "retail_price": 119.8,
                "expiry_date": "2099-12-31",
                "affiliate_link": "https://shop.example.com/airfryer?ref=p5"
            })),
        )
        .await
        .unwrap();

    assert_eq!(deal.title, "Air fryer");
    assert_eq!(deal.current_price, 59.9);
    assert_eq!(deal.discount_percentage, 50);
    assert!(!deal.is_expired);
}

#[tokio::test]
async fn test_create_deal_rejections() {
    let (storage, _td) = create_temp_storage().await;
    create_user(&storage, "promoter-6", UserType::Promoter).await;
    create_user(&storage, "shopper-6", UserType::Shopper).await;
    let service = DealService::new(storage);

    let valid = json!({
        "title": "Blender",
        "category": "kitchen",
        "current_price": 30,
        "retail_price": 60,
        "expiry_date": "2099-01-01",
        "affiliate_link": "https://shop.example.com/blender"
    });

    let err = service
        .create_deal("shopper-6", create_request(valid.clone()))
        .await
        .unwrap_err();
    assert!(matches!(err, DealdropError::Forbidden(_)));

    let mut bad_link = valid.clone();
    bad_link["affiliate_link"] = json!("javascript:alert(1)");
    let err = service
        .create_deal("promoter-6", create_request(bad_link))
        .await
        .unwrap_err();
    assert!(matches!(err, DealdropError::InvalidAffiliateLink(_)));
    assert_eq!(err.message(), "Invalid or unsafe affiliate link");

    let mut bad_prices = valid.clone();
    bad_prices["retail_price"] = json!(20);
    let err = service
        .create_deal("promoter-6", create_request(bad_prices))
        .await
        .unwrap_err();
    assert_eq!(err.message(), "Retail price must be greater than current price");

    let mut missing_title = valid;
    missing_title["title"] = json!("   ");
    let err = service
        .create_deal("promoter-6", create_request(missing_title))
        .await
        .unwrap_err();
    assert_eq!(err.message(), "Missing required field 'title'");
}

#[tokio::test]
async fn test_update_deal_owner_only() {
    let (storage, _td) = create_temp_storage().await;
    create_user(&storage, "owner", UserType::Promoter).await;
    create_user(&storage, "rival", UserType::Promoter).await;
    let deal = storage
        .insert_deal(&new_deal("owner", "Desk lamp", 24, 20.0))
        .await
        .unwrap();
    let service = DealService::new(storage);

    let update: UpdateDealRequest =
        serde_json::from_value(json!({ "current_price": 10 })).unwrap();

    let err = service
        .update_deal("rival", deal.id, update.clone())
        .await
        .unwrap_err();
    assert!(matches!(err, DealdropError::Forbidden(_)));

    let updated = service.update_deal("owner", deal.id, update).await.unwrap();
    assert_eq!(updated.current_price, 10.0);
    assert_eq!(updated.retail_price, 40.0);
    assert_eq!(updated.discount_percentage, 75);

    // 显式 null 清空描述
    let cleared = service
        .update_deal(
            "owner",
            deal.id,
            serde_json::from_value(json!({ "description": null })).unwrap(),
        )
        .await
        .unwrap();
    assert!(cleared.description.is_none());
    assert_eq!(cleared.title, "Desk lamp");
}

#[tokio::test]
async fn test_get_missing_deal() {
    let (storage, _td) = create_temp_storage().await;
    let service = DealService::new(storage);
    let err = service.get_deal(999).await.unwrap_err();
    assert!(matches!(err, DealdropError::NotFound(_)));
}
