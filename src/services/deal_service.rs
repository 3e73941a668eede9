//! Deal 业务逻辑：列表（过期补位）、创建、更新、查询

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::import_validation::{
    DealField, DealFieldError, DealFieldsRaw, check_prices, compute_discount, parse_expiry_date,
    parse_price, validate_deal_fields,
};
use super::profile_service::require_promoter;
use crate::errors::{DealdropError, Result};
use crate::storage::backend::ExpiryWindow;
use crate::storage::{Deal, DealChanges, DealFilter, DealPage, DealSort, SeaOrmStorage};
use crate::utils::{is_valid_affiliate_link, is_valid_image_url, parse_age_window};

pub const DEFAULT_PAGE_SIZE: u64 = 12;
pub const MAX_PAGE_SIZE: u64 = 100;

// ============ Request/Response DTOs ============

/// 数字或文本形式的字段值（表单里价格可能是 "19,90"）
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl FieldValue {
    fn into_text(self) -> String {
        match self {
            FieldValue::Number(n) => n.to_string(),
            FieldValue::Text(s) => s,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateDealRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub current_price: Option<FieldValue>,
    pub retail_price: Option<FieldValue>,
    pub expiry_date: Option<String>,
    pub affiliate_link: Option<String>,
    pub image_url: Option<String>,
}

impl From<CreateDealRequest> for DealFieldsRaw {
    fn from(req: CreateDealRequest) -> Self {
        DealFieldsRaw {
            title: req.title,
            description: req.description,
            category: req.category,
            current_price: req.current_price.map(FieldValue::into_text),
            retail_price: req.retail_price.map(FieldValue::into_text),
            expiry_date: req.expiry_date,
            image_url: req.image_url,
            affiliate_link: req.affiliate_link,
        }
    }
}

/// 部分更新；description / image_url 显式 null 表示清空
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateDealRequest {
    pub title: Option<String>,
    #[serde(default, with = "crate::services::profile_service::double_option")]
    pub description: Option<Option<String>>,
    pub category: Option<String>,
    pub current_price: Option<FieldValue>,
    pub retail_price: Option<FieldValue>,
    pub expiry_date: Option<String>,
    pub affiliate_link: Option<String>,
    #[serde(default, with = "crate::services::profile_service::double_option")]
    pub image_url: Option<Option<String>>,
}

/// 列表查询参数
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DealListQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    /// 年龄窗口：`24h`、`7d`、`30d`、`all`
    pub age: Option<String>,
    pub promoter_id: Option<String>,
    pub sort: Option<DealSort>,
    #[serde(default)]
    pub include_archived: bool,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

impl DealListQuery {
    pub fn to_filter(&self, now: DateTime<Utc>) -> Result<DealFilter> {
        let created_after = match self.age.as_deref() {
            Some(age) => parse_age_window(age)?.map(|window| now - window),
            None => None,
        };

        Ok(DealFilter {
            search: non_empty(self.search.clone()),
            category: non_empty(self.category.clone()).filter(|c| c != "all"),
            created_after,
            promoter_id: non_empty(self.promoter_id.clone()),
            sort: self.sort.unwrap_or_default(),
            include_archived: self.include_archived,
        })
    }
}

/// 页码规范化：page >= 1，page_size 限制在 1..=100
pub fn normalize_paging(page: Option<u64>, page_size: Option<u64>) -> (u64, u64) {
    (
        page.unwrap_or(1).max(1),
        page_size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
    )
}

// ============ DealService Implementation ============

pub struct DealService {
    storage: Arc<SeaOrmStorage>,
}

impl DealService {
    pub fn new(storage: Arc<SeaOrmStorage>) -> Self {
        Self { storage }
    }

    /// 分页列表：未过期 deal 优先，不足一页时用已过期 deal 补齐
    pub async fn list_deals(&self, query: DealListQuery) -> Result<DealPage> {
        self.list_deals_at(query, Utc::now()).await
    }

    pub async fn list_deals_at(&self, query: DealListQuery, now: DateTime<Utc>) -> Result<DealPage> {
        let filter = query.to_filter(now)?;
        let (page, page_size) = normalize_paging(query.page, query.page_size);
        let offset = (page - 1) * page_size;

        // 总数可走缓存，未过期数按 now 实时统计，过期数由两者相减得到
        let total = self
            .storage
            .count_deals(&filter, ExpiryWindow::Any, now)
            .await?;
        let active_total = self
            .storage
            .count_deals(&filter, ExpiryWindow::Active, now)
            .await?
            .min(total);
        let expired_total = total - active_total;

        let mut deals = if offset < active_total {
            self.storage
                .query_deals(&filter, ExpiryWindow::Active, now, offset, page_size)
                .await?
        } else {
            Vec::new()
        };

        let remaining = page_size.saturating_sub(deals.len() as u64);
        if remaining > 0 && expired_total > 0 {
            let expired_offset = offset.saturating_sub(active_total);
            let padding = self
                .storage
                .query_deals(&filter, ExpiryWindow::Expired, now, expired_offset, remaining)
                .await?;
            debug!(
                "Deal list page {}: {} active, {} expired padding",
                page,
                deals.len(),
                padding.len()
            );
            deals.extend(padding);
        }

        self.storage.attach_vote_counts(&mut deals).await?;

        Ok(DealPage {
            deals,
            page,
            page_size,
            active_total,
            expired_total,
            total,
            total_pages: total.div_ceil(page_size),
        })
    }

    pub async fn get_deal(&self, id: i64) -> Result<Deal> {
        self.storage
            .load_deal(id, Utc::now())
            .await?
            .ok_or_else(|| DealdropError::not_found(format!("Deal {} not found", id)))
    }

    /// 推广者创建 deal，规则与批量上传一致
    pub async fn create_deal(&self, user_id: &str, req: CreateDealRequest) -> Result<Deal> {
        let promoter = require_promoter(&self.storage, user_id).await?;
        let new_deal = validate_deal_fields(&DealFieldsRaw::from(req), &promoter.id)?;
        self.storage.insert_deal(&new_deal).await
    }

    /// 仅 deal 所属推广者可以更新
    pub async fn update_deal(
        &self,
        user_id: &str,
        deal_id: i64,
        req: UpdateDealRequest,
    ) -> Result<Deal> {
        let promoter = require_promoter(&self.storage, user_id).await?;
        let existing = self
            .storage
            .find_deal(deal_id)
            .await?
            .ok_or_else(|| DealdropError::not_found(format!("Deal {} not found", deal_id)))?;

        if existing.promoter_id != promoter.id {
            return Err(DealdropError::forbidden("You can only edit your own deals"));
        }

        let mut changes = DealChanges::default();

        if let Some(title) = req.title {
            let title = non_empty(Some(title)).ok_or(DealFieldError::Missing(DealField::Title))?;
            changes.title = Some(title);
        }
        if let Some(category) = req.category {
            let category =
                non_empty(Some(category)).ok_or(DealFieldError::Missing(DealField::Category))?;
            changes.category = Some(category);
        }
        if let Some(description) = req.description {
            changes.description = Some(non_empty(description));
        }

        let current_price = match req.current_price {
            Some(value) => Some(
                parse_price(&value.into_text())
                    .ok_or(DealFieldError::InvalidNumber(DealField::CurrentPrice))?,
            ),
            None => None,
        };
        let retail_price = match req.retail_price {
            Some(value) => Some(
                parse_price(&value.into_text())
                    .ok_or(DealFieldError::InvalidNumber(DealField::RetailPrice))?,
            ),
            None => None,
        };
        if current_price.is_some() || retail_price.is_some() {
            let current = current_price.unwrap_or(existing.current_price);
            let retail = retail_price.unwrap_or(existing.retail_price);
            check_prices(current, retail)?;
            changes.current_price = current_price;
            changes.retail_price = retail_price;
            changes.discount_percentage = Some(compute_discount(current, retail));
        }

        if let Some(expiry) = req.expiry_date {
            changes.expiry_date =
                Some(parse_expiry_date(&expiry).ok_or(DealFieldError::InvalidDate)?);
        }

        if let Some(link) = req.affiliate_link {
            let link = link.trim().to_string();
            if !is_valid_affiliate_link(&link) {
                return Err(DealFieldError::InvalidAffiliateLink.into());
            }
            changes.affiliate_link = Some(link);
        }

        if let Some(image_url) = req.image_url {
            let image_url = non_empty(image_url);
            if let Some(ref url) = image_url
                && !is_valid_image_url(url)
            {
                return Err(DealFieldError::InvalidImageUrl.into());
            }
            changes.image_url = Some(image_url);
        }

        let mut deals = [self.storage.update_deal(deal_id, changes).await?];
        self.storage.attach_vote_counts(&mut deals).await?;
        let [deal] = deals;

        info!("DealService: promoter '{}' updated deal {}", promoter.id, deal_id);
        Ok(deal)
    }

    /// 用户收藏的 deal
    pub async fn saved_deals(&self, user_id: &str) -> Result<Vec<Deal>> {
        let mut deals = self.storage.saved_deals(user_id, Utc::now()).await?;
        self.storage.attach_vote_counts(&mut deals).await?;
        Ok(deals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_normalize_paging() {
        assert_eq!(normalize_paging(None, None), (1, DEFAULT_PAGE_SIZE));
        assert_eq!(normalize_paging(Some(0), Some(0)), (1, 1));
        assert_eq!(normalize_paging(Some(3), Some(500)), (3, MAX_PAGE_SIZE));
    }

    #[test]
    fn test_query_to_filter() {
        let now = Utc::now();
        let query = DealListQuery {
            search: Some("  fone ".to_string()),
            category: Some("all".to_string()),
            age: Some("7d".to_string()),
            sort: Some(DealSort::Discount),
            ..Default::default()
        };
        let filter = query.to_filter(now).unwrap();

        assert_eq!(filter.search.as_deref(), Some("fone"));
        assert!(filter.category.is_none());
        assert_eq!(filter.created_after, Some(now - Duration::days(7)));
        assert_eq!(filter.sort, DealSort::Discount);
        assert!(!filter.include_archived);
    }

    #[test]
    fn test_query_rejects_bad_age() {
        let query = DealListQuery {
            age: Some("forever".to_string()),
            ..Default::default()
        };
        assert!(query.to_filter(Utc::now()).is_err());
    }

    #[test]
    fn test_create_request_accepts_numbers_and_text() {
        let req: CreateDealRequest = serde_json::from_str(
            r#"{"title":"Mouse","category":"tech","current_price":10,"retail_price":"19,90",
                "expiry_date":"2030-01-01","affiliate_link":"https://shop.com/m"}"#,
        )
        .unwrap();
        let raw = DealFieldsRaw::from(req);
        assert_eq!(raw.get(DealField::CurrentPrice), Some("10"));
        assert_eq!(raw.get(DealField::RetailPrice), Some("19,90"));

        let deal = validate_deal_fields(&raw, "p-1").unwrap();
        assert_eq!(deal.discount_percentage, 50);
    }

    #[test]
    fn test_update_request_null_image() {
        let req: UpdateDealRequest = serde_json::from_str(r#"{"image_url": null}"#).unwrap();
        assert_eq!(req.image_url, Some(None));
        assert!(req.description.is_none());
    }
}
