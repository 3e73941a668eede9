//! Deal 的查询与写入

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, FromQueryResult, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Select, TransactionTrait, sea_query::Expr,
};
use tracing::{debug, info};

use super::converters::{apply_deal_changes, deal_to_active_model, model_to_deal};
use super::{SeaOrmStorage, retry};
use crate::errors::{DealdropError, Result};
use crate::storage::models::{Deal, DealChanges, DealFilter, DealSort, NewDeal};

use migration::entities::{deal, deal_interaction, deal_save};

/// 单条 INSERT 的行数上限，避免超出数据库的绑定参数限制
const BULK_INSERT_BATCH_SIZE: usize = 500;

/// 投票统计结果行
#[derive(Debug, FromQueryResult)]
struct VoteRow {
    deal_id: i64,
    is_helpful: bool,
    count: i64,
}

/// 列表查询窗口：未过期、已过期或不区分
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryWindow {
    Active,
    Expired,
    Any,
}

fn build_condition(filter: &DealFilter, window: ExpiryWindow, now: DateTime<Utc>) -> Condition {
    let mut condition = Condition::all();

    if let Some(ref search) = filter.search {
        condition = condition.add(
            Condition::any()
                .add(deal::Column::Title.contains(search))
                .add(deal::Column::Description.contains(search)),
        );
    }

    if let Some(ref category) = filter.category {
        condition = condition.add(deal::Column::Category.eq(category.as_str()));
    }

    if let Some(after) = filter.created_after {
        condition = condition.add(deal::Column::CreatedAt.gte(after));
    }

    if let Some(ref promoter_id) = filter.promoter_id {
        condition = condition.add(deal::Column::PromoterId.eq(promoter_id.as_str()));
    }

    if !filter.include_archived {
        condition = condition.add(deal::Column::ArchivedAt.is_null());
    }

    match window {
        ExpiryWindow::Active => condition.add(deal::Column::ExpiryDate.gte(now)),
        ExpiryWindow::Expired => condition.add(deal::Column::ExpiryDate.lt(now)),
        ExpiryWindow::Any => condition,
    }
}

fn apply_sort(select: Select<deal::Entity>, sort: DealSort) -> Select<deal::Entity> {
    let select = match sort {
        DealSort::Newest => select.order_by_desc(deal::Column::CreatedAt),
        DealSort::PriceAsc => select.order_by_asc(deal::Column::CurrentPrice),
        DealSort::PriceDesc => select.order_by_desc(deal::Column::CurrentPrice),
        DealSort::Discount => select.order_by_desc(deal::Column::DiscountPercentage),
    };
    // 稳定分页
    select.order_by_desc(deal::Column::Id)
}

impl SeaOrmStorage {
    pub async fn insert_deal(&self, new_deal: &NewDeal) -> Result<Deal> {
        let now = Utc::now();
        let db = &self.db;

        let model = retry::with_retry("insert_deal", self.retry_config, || async {
            deal_to_active_model(new_deal, now).insert(db).await
        })
        .await?;

        self.invalidate_count_cache();
        info!("Deal created: id={}, promoter={}", model.id, model.promoter_id);
        Ok(model_to_deal(model, now))
    }

    /// 批量插入（单事务，全部成功或全部回滚）
    pub async fn bulk_insert_deals(&self, deals: &[NewDeal]) -> Result<u64> {
        if deals.is_empty() {
            return Ok(0);
        }

        let now = Utc::now();
        let db = &self.db;

        retry::with_retry("bulk_insert_deals", self.retry_config, || async {
            let txn = db.begin().await?;
            for chunk in deals.chunks(BULK_INSERT_BATCH_SIZE) {
                let active_models: Vec<deal::ActiveModel> = chunk
                    .iter()
                    .map(|d| deal_to_active_model(d, now))
                    .collect();
                deal::Entity::insert_many(active_models).exec(&txn).await?;
            }
            txn.commit().await
        })
        .await
        .map_err(|e| DealdropError::database_operation(format!("批量插入 deal 失败: {}", e)))?;

        self.invalidate_count_cache();
        info!("Bulk inserted {} deals", deals.len());
        Ok(deals.len() as u64)
    }

    pub async fn find_deal(&self, id: i64) -> Result<Option<deal::Model>> {
        let db = &self.db;
        let model = retry::with_retry(&format!("find_deal({})", id), self.retry_config, || async {
            deal::Entity::find_by_id(id).one(db).await
        })
        .await?;
        Ok(model)
    }

    /// 读取单个 deal 并附带投票数
    pub async fn load_deal(&self, id: i64, now: DateTime<Utc>) -> Result<Option<Deal>> {
        let Some(model) = self.find_deal(id).await? else {
            return Ok(None);
        };
        let mut deals = [model_to_deal(model, now)];
        self.attach_vote_counts(&mut deals).await?;
        let [deal] = deals;
        Ok(Some(deal))
    }

    pub async fn update_deal(&self, id: i64, changes: DealChanges) -> Result<Deal> {
        let now = Utc::now();
        let model = self
            .find_deal(id)
            .await?
            .ok_or_else(|| DealdropError::not_found(format!("Deal {} not found", id)))?;

        let mut active: deal::ActiveModel = model.into();
        apply_deal_changes(&mut active, changes, now);

        let updated = active.update(&self.db).await?;

        self.invalidate_count_cache();
        info!("Deal updated: id={}", id);
        Ok(model_to_deal(updated, now))
    }

    /// 统计窗口内 deal 数量
    ///
    /// 只有与 `now` 无关的计数才进 COUNT 缓存：`Any` 窗口且没有年龄窗口。
    /// 过期边界随时间移动，Active/Expired 计数每次实时查询。
    pub async fn count_deals(
        &self,
        filter: &DealFilter,
        window: ExpiryWindow,
        now: DateTime<Utc>,
    ) -> Result<u64> {
        let cache_key = match window {
            ExpiryWindow::Any => filter.cache_key(),
            _ => None,
        };
        if let Some(ref key) = cache_key
            && let Some(cached) = self.count_cache.get(key)
        {
            debug!("count cache hit: key={}, value={}", key, cached);
            return Ok(cached);
        }

        let db = &self.db;
        let condition = build_condition(filter, window, now);
        let count = retry::with_retry("count_deals", self.retry_config, || async {
            deal::Entity::find()
                .filter(condition.clone())
                .count(db)
                .await
        })
        .await?;

        if let Some(key) = cache_key {
            self.count_cache.insert(key, count);
        }
        Ok(count)
    }

    /// 按窗口查询一段 deal（offset/limit）
    pub async fn query_deals(
        &self,
        filter: &DealFilter,
        window: ExpiryWindow,
        now: DateTime<Utc>,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Deal>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let db = &self.db;
        let condition = build_condition(filter, window, now);
        let models = retry::with_retry("query_deals", self.retry_config, || async {
            apply_sort(deal::Entity::find().filter(condition.clone()), filter.sort)
                .offset(offset)
                .limit(limit)
                .all(db)
                .await
        })
        .await?;

        Ok(models.into_iter().map(|m| model_to_deal(m, now)).collect())
    }

    /// 一次分组查询得到多个 deal 的 (有用, 没用) 票数
    pub async fn vote_counts(&self, deal_ids: &[i64]) -> Result<HashMap<i64, (u64, u64)>> {
        if deal_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = deal_interaction::Entity::find()
            .select_only()
            .column(deal_interaction::Column::DealId)
            .column(deal_interaction::Column::IsHelpful)
            .column_as(deal_interaction::Column::Id.count(), "count")
            .filter(deal_interaction::Column::DealId.is_in(deal_ids.iter().copied()))
            .filter(deal_interaction::Column::IsHelpful.is_not_null())
            .group_by(deal_interaction::Column::DealId)
            .group_by(deal_interaction::Column::IsHelpful)
            .into_model::<VoteRow>()
            .all(&self.db)
            .await?;

        let mut counts: HashMap<i64, (u64, u64)> = HashMap::new();
        for row in rows {
            let entry = counts.entry(row.deal_id).or_default();
            if row.is_helpful {
                entry.0 += row.count.max(0) as u64;
            } else {
                entry.1 += row.count.max(0) as u64;
            }
        }
        Ok(counts)
    }

    /// 给 deal 补上投票数
    pub async fn attach_vote_counts(&self, deals: &mut [Deal]) -> Result<()> {
        let ids: Vec<i64> = deals.iter().map(|d| d.id).collect();
        let counts = self.vote_counts(&ids).await?;
        for deal in deals.iter_mut() {
            if let Some((helpful, not_helpful)) = counts.get(&deal.id) {
                deal.helpful_count = *helpful;
                deal.not_helpful_count = *not_helpful;
            }
        }
        Ok(())
    }

    /// 用户收藏的 deal（按收藏时间倒序）
    pub async fn saved_deals(&self, user_id: &str, now: DateTime<Utc>) -> Result<Vec<Deal>> {
        let saves = deal_save::Entity::find()
            .filter(deal_save::Column::UserId.eq(user_id))
            .order_by_desc(deal_save::Column::CreatedAt)
            .all(&self.db)
            .await?;
        if saves.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = saves.iter().map(|s| s.deal_id).collect();
        let mut by_id: HashMap<i64, deal::Model> = deal::Entity::find()
            .filter(deal::Column::Id.is_in(ids.iter().copied()))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|m| (m.id, m))
            .collect();

        Ok(ids
            .into_iter()
            .filter_map(|id| by_id.remove(&id))
            .map(|m| model_to_deal(m, now))
            .collect())
    }

    /// 某个推广者的全部 deal id
    pub async fn promoter_deal_ids(&self, promoter_id: &str) -> Result<Vec<(i64, String)>> {
        let rows = deal::Entity::find()
            .select_only()
            .column(deal::Column::Id)
            .column(deal::Column::Title)
            .filter(deal::Column::PromoterId.eq(promoter_id))
            .order_by_desc(deal::Column::CreatedAt)
            .into_tuple::<(i64, String)>()
            .all(&self.db)
            .await?;
        Ok(rows)
    }

    /// 归档已过期且尚未归档的 deal，返回归档数量
    pub async fn archive_expired_deals(&self, now: DateTime<Utc>) -> Result<u64> {
        let db = &self.db;
        let result = retry::with_retry("archive_expired_deals", self.retry_config, || async {
            deal::Entity::update_many()
                .col_expr(deal::Column::ArchivedAt, Expr::value(now))
                .col_expr(deal::Column::UpdatedAt, Expr::value(now))
                .filter(deal::Column::ExpiryDate.lt(now))
                .filter(deal::Column::ArchivedAt.is_null())
                .exec(db)
                .await
        })
        .await
        .map_err(|e| DealdropError::database_operation(format!("归档过期 deal 失败: {}", e)))?;

        if result.rows_affected > 0 {
            self.invalidate_count_cache();
        }
        info!("Archived {} expired deals", result.rows_affected);
        Ok(result.rows_affected)
    }
}
