//! Deal 列表与 CRUD

use actix_web::{HttpResponse, Result as ActixResult, web};
use std::sync::Arc;
use tracing::{info, trace};

use crate::api::middleware::Identity;
use crate::services::{CreateDealRequest, DealListQuery, DealService, UpdateDealRequest};

use super::helpers::{api_result, created_response, error_from_dealdrop};

/// 获取 deal 列表（过滤、排序、分页；不足一页时用已过期 deal 补齐）
pub async fn list_deals(
    query: web::Query<DealListQuery>,
    deals: web::Data<Arc<DealService>>,
) -> ActixResult<HttpResponse> {
    trace!("API: list deals with filters: {:?}", query);
    Ok(api_result(deals.list_deals(query.into_inner()).await))
}

pub async fn get_deal(
    path: web::Path<i64>,
    deals: web::Data<Arc<DealService>>,
) -> ActixResult<HttpResponse> {
    Ok(api_result(deals.get_deal(path.into_inner()).await))
}

pub async fn create_deal(
    identity: Identity,
    body: web::Json<CreateDealRequest>,
    deals: web::Data<Arc<DealService>>,
) -> ActixResult<HttpResponse> {
    let user_id = match identity.require_user() {
        Ok(id) => id,
        Err(e) => return Ok(error_from_dealdrop(&e)),
    };

    Ok(match deals.create_deal(user_id, body.into_inner()).await {
        Ok(deal) => {
            info!("API: deal {} created by {}", deal.id, user_id);
            created_response(deal)
        }
        Err(e) => error_from_dealdrop(&e),
    })
}

pub async fn update_deal(
    identity: Identity,
    path: web::Path<i64>,
    body: web::Json<UpdateDealRequest>,
    deals: web::Data<Arc<DealService>>,
) -> ActixResult<HttpResponse> {
    let user_id = match identity.require_user() {
        Ok(id) => id,
        Err(e) => return Ok(error_from_dealdrop(&e)),
    };
    Ok(api_result(
        deals
            .update_deal(user_id, path.into_inner(), body.into_inner())
            .await,
    ))
}

/// 当前用户收藏的 deal
pub async fn saved_deals(
    identity: Identity,
    deals: web::Data<Arc<DealService>>,
) -> ActixResult<HttpResponse> {
    let user_id = match identity.require_user() {
        Ok(id) => id,
        Err(e) => return Ok(error_from_dealdrop(&e)),
    };
    Ok(api_result(deals.saved_deals(user_id).await))
}
