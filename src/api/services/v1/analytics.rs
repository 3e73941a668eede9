//! Analytics 端点
//!
//! 事件上报失败不影响页面：总是返回成功，`recorded` 表示是否实际写入。

use actix_web::{HttpResponse, Result as ActixResult, web};
use std::sync::Arc;
use tracing::{debug, error};

use crate::api::middleware::Identity;
use crate::services::AnalyticsService;

use super::helpers::{api_result, error_from_dealdrop, success_response};
use super::types::{EventBody, EventRecorded, SummaryQuery};

pub async fn record_event(
    identity: Identity,
    path: web::Path<i64>,
    body: web::Json<EventBody>,
    analytics: web::Data<Arc<AnalyticsService>>,
) -> ActixResult<HttpResponse> {
    let deal_id = path.into_inner();
    let event_type = body.event_type;

    let recorded = match analytics
        .record_event(deal_id, event_type, &identity.event_context())
        .await
    {
        Ok(recorded) => {
            debug!(
                "API: {} event on deal {} recorded={}",
                event_type, deal_id, recorded
            );
            recorded
        }
        Err(e) => {
            error!(
                "API: failed to record {} event on deal {}: {}",
                event_type, deal_id, e
            );
            false
        }
    };

    Ok(success_response(EventRecorded { recorded }))
}

/// 推广者最近 N 天的统计
pub async fn promoter_summary(
    identity: Identity,
    query: web::Query<SummaryQuery>,
    analytics: web::Data<Arc<AnalyticsService>>,
) -> ActixResult<HttpResponse> {
    let user_id = match identity.require_user() {
        Ok(id) => id,
        Err(e) => return Ok(error_from_dealdrop(&e)),
    };
    Ok(api_result(
        analytics.promoter_summary(user_id, query.days).await,
    ))
}
