//! v1 API 帮助函数

use actix_web::error::{InternalError, JsonPayloadError, QueryPayloadError};
use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse};
use serde::Serialize;
use tracing::error;

use crate::errors::DealdropError;

use super::error_code::ErrorCode;
use super::types::ApiResponse;

/// 构建 JSON 响应
pub fn json_response<T: Serialize>(
    status: StatusCode,
    code: ErrorCode,
    message: impl Into<String>,
    data: Option<T>,
) -> HttpResponse {
    HttpResponse::build(status)
        .append_header(("Content-Type", "application/json; charset=utf-8"))
        .json(ApiResponse {
            code: code as i32,
            message: message.into(),
            data,
        })
}

/// 构建成功响应
pub fn success_response<T: Serialize>(data: T) -> HttpResponse {
    json_response(StatusCode::OK, ErrorCode::Success, "OK", Some(data))
}

/// 201 Created
pub fn created_response<T: Serialize>(data: T) -> HttpResponse {
    json_response(StatusCode::CREATED, ErrorCode::Success, "Created", Some(data))
}

/// 构建错误响应
pub fn error_response(status: StatusCode, error_code: ErrorCode, message: &str) -> HttpResponse {
    json_response::<()>(status, error_code, message, None)
}

/// 从 DealdropError 构建错误响应（自动映射 HTTP 状态码和 ErrorCode）
///
/// 5xx 的内部细节只写日志，不返回给客户端。
pub fn error_from_dealdrop(err: &DealdropError) -> HttpResponse {
    let status = err.http_status();
    let error_code = ErrorCode::from(err);
    if status.is_server_error() {
        error!("API: {}", err);
        return error_response(status, error_code, "Internal server error");
    }
    error_response(status, error_code, err.message())
}

/// 统一 Result → HttpResponse 转换
///
/// 成功时返回 200 OK + JSON 数据，失败时自动映射 DealdropError。
pub fn api_result<T, E>(result: Result<T, E>) -> HttpResponse
where
    T: Serialize,
    E: Into<DealdropError>,
{
    match result {
        Ok(data) => success_response(data),
        Err(e) => {
            let err: DealdropError = e.into();
            error_from_dealdrop(&err)
        }
    }
}

/// JSON 请求体解析失败时也返回统一信封
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let resp = error_response(StatusCode::BAD_REQUEST, ErrorCode::BadRequest, &err.to_string());
    InternalError::from_response(err, resp).into()
}

pub fn query_error_handler(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let resp = error_response(StatusCode::BAD_REQUEST, ErrorCode::BadRequest, &err.to_string());
    InternalError::from_response(err, resp).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[actix_rt::test]
    async fn test_api_result_maps_errors() {
        let resp = api_result::<(), _>(Err(DealdropError::not_found("Deal 9 not found")));
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let body = to_bytes(resp.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["code"], ErrorCode::NotFound as i32);
        assert_eq!(json["message"], "Deal 9 not found");
        assert!(json.get("data").is_none());
    }

    #[actix_rt::test]
    async fn test_internal_errors_are_masked() {
        let resp = error_from_dealdrop(&DealdropError::database_operation("disk I/O error"));
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(resp.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["message"], "Internal server error");
    }

    #[actix_rt::test]
    async fn test_success_envelope() {
        let resp = success_response(serde_json::json!({"id": 1}));
        let body = to_bytes(resp.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["code"], 0);
        assert_eq!(json["data"]["id"], 1);
    }
}
