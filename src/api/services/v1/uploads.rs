//! multipart 上传：批量导入 deal 与图片

use actix_multipart::{Field, Multipart};
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, Result as ActixResult, web};
use futures_util::StreamExt;
use std::sync::Arc;
use tracing::{error, info};

use crate::api::middleware::Identity;
use crate::config::get_config;
use crate::errors::DealdropError;
use crate::services::{BulkUploadService, MediaStore};

use super::error_code::ErrorCode;
use super::helpers::{created_response, error_from_dealdrop, error_response, success_response};

/// multipart 中读到的文件
struct UploadedFile {
    filename: Option<String>,
    content_type: Option<String>,
    data: Vec<u8>,
}

/// 读取单个字段，超过 `limit` 字节返回 FileTooLarge
async fn read_field(field: &mut Field, limit: usize) -> Result<Vec<u8>, HttpResponse> {
    let mut data = Vec::new();
    while let Some(chunk) = field.next().await {
        match chunk {
            Ok(bytes) => {
                if data.len() + bytes.len() > limit {
                    return Err(error_response(
                        StatusCode::PAYLOAD_TOO_LARGE,
                        ErrorCode::FileTooLarge,
                        &format!("File size exceeds maximum {} KB", limit / 1024),
                    ));
                }
                data.extend_from_slice(&bytes);
            }
            Err(e) => {
                error!("Failed to read file chunk: {}", e);
                return Err(error_response(
                    StatusCode::BAD_REQUEST,
                    ErrorCode::FileReadError,
                    &format!("Failed to read file: {}", e),
                ));
            }
        }
    }
    Ok(data)
}

/// 取出名为 `file` 的字段，其它字段忽略
async fn read_file_field(
    mut payload: Multipart,
    limit: usize,
) -> Result<UploadedFile, HttpResponse> {
    let mut file: Option<UploadedFile> = None;

    while let Some(item) = payload.next().await {
        let mut field = match item {
            Ok(f) => f,
            Err(e) => {
                error!("Failed to parse multipart field: {}", e);
                return Err(error_response(
                    StatusCode::BAD_REQUEST,
                    ErrorCode::InvalidMultipartData,
                    &format!("Invalid multipart data: {}", e),
                ));
            }
        };

        if field.name() != Some("file") {
            continue;
        }

        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(str::to_string);
        let content_type = field.content_type().map(|m| m.essence_str().to_string());
        let data = read_field(&mut field, limit).await?;
        file = Some(UploadedFile {
            filename,
            content_type,
            data,
        });
    }

    match file {
        Some(f) if !f.data.is_empty() => Ok(f),
        _ => Err(error_response(
            StatusCode::BAD_REQUEST,
            ErrorCode::FileMissing,
            "No file provided",
        )),
    }
}

/// 推广者批量上传 CSV / XLSX
pub async fn bulk_upload(
    identity: Identity,
    payload: Multipart,
    uploads: web::Data<Arc<BulkUploadService>>,
) -> ActixResult<HttpResponse> {
    let user_id = match identity.require_user() {
        Ok(id) => id,
        Err(e) => return Ok(error_from_dealdrop(&e)),
    };

    let file = match read_file_field(payload, get_config().media.max_upload_bytes).await {
        Ok(f) => f,
        Err(resp) => return Ok(resp),
    };

    info!(
        "API: bulk upload '{}' ({} bytes) from {}",
        file.filename.as_deref().unwrap_or("<unnamed>"),
        file.data.len(),
        user_id
    );

    Ok(
        match uploads
            .upload(user_id, file.filename.as_deref(), &file.data)
            .await
        {
            Ok(report) => success_response(report),
            Err(e) => error_from_dealdrop(&e),
        },
    )
}

/// 登录用户上传图片（头像、deal 图片）
pub async fn upload_media(
    identity: Identity,
    payload: Multipart,
    media: web::Data<Arc<MediaStore>>,
) -> ActixResult<HttpResponse> {
    if let Err(e) = identity.require_user() {
        return Ok(error_from_dealdrop(&e));
    }

    let file = match read_file_field(payload, media.max_bytes()).await {
        Ok(f) => f,
        Err(resp) => return Ok(resp),
    };

    let Some(mime) = file.content_type.as_deref() else {
        return Ok(error_from_dealdrop(&DealdropError::invalid_image(
            "Missing image content type",
        )));
    };

    Ok(match media.save_image(mime, &file.data).await {
        Ok(stored) => created_response(stored),
        Err(e) => error_from_dealdrop(&e),
    })
}
