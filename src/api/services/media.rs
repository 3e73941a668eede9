//! 已上传图片的读取

use actix_web::{HttpResponse, Result as ActixResult, web};
use std::sync::Arc;
use tracing::trace;

use crate::services::{MediaStore, content_type_for};

use super::v1::error_from_dealdrop;

pub async fn serve_media(
    path: web::Path<String>,
    media: web::Data<Arc<MediaStore>>,
) -> ActixResult<HttpResponse> {
    let file_name = path.into_inner();
    trace!("Serving media '{}'", file_name);

    Ok(match media.read(&file_name).await {
        Ok(bytes) => HttpResponse::Ok()
            .content_type(content_type_for(&file_name))
            .append_header(("Cache-Control", "public, max-age=31536000, immutable"))
            .body(bytes),
        Err(e) => error_from_dealdrop(&e),
    })
}

pub fn media_routes() -> actix_web::Scope {
    web::scope("/media").route("/{file}", web::get().to(serve_media))
}
