//! 图片上传存储
//!
//! 文件保存为 `<media.dir>/<uuid>.<ext>`，公开地址为
//! `<media.public_base_url>/media/<file>`。

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::config::get_config;
use crate::errors::{DealdropError, Result};
use crate::utils::url_validator::is_valid_image_file_with_limit;

#[derive(Debug, Clone, Serialize)]
pub struct StoredMedia {
    pub file_name: String,
    pub url: String,
    pub size: usize,
}

fn extension_for(mime: &str) -> &'static str {
    match mime.trim().to_lowercase().as_str() {
        "image/png" => "png",
        _ => "jpg",
    }
}

/// 按扩展名推断 Content-Type
pub fn content_type_for(file_name: &str) -> &'static str {
    if file_name.to_lowercase().ends_with(".png") {
        "image/png"
    } else {
        "image/jpeg"
    }
}

/// 只接受本服务生成的文件名（uuid + 扩展名），防止路径穿越
pub fn is_safe_file_name(file_name: &str) -> bool {
    let Some((stem, ext)) = file_name.rsplit_once('.') else {
        return false;
    };
    matches!(ext, "jpg" | "png") && uuid::Uuid::parse_str(stem).is_ok()
}

pub struct MediaStore {
    dir: PathBuf,
    public_base_url: String,
    max_bytes: usize,
}

impl MediaStore {
    pub fn new(dir: impl AsRef<Path>, public_base_url: &str, max_bytes: usize) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
            max_bytes,
        }
    }

    pub fn from_config() -> Self {
        let config = get_config();
        Self::new(
            &config.media.dir,
            &config.media.public_base_url,
            config.media.max_image_bytes,
        )
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// 校验并保存上传的图片
    pub async fn save_image(&self, mime: &str, data: &[u8]) -> Result<StoredMedia> {
        if !is_valid_image_file_with_limit(mime, data.len(), self.max_bytes) {
            return Err(DealdropError::invalid_image(format!(
                "Image must be JPEG or PNG and at most {} KB",
                self.max_bytes / 1024
            )));
        }

        tokio::fs::create_dir_all(&self.dir).await?;

        let file_name = format!("{}.{}", uuid::Uuid::new_v4(), extension_for(mime));
        tokio::fs::write(self.dir.join(&file_name), data).await?;

        info!("Stored media '{}' ({} bytes)", file_name, data.len());
        Ok(StoredMedia {
            url: format!("{}/media/{}", self.public_base_url, file_name),
            file_name,
            size: data.len(),
        })
    }

    /// 读取已保存的文件；文件名不合法或不存在时返回 NotFound
    pub async fn read(&self, file_name: &str) -> Result<Vec<u8>> {
        if !is_safe_file_name(file_name) {
            return Err(DealdropError::not_found("Media not found"));
        }
        match tokio::fs::read(self.dir.join(file_name)).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(DealdropError::not_found("Media not found"))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_file_names() {
        let name = format!("{}.png", uuid::Uuid::new_v4());
        assert!(is_safe_file_name(&name));
        assert!(!is_safe_file_name("../config.toml"));
        assert!(!is_safe_file_name("abc.png"));
        assert!(!is_safe_file_name(&format!("{}.gif", uuid::Uuid::new_v4())));
    }

    #[tokio::test]
    async fn test_save_and_read() {
        let dir = tempfile::tempdir().unwrap();
        let store = MediaStore::new(dir.path(), "https://deals.example.com/", 1024);

        let stored = store.save_image("image/png", &[1, 2, 3]).await.unwrap();
        assert!(stored.file_name.ends_with(".png"));
        assert_eq!(
            stored.url,
            format!("https://deals.example.com/media/{}", stored.file_name)
        );
        assert_eq!(store.read(&stored.file_name).await.unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_rejects_invalid_images() {
        let dir = tempfile::tempdir().unwrap();
        let store = MediaStore::new(dir.path(), "https://deals.example.com", 4);

        let err = store.save_image("image/gif", &[1]).await.unwrap_err();
        assert!(matches!(err, DealdropError::InvalidImage(_)));

        let err = store.save_image("image/jpeg", &[0; 5]).await.unwrap_err();
        assert!(matches!(err, DealdropError::InvalidImage(_)));

        let missing = format!("{}.jpg", uuid::Uuid::new_v4());
        assert!(matches!(
            store.read(&missing).await.unwrap_err(),
            DealdropError::NotFound(_)
        ));
    }
}
