//! URL 与图片校验
//!
//! - `validate_url`: 只允许 http/https，阻止危险协议
//! - `is_valid_affiliate_link`: 推广链接（必须有主机名）
//! - `is_valid_image_url`: https 图片地址，扩展名 jpg/jpeg/png
//! - `is_valid_image_file`: 上传图片的 MIME 与大小

use url::Url;

/// 推广链接校验失败时展示给用户的消息
pub const AFFILIATE_LINK_ERROR: &str = "Invalid or unsafe affiliate link";

/// 上传图片允许的 MIME 类型
pub const ALLOWED_IMAGE_MIME_TYPES: &[&str] = &["image/jpeg", "image/png", "image/jpg"];

/// 上传图片大小上限（1 MiB）
pub const MAX_IMAGE_BYTES: usize = 1024 * 1024;

const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png"];

/// URL 验证错误
#[derive(Debug)]
pub enum UrlValidationError {
    EmptyUrl,
    InvalidProtocol(String),
    DangerousProtocol(String),
    InvalidFormat(String),
    MissingHost,
}

impl std::fmt::Display for UrlValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyUrl => write!(f, "URL cannot be empty"),
            Self::InvalidProtocol(proto) => write!(
                f,
                "Invalid protocol: {}. Only http:// and https:// are allowed",
                proto
            ),
            Self::DangerousProtocol(proto) => {
                write!(f, "Dangerous protocol blocked: {}", proto)
            }
            Self::InvalidFormat(msg) => write!(f, "Invalid URL format: {}", msg),
            Self::MissingHost => write!(f, "URL has no host"),
        }
    }
}

impl std::error::Error for UrlValidationError {}

/// 危险协议列表
const DANGEROUS_PROTOCOLS: &[&str] = &[
    "javascript:",
    "data:",
    "file:",
    "vbscript:",
    "about:",
    "blob:",
];

/// 验证 URL 安全性并返回解析结果
///
/// 检查项目：
/// 1. URL 不为空
/// 2. 不是危险协议（javascript:, data:, file: 等）
/// 3. 必须是 http:// 或 https://
/// 4. URL 格式有效
pub fn validate_url(url: &str) -> Result<Url, UrlValidationError> {
    let url = url.trim();

    if url.is_empty() {
        return Err(UrlValidationError::EmptyUrl);
    }

    let url_lower = url.to_lowercase();

    if let Some(proto) = DANGEROUS_PROTOCOLS
        .iter()
        .find(|proto| url_lower.starts_with(*proto))
    {
        return Err(UrlValidationError::DangerousProtocol(proto.to_string()));
    }

    if !url_lower.starts_with("http://") && !url_lower.starts_with("https://") {
        let proto = url_lower
            .split(':')
            .next()
            .map(|s| format!("{}:", s))
            .unwrap_or_default();
        return Err(UrlValidationError::InvalidProtocol(proto));
    }

    Url::parse(url).map_err(|e| UrlValidationError::InvalidFormat(e.to_string()))
}

/// 推广链接：通过 `validate_url` 且带主机名
pub fn validate_affiliate_link(url: &str) -> Result<Url, UrlValidationError> {
    let parsed = validate_url(url)?;
    match parsed.host_str() {
        Some(host) if !host.is_empty() => Ok(parsed),
        _ => Err(UrlValidationError::MissingHost),
    }
}

pub fn is_valid_affiliate_link(url: &str) -> bool {
    validate_affiliate_link(url).is_ok()
}

/// https 图片地址，路径以 .jpg / .jpeg / .png 结尾（不区分大小写）
///
/// 只看路径部分，查询串（如 CDN 缩放参数）不影响判断。
pub fn is_valid_image_url(url: &str) -> bool {
    let Ok(parsed) = validate_url(url) else {
        return false;
    };
    if parsed.scheme() != "https" || parsed.host_str().is_none() {
        return false;
    }
    let path = parsed.path().to_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

/// 上传图片：MIME 在白名单内且大小不超过 `max_bytes`
pub fn is_valid_image_file_with_limit(mime: &str, size: usize, max_bytes: usize) -> bool {
    let mime = mime.trim().to_lowercase();
    ALLOWED_IMAGE_MIME_TYPES.contains(&mime.as_str()) && size <= max_bytes
}

pub fn is_valid_image_file(mime: &str, size: usize) -> bool {
    is_valid_image_file_with_limit(mime, size, MAX_IMAGE_BYTES)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_url_examples() {
        assert!(is_valid_image_url("https://x.com/a.png"));
        assert!(!is_valid_image_url("http://x.com/a.png"));
        assert!(!is_valid_image_url("https://x.com/a.gif"));
    }

    #[test]
    fn test_image_url_extensions_and_case() {
        assert!(is_valid_image_url("https://cdn.shop.com/img/photo.JPG"));
        assert!(is_valid_image_url("https://cdn.shop.com/img/photo.jpeg"));
        assert!(is_valid_image_url("https://cdn.shop.com/p.png?w=400&h=400"));
        assert!(!is_valid_image_url("https://cdn.shop.com/photo.png/view"));
        assert!(!is_valid_image_url("https://cdn.shop.com/photo"));
        assert!(!is_valid_image_url(""));
        assert!(!is_valid_image_url("javascript:alert('a.png')"));
    }

    #[test]
    fn test_image_file_limits() {
        assert!(is_valid_image_file("image/jpeg", 500 * 1024));
        assert!(is_valid_image_file("image/png", MAX_IMAGE_BYTES));
        assert!(is_valid_image_file("image/jpg", 1));
        assert!(is_valid_image_file("IMAGE/PNG", 10));
        assert!(!is_valid_image_file("image/png", MAX_IMAGE_BYTES + 1));
        assert!(!is_valid_image_file("image/gif", 10));
        assert!(!is_valid_image_file("application/pdf", 10));
    }

    #[test]
    fn test_affiliate_links() {
        assert!(is_valid_affiliate_link("https://amazon.com/dp/B0001?tag=promo-20"));
        assert!(is_valid_affiliate_link("http://shop.example.com/item/42"));
        assert!(!is_valid_affiliate_link("javascript:alert(1)"));
        assert!(!is_valid_affiliate_link("data:text/html,<b>x</b>"));
        assert!(!is_valid_affiliate_link("ftp://files.example.com/deal"));
        assert!(!is_valid_affiliate_link("not a url"));
        assert!(!is_valid_affiliate_link("   "));
    }

    #[test]
    fn test_dangerous_protocols_are_reported() {
        assert!(matches!(
            validate_url("JAVASCRIPT:alert(1)"),
            Err(UrlValidationError::DangerousProtocol(_))
        ));
        assert!(matches!(
            validate_url("file:///etc/passwd"),
            Err(UrlValidationError::DangerousProtocol(_))
        ));
        assert!(matches!(
            validate_url("mailto:someone@example.com"),
            Err(UrlValidationError::InvalidProtocol(_))
        ));
    }
}
