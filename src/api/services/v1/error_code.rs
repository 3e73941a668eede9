//! 统一 API 错误码定义

use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::errors::DealdropError;

/// API 错误码枚举
///
/// 使用 serde_repr 序列化为数字，按千位分域：
/// - 0: 成功
/// - 1000-1099: 通用错误
/// - 2000-2099: 认证错误
/// - 3000-3099: Deal 错误
/// - 4000-4099: 上传错误
/// - 6000-6099: Analytics 错误
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(i32)]
pub enum ErrorCode {
    // 成功
    Success = 0,

    // 通用错误 1000-1099
    BadRequest = 1000,
    Unauthorized = 1001,
    Forbidden = 1003,
    NotFound = 1004,
    InternalServerError = 1005,
    Conflict = 1009,
    FileTooLarge = 1011,
    InvalidDateFormat = 1012,
    ServiceUnavailable = 1030,

    // 认证错误 2000-2099
    AuthFailed = 2000,
    RateLimitExceeded = 2004,

    // Deal 错误 3000-3099
    DealInvalidAffiliateLink = 3001,
    DealInvalidImage = 3002,

    // 上传错误 4000-4099
    InvalidMultipartData = 4002,
    FileReadError = 4003,
    FileMissing = 4004,
    SpreadsheetParseError = 4005,

    // Analytics 错误 6000-6099
    AnalyticsRecordFailed = 6000,
}

impl From<&DealdropError> for ErrorCode {
    fn from(err: &DealdropError) -> Self {
        match err {
            DealdropError::Validation(_) => ErrorCode::BadRequest,
            DealdropError::NotFound(_) => ErrorCode::NotFound,
            DealdropError::Conflict(_) => ErrorCode::Conflict,
            DealdropError::Unauthorized(_) => ErrorCode::Unauthorized,
            DealdropError::Forbidden(_) => ErrorCode::Forbidden,
            DealdropError::DateParse(_) => ErrorCode::InvalidDateFormat,
            DealdropError::InvalidAffiliateLink(_) => ErrorCode::DealInvalidAffiliateLink,
            DealdropError::InvalidImage(_) => ErrorCode::DealInvalidImage,
            DealdropError::SpreadsheetParse(_) => ErrorCode::SpreadsheetParseError,
            DealdropError::FileTooLarge(_) => ErrorCode::FileTooLarge,
            DealdropError::FileOperation(_) => ErrorCode::FileReadError,
            DealdropError::DatabaseConfig(_)
            | DealdropError::DatabaseConnection(_)
            | DealdropError::DatabaseOperation(_)
            | DealdropError::Serialization(_)
            | DealdropError::PasswordHash(_) => ErrorCode::InternalServerError,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_as_number() {
        assert_eq!(serde_json::to_string(&ErrorCode::Success).unwrap(), "0");
        assert_eq!(
            serde_json::to_string(&ErrorCode::DealInvalidAffiliateLink).unwrap(),
            "3001"
        );
    }

    #[test]
    fn test_from_error() {
        assert_eq!(
            ErrorCode::from(&DealdropError::conflict("taken")),
            ErrorCode::Conflict
        );
        assert_eq!(
            ErrorCode::from(&DealdropError::invalid_affiliate_link("x")),
            ErrorCode::DealInvalidAffiliateLink
        );
        assert_eq!(
            ErrorCode::from(&DealdropError::database_operation("x")),
            ErrorCode::InternalServerError
        );
    }
}
