use std::fmt;

use actix_web::http::StatusCode;

#[derive(Debug, Clone)]
pub enum DealdropError {
    DatabaseConfig(String),
    DatabaseConnection(String),
    DatabaseOperation(String),
    FileOperation(String),
    Validation(String),
    NotFound(String),
    Conflict(String),
    Unauthorized(String),
    Forbidden(String),
    Serialization(String),
    DateParse(String),
    InvalidAffiliateLink(String),
    InvalidImage(String),
    SpreadsheetParse(String),
    PasswordHash(String),
    FileTooLarge(String),
}

impl DealdropError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            DealdropError::DatabaseConfig(_) => "E001",
            DealdropError::DatabaseConnection(_) => "E002",
            DealdropError::DatabaseOperation(_) => "E003",
            DealdropError::FileOperation(_) => "E004",
            DealdropError::Validation(_) => "E005",
            DealdropError::NotFound(_) => "E006",
            DealdropError::Conflict(_) => "E007",
            DealdropError::Unauthorized(_) => "E008",
            DealdropError::Forbidden(_) => "E009",
            DealdropError::Serialization(_) => "E010",
            DealdropError::DateParse(_) => "E011",
            DealdropError::InvalidAffiliateLink(_) => "E012",
            DealdropError::InvalidImage(_) => "E013",
            DealdropError::SpreadsheetParse(_) => "E014",
            DealdropError::PasswordHash(_) => "E015",
            DealdropError::FileTooLarge(_) => "E016",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            DealdropError::DatabaseConfig(_) => "Database Configuration Error",
            DealdropError::DatabaseConnection(_) => "Database Connection Error",
            DealdropError::DatabaseOperation(_) => "Database Operation Error",
            DealdropError::FileOperation(_) => "File Operation Error",
            DealdropError::Validation(_) => "Validation Error",
            DealdropError::NotFound(_) => "Resource Not Found",
            DealdropError::Conflict(_) => "Conflict",
            DealdropError::Unauthorized(_) => "Unauthorized",
            DealdropError::Forbidden(_) => "Forbidden",
            DealdropError::Serialization(_) => "Serialization Error",
            DealdropError::DateParse(_) => "Date Parse Error",
            DealdropError::InvalidAffiliateLink(_) => "Invalid Affiliate Link",
            DealdropError::InvalidImage(_) => "Invalid Image",
            DealdropError::SpreadsheetParse(_) => "Spreadsheet Parse Error",
            DealdropError::PasswordHash(_) => "Password Hash Error",
            DealdropError::FileTooLarge(_) => "File Too Large",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            DealdropError::DatabaseConfig(msg)
            | DealdropError::DatabaseConnection(msg)
            | DealdropError::DatabaseOperation(msg)
            | DealdropError::FileOperation(msg)
            | DealdropError::Validation(msg)
            | DealdropError::NotFound(msg)
            | DealdropError::Conflict(msg)
            | DealdropError::Unauthorized(msg)
            | DealdropError::Forbidden(msg)
            | DealdropError::Serialization(msg)
            | DealdropError::DateParse(msg)
            | DealdropError::InvalidAffiliateLink(msg)
            | DealdropError::InvalidImage(msg)
            | DealdropError::SpreadsheetParse(msg)
            | DealdropError::PasswordHash(msg)
            | DealdropError::FileTooLarge(msg) => msg,
        }
    }

    /// 映射到 HTTP 状态码
    pub fn http_status(&self) -> StatusCode {
        match self {
            DealdropError::Validation(_)
            | DealdropError::DateParse(_)
            | DealdropError::InvalidAffiliateLink(_)
            | DealdropError::InvalidImage(_)
            | DealdropError::SpreadsheetParse(_) => StatusCode::BAD_REQUEST,
            DealdropError::NotFound(_) => StatusCode::NOT_FOUND,
            DealdropError::Conflict(_) => StatusCode::CONFLICT,
            DealdropError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            DealdropError::Forbidden(_) => StatusCode::FORBIDDEN,
            DealdropError::FileTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            DealdropError::DatabaseConfig(_)
            | DealdropError::DatabaseConnection(_)
            | DealdropError::DatabaseOperation(_)
            | DealdropError::FileOperation(_)
            | DealdropError::Serialization(_)
            | DealdropError::PasswordHash(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 格式化为彩色输出（用于启动失败时的终端输出）
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for DealdropError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for DealdropError {}

// 便捷的构造函数
impl DealdropError {
    pub fn database_config<T: Into<String>>(msg: T) -> Self {
        DealdropError::DatabaseConfig(msg.into())
    }

    pub fn database_connection<T: Into<String>>(msg: T) -> Self {
        DealdropError::DatabaseConnection(msg.into())
    }

    pub fn database_operation<T: Into<String>>(msg: T) -> Self {
        DealdropError::DatabaseOperation(msg.into())
    }

    pub fn file_operation<T: Into<String>>(msg: T) -> Self {
        DealdropError::FileOperation(msg.into())
    }

    pub fn validation<T: Into<String>>(msg: T) -> Self {
        DealdropError::Validation(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        DealdropError::NotFound(msg.into())
    }

    pub fn conflict<T: Into<String>>(msg: T) -> Self {
        DealdropError::Conflict(msg.into())
    }

    pub fn unauthorized<T: Into<String>>(msg: T) -> Self {
        DealdropError::Unauthorized(msg.into())
    }

    pub fn forbidden<T: Into<String>>(msg: T) -> Self {
        DealdropError::Forbidden(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        DealdropError::Serialization(msg.into())
    }

    pub fn date_parse<T: Into<String>>(msg: T) -> Self {
        DealdropError::DateParse(msg.into())
    }

    pub fn invalid_affiliate_link<T: Into<String>>(msg: T) -> Self {
        DealdropError::InvalidAffiliateLink(msg.into())
    }

    pub fn invalid_image<T: Into<String>>(msg: T) -> Self {
        DealdropError::InvalidImage(msg.into())
    }

    pub fn spreadsheet_parse<T: Into<String>>(msg: T) -> Self {
        DealdropError::SpreadsheetParse(msg.into())
    }

    pub fn password_hash<T: Into<String>>(msg: T) -> Self {
        DealdropError::PasswordHash(msg.into())
    }

    pub fn file_too_large<T: Into<String>>(msg: T) -> Self {
        DealdropError::FileTooLarge(msg.into())
    }
}

// 为常见的错误类型实现 From trait
impl From<sea_orm::DbErr> for DealdropError {
    fn from(err: sea_orm::DbErr) -> Self {
        // 唯一约束冲突单独映射为 Conflict，调用方据此返回 409
        if let Some(sea_orm::SqlErr::UniqueConstraintViolation(detail)) = err.sql_err() {
            return DealdropError::Conflict(detail);
        }
        DealdropError::DatabaseOperation(err.to_string())
    }
}

impl From<std::io::Error> for DealdropError {
    fn from(err: std::io::Error) -> Self {
        DealdropError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for DealdropError {
    fn from(err: serde_json::Error) -> Self {
        DealdropError::Serialization(err.to_string())
    }
}

impl From<chrono::ParseError> for DealdropError {
    fn from(err: chrono::ParseError) -> Self {
        DealdropError::DateParse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DealdropError>;
