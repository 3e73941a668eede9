//! API 模块常量定义

/// 匿名会话 id 请求头（cookie 之外的备选）
pub const SESSION_HEADER: &str = "X-Session-Id";

/// 公共 API 前缀
pub const API_PREFIX: &str = "/api/v1";

/// 函数端点前缀
pub const FUNCTIONS_PREFIX: &str = "/functions/v1";
