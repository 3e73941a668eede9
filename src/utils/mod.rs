pub mod password;
pub mod session;
pub mod time_window;
pub mod url_validator;

pub use session::{
    MemorySessionStore, SessionStore, generate_session_id, get_or_create_session_id,
    is_valid_session_id,
};
pub use time_window::parse_age_window;
pub use url_validator::{
    AFFILIATE_LINK_ERROR, is_valid_affiliate_link, is_valid_image_file, is_valid_image_url,
    validate_url,
};

/// 生成指定长度的小写字母数字随机串
pub fn random_lowercase_alnum(length: usize) -> String {
    use std::iter;

    let chars = b"abcdefghijklmnopqrstuvwxyz0123456789";

    iter::repeat_with(|| chars[rand::random_range(0..chars.len())] as char)
        .take(length)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_lowercase_alnum() {
        let s = random_lowercase_alnum(32);
        assert_eq!(s.len(), 32);
        assert!(s.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }
}
