//! 匿名会话标识
//!
//! 未登录访客的浏览去重依据。格式：`session_<unix 毫秒>_<9 位小写字母数字>`。
//! 会话 id 只在浏览器会话内有效（无 max-age 的 cookie），不承担任何安全职责。

use parking_lot::RwLock;

use super::random_lowercase_alnum;

const SESSION_PREFIX: &str = "session_";
const SESSION_SUFFIX_LEN: usize = 9;

/// 会话 id 的存放位置（浏览器标签页存储 / cookie 的抽象）
pub trait SessionStore: Send + Sync {
    fn get(&self) -> Option<String>;
    fn set(&self, session_id: &str);
    fn clear(&self);
}

/// 进程内会话存储
#[derive(Default)]
pub struct MemorySessionStore {
    value: RwLock<Option<String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self) -> Option<String> {
        self.value.read().clone()
    }

    fn set(&self, session_id: &str) {
        *self.value.write() = Some(session_id.to_string());
    }

    fn clear(&self) {
        *self.value.write() = None;
    }
}

pub fn generate_session_id() -> String {
    format!(
        "{}{}_{}",
        SESSION_PREFIX,
        chrono::Utc::now().timestamp_millis(),
        random_lowercase_alnum(SESSION_SUFFIX_LEN)
    )
}

/// 读取已有会话 id，没有则生成并写回
pub fn get_or_create_session_id(store: &dyn SessionStore) -> String {
    if let Some(existing) = store.get().filter(|id| !id.is_empty()) {
        return existing;
    }
    let session_id = generate_session_id();
    store.set(&session_id);
    session_id
}

/// 校验客户端带来的会话 id 是否为本服务签发的格式
pub fn is_valid_session_id(session_id: &str) -> bool {
    let Some(rest) = session_id.strip_prefix(SESSION_PREFIX) else {
        return false;
    };
    let Some((millis, suffix)) = rest.split_once('_') else {
        return false;
    };
    !millis.is_empty()
        && millis.chars().all(|c| c.is_ascii_digit())
        && suffix.len() == SESSION_SUFFIX_LEN
        && suffix
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_id_format() {
        let id = generate_session_id();
        assert!(id.starts_with("session_"));
        assert!(is_valid_session_id(&id), "unexpected format: {}", id);
    }

    #[test]
    fn test_stable_within_store() {
        let store = MemorySessionStore::new();
        let first = get_or_create_session_id(&store);
        let second = get_or_create_session_id(&store);
        assert_eq!(first, second);
    }

    #[test]
    fn test_cleared_store_gets_new_id() {
        let store = MemorySessionStore::new();
        let first = get_or_create_session_id(&store);
        store.clear();
        assert!(store.get().is_none());

        let second = get_or_create_session_id(&store);
        assert!(is_valid_session_id(&second));
        assert_ne!(first, second);
    }

    #[test]
    fn test_rejects_foreign_ids() {
        assert!(!is_valid_session_id(""));
        assert!(!is_valid_session_id("session_"));
        assert!(!is_valid_session_id("session_123_ABCDEFGHI"));
        assert!(!is_valid_session_id("session_abc_abcdefghi"));
        assert!(!is_valid_session_id("session_123_abc"));
        assert!(!is_valid_session_id("sess_123_abcdefghi"));
        assert!(is_valid_session_id("session_1700000000000_k3j9x0a1b"));
    }
}
