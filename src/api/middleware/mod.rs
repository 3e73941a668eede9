pub mod identity;

pub use identity::{Identity, IdentityResolver, expired_session_cookie, session_cookie};
