// handlers/public/auth/mod.rs - Token acquisition

use serde::Serialize;

use crate::auth::users::UserInfo;

pub mod login;
pub mod register;

pub use login::login_post;
pub use register::register_post;

/// Body of a successful register or login
#[derive(Debug, Serialize)]
pub struct AuthPayload {
    pub token: String,
    pub user: UserInfo,
    /// Token lifetime in seconds
    pub expires_in: u64,
}
