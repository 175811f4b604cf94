//! Session-related types.
//!
//! Types stored in the session for authentication state.

use serde::{Deserialize, Serialize};

use aizome_core::UserId;

/// Session-stored platform tokens.
///
/// Browser clients that log in through `/api/auth/login` get their access
/// token kept server-side and renewed with the refresh token while the
/// session lives; API clients send it as a bearer token instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionTokens {
    /// Platform user id.
    pub user_id: UserId,
    /// Email reported by the platform at sign-in.
    pub email: Option<String>,
    /// Platform access token (JWT).
    pub access_token: String,
    /// Platform refresh token, spent when the access token runs out.
    pub refresh_token: Option<String>,
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the platform tokens of the logged-in user.
    pub const AUTH_TOKENS: &str = "auth_tokens";
}
