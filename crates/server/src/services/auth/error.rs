//! Authentication error types.

use thiserror::Error;

use crate::platform::PlatformError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No bearer token and no session token.
    #[error("missing access token")]
    MissingToken,

    /// Token is not a well-formed JWT with the claims we need.
    #[error("malformed access token")]
    Malformed,

    /// Token `exp` is in the past.
    #[error("access token expired")]
    Expired,

    /// Signature or platform verification failed.
    #[error("access token rejected")]
    Rejected,

    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] aizome_core::EmailError),

    /// Invalid credentials (wrong password or user not found).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// User already exists.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// The hosted auth service failed.
    #[error("auth platform error: {0}")]
    Upstream(PlatformError),

    /// Session store error.
    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),
}
