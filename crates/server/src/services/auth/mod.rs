//! Authentication service.
//!
//! Identity is owned by the hosted auth platform. This service verifies
//! access tokens (locally when the signing secret is configured, otherwise
//! by asking the platform) and wraps the platform's password endpoints.

mod error;
pub mod token;

pub use error::AuthError;
pub use token::TokenClaims;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use aizome_core::{Email, UserId};

use crate::platform::{AuthSession, PlatformClient, PlatformError, PlatformUser, SignUpOutcome};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum password length accepted by the platform.
const MAX_PASSWORD_LENGTH: usize = 72;

/// A verified caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: UserId,
    pub email: Option<String>,
}

impl AuthUser {
    fn from_claims(claims: TokenClaims) -> Result<Self, AuthError> {
        let id = claims.sub.parse().map_err(|_| AuthError::Malformed)?;
        Ok(Self {
            id,
            email: claims.email,
        })
    }

    fn from_platform(user: &PlatformUser) -> Result<Self, AuthError> {
        let id = user.id.parse().map_err(|_| AuthError::Rejected)?;
        Ok(Self {
            id,
            email: user.email.clone(),
        })
    }
}

/// Authentication service.
///
/// Handles token verification, sign-in, sign-up and sign-out.
pub struct AuthService<'a> {
    platform: &'a PlatformClient,
    jwt_secret: Option<&'a SecretString>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(platform: &'a PlatformClient, jwt_secret: Option<&'a SecretString>) -> Self {
        Self {
            platform,
            jwt_secret,
        }
    }

    // =========================================================================
    // Token verification
    // =========================================================================

    /// Verify an access token and return the caller.
    ///
    /// Malformed and expired tokens fail without a network call. With a
    /// signing secret the signature is checked locally; otherwise the
    /// platform's `/auth/v1/user` decides.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Malformed`, `Expired` or `Rejected` for bad tokens,
    /// and `AuthError::Upstream` if the platform cannot be reached.
    #[instrument(skip_all)]
    pub async fn verify_token(&self, access_token: &str) -> Result<AuthUser, AuthError> {
        let claims = token::peek_claims(access_token)?;
        token::check_expiry(&claims, chrono::Utc::now().timestamp())?;

        if let Some(secret) = self.jwt_secret {
            let verified = token::verify_hs256(access_token, secret)?;
            return AuthUser::from_claims(verified);
        }

        let user = self
            .platform
            .get_user(access_token)
            .await
            .map_err(|e| match e {
                e if e.is_client_error() => AuthError::Rejected,
                e => AuthError::Upstream(e),
            })?;
        AuthUser::from_platform(&user)
    }

    // =========================================================================
    // Password Authentication
    // =========================================================================

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::InvalidCredentials` if the platform rejects them.
    #[instrument(skip(self, password))]
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<(AuthUser, AuthSession), AuthError> {
        let email = Email::parse(email)?;

        let session = self
            .platform
            .sign_in_with_password(email.as_str(), password)
            .await
            .map_err(|e| match e {
                e if e.is_client_error() && !matches!(e, PlatformError::RateLimited(_)) => {
                    AuthError::InvalidCredentials
                }
                e => AuthError::Upstream(e),
            })?;

        let user = AuthUser::from_platform(&session.user)?;
        Ok((user, session))
    }

    /// Renew a session from its refresh token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Expired` if the platform no longer honours the
    /// refresh token, and `AuthError::Upstream` if it cannot be reached.
    #[instrument(skip_all)]
    pub async fn refresh(&self, refresh_token: &str) -> Result<(AuthUser, AuthSession), AuthError> {
        let session = self
            .platform
            .refresh_session(refresh_token)
            .await
            .map_err(|e| match e {
                e if e.is_client_error() && !matches!(e, PlatformError::RateLimited(_)) => {
                    AuthError::Expired
                }
                e => AuthError::Upstream(e),
            })?;

        let user = AuthUser::from_platform(&session.user)?;
        Ok((user, session))
    }

    /// Register a new account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    #[instrument(skip(self, password, metadata))]
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        metadata: &serde_json::Value,
    ) -> Result<(AuthUser, SignUpOutcome), AuthError> {
        let email = Email::parse(email)?;
        validate_password(password)?;

        let outcome = self
            .platform
            .sign_up(email.as_str(), password, metadata)
            .await
            .map_err(|e| match e {
                PlatformError::Status { status, message } if (400..500).contains(&status) => {
                    classify_sign_up_rejection(&message)
                }
                e => AuthError::Upstream(e),
            })?;

        let user = AuthUser::from_platform(outcome.user())?;
        Ok((user, outcome))
    }

    /// Revoke the platform session behind `access_token`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Upstream` if the platform call fails.
    pub async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        self.platform
            .sign_out(access_token)
            .await
            .map_err(AuthError::Upstream)
    }
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    let len = password.chars().count();
    if len < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "Password must be at most {MAX_PASSWORD_LENGTH} bytes"
        )));
    }
    Ok(())
}

fn classify_sign_up_rejection(message: &str) -> AuthError {
    let lower = message.to_lowercase();
    if lower.contains("already") {
        AuthError::UserAlreadyExists
    } else if lower.contains("password") {
        AuthError::WeakPassword(message.to_owned())
    } else {
        AuthError::Upstream(PlatformError::Status {
            status: 400,
            message: message.to_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_password() {
        assert!(matches!(validate_password("short"), Err(AuthError::WeakPassword(_))));
        assert!(validate_password("long enough").is_ok());
        assert!(validate_password(&"p".repeat(73)).is_err());
    }

    #[test]
    fn test_classify_sign_up_rejection() {
        assert!(matches!(
            classify_sign_up_rejection("User already registered"),
            AuthError::UserAlreadyExists
        ));
        assert!(matches!(
            classify_sign_up_rejection("Password should be at least 6 characters"),
            AuthError::WeakPassword(_)
        ));
        assert!(matches!(
            classify_sign_up_rejection("Signups not allowed"),
            AuthError::Upstream(_)
        ));
    }

    #[test]
    fn test_auth_user_requires_uuid_subject() {
        let claims = TokenClaims {
            sub: "not-a-uuid".into(),
            email: None,
            exp: 0,
        };
        assert!(matches!(AuthUser::from_claims(claims), Err(AuthError::Malformed)));
    }
}
