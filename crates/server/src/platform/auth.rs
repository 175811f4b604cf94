//! Hosted auth endpoints (`/auth/v1/...`).

use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::{PlatformClient, PlatformError};

/// A user as reported by the hosted auth service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: serde_json::Value,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Tokens returned by a successful sign-in.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    pub user: PlatformUser,
}

/// Sign-up either signs the user straight in or waits for email confirmation.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SignUpOutcome {
    Session(AuthSession),
    PendingConfirmation(PlatformUser),
}

impl SignUpOutcome {
    /// The registered user.
    #[must_use]
    pub const fn user(&self) -> &PlatformUser {
        match self {
            Self::Session(session) => &session.user,
            Self::PendingConfirmation(user) => user,
        }
    }
}

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RefreshBody<'a> {
    refresh_token: &'a str,
}

#[derive(Serialize)]
struct SignUpBody<'a> {
    email: &'a str,
    password: &'a str,
    data: &'a serde_json::Value,
}

impl PlatformClient {
    /// Fetch the user behind an access token (verified by the platform).
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::Status` with 401/403 if the token is rejected.
    #[instrument(skip_all)]
    pub async fn get_user(&self, access_token: &str) -> Result<PlatformUser, PlatformError> {
        self.send_json(self.get("/auth/v1/user").bearer_auth(access_token))
            .await
    }

    /// Exchange email and password for a session.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::Status` with 400 for bad credentials.
    #[instrument(skip(self, password))]
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, PlatformError> {
        self.send_json(
            self.post("/auth/v1/token?grant_type=password")
                .json(&Credentials { email, password }),
        )
        .await
    }

    /// Exchange a refresh token for a new session.
    ///
    /// The platform rotates refresh tokens, so the returned session carries
    /// the one to use next time.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::Status` with 400 if the refresh token was
    /// revoked or already used.
    #[instrument(skip_all)]
    pub async fn refresh_session(&self, refresh_token: &str) -> Result<AuthSession, PlatformError> {
        self.send_json(
            self.post("/auth/v1/token?grant_type=refresh_token")
                .json(&RefreshBody { refresh_token }),
        )
        .await
    }

    /// Register a new user with profile metadata.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::Status` with 400/422 if the email is taken or
    /// the password is rejected.
    #[instrument(skip(self, password, metadata))]
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: &serde_json::Value,
    ) -> Result<SignUpOutcome, PlatformError> {
        self.send_json(self.post("/auth/v1/signup").json(&SignUpBody {
            email,
            password,
            data: metadata,
        }))
        .await
    }

    /// Revoke the session behind an access token.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform call fails.
    #[instrument(skip_all)]
    pub async fn sign_out(&self, access_token: &str) -> Result<(), PlatformError> {
        self.send(self.post("/auth/v1/logout").bearer_auth(access_token))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_up_outcome_variants() {
        let session: SignUpOutcome = serde_json::from_str(
            r#"{"access_token":"t","refresh_token":"r","expires_in":3600,
                "user":{"id":"u1","email":"a@b.co"}}"#,
        )
        .unwrap();
        assert!(matches!(session, SignUpOutcome::Session(_)));
        assert_eq!(session.user().id, "u1");

        let pending: SignUpOutcome =
            serde_json::from_str(r#"{"id":"u2","email":"c@d.co","confirmation_sent_at":"x"}"#)
                .unwrap();
        assert!(matches!(pending, SignUpOutcome::PendingConfirmation(_)));
        assert_eq!(pending.user().email.as_deref(), Some("c@d.co"));
    }
}
