//! Authentication extractors.
//!
//! A caller is identified by a bearer access token, or failing that by the
//! access token kept in their server session after `/api/auth/login`.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use tower_sessions::Session;

use crate::error::{AppError, set_sentry_user};
use crate::models::{SessionTokens, session_keys};
use crate::platform::AuthSession;
use crate::services::auth::token;
use crate::services::{AuthError, AuthUser};
use crate::state::AppState;

/// Session access tokens this close to `exp` are renewed before use.
const REFRESH_MARGIN_SECS: i64 = 30;

/// Extractor that requires an authenticated caller.
///
/// Rejects with 401 and the JSON error envelope.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(RequireUser(user): RequireUser) -> ApiResult<UserId> {
///     ok(user.id)
/// }
/// ```
pub struct RequireUser(pub AuthUser);

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = access_token(parts, state).await?.ok_or(AuthError::MissingToken)?;
        let user = state.auth().verify_token(&token).await?;
        set_sentry_user(&user.id, user.email.as_deref());
        Ok(Self(user))
    }
}

/// Extractor that identifies the caller when possible.
///
/// Missing or invalid credentials yield `None` instead of a rejection.
pub struct OptionalUser(pub Option<AuthUser>);

impl FromRequestParts<AppState> for OptionalUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = match access_token(parts, state).await {
            Ok(Some(token)) => token,
            Ok(None) | Err(_) => return Ok(Self(None)),
        };

        match state.auth().verify_token(&token).await {
            Ok(user) => Ok(Self(Some(user))),
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring invalid credentials on optional route");
                Ok(Self(None))
            }
        }
    }
}

/// Where the caller's access token came from.
enum Credential {
    Bearer(String),
    Session(Session, SessionTokens),
}

/// Bearer token from the `Authorization` header, else the session's tokens.
async fn credential(parts: &Parts) -> Result<Option<Credential>, AuthError> {
    if let Some(header) = parts.headers.get(AUTHORIZATION) {
        let value = header.to_str().map_err(|_| AuthError::Malformed)?;
        let token = value
            .strip_prefix("Bearer ")
            .or_else(|| value.strip_prefix("bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::Malformed)?;
        return Ok(Some(Credential::Bearer(token.to_owned())));
    }

    let Some(session) = parts.extensions.get::<Session>() else {
        return Ok(None);
    };
    let tokens: Option<SessionTokens> = session.get(session_keys::AUTH_TOKENS).await?;
    Ok(tokens.map(|t| Credential::Session(session.clone(), t)))
}

/// The access token to verify, renewing an expiring session token first.
async fn access_token(parts: &Parts, state: &AppState) -> Result<Option<String>, AuthError> {
    match credential(parts).await? {
        None => Ok(None),
        Some(Credential::Bearer(token)) => Ok(Some(token)),
        Some(Credential::Session(session, tokens)) => {
            let now = chrono::Utc::now().timestamp();
            match refresh_due(&tokens, now).map(str::to_owned) {
                Some(refresh_token) => renew_session(state, &session, &tokens, &refresh_token)
                    .await
                    .map(Some),
                None => Ok(Some(tokens.access_token)),
            }
        }
    }
}

/// The refresh token to spend, if the session's access token is about to
/// expire and one was issued.
///
/// Malformed access tokens are left for verification to reject.
fn refresh_due(tokens: &SessionTokens, now: i64) -> Option<&str> {
    let refresh_token = tokens.refresh_token.as_deref()?;
    let claims = token::peek_claims(&tokens.access_token).ok()?;
    (claims.exp <= now + REFRESH_MARGIN_SECS).then_some(refresh_token)
}

/// Swap the session's tokens for a fresh pair from the platform.
///
/// A refresh token the platform refuses ends the session.
async fn renew_session(
    state: &AppState,
    session: &Session,
    tokens: &SessionTokens,
    refresh_token: &str,
) -> Result<String, AuthError> {
    set_sentry_user(&tokens.user_id, tokens.email.as_deref());

    match state.auth().refresh(refresh_token).await {
        Ok((user, auth)) => {
            let mut renewed = session_tokens(&user, &auth);
            if renewed.refresh_token.is_none() {
                renewed.refresh_token = Some(refresh_token.to_owned());
            }
            session.insert(session_keys::AUTH_TOKENS, &renewed).await?;
            tracing::info!(user_id = %tokens.user_id, "Session tokens renewed");
            Ok(renewed.access_token)
        }
        Err(AuthError::Expired) => {
            tracing::info!(user_id = %tokens.user_id, "Refresh token refused, ending session");
            session
                .remove::<SessionTokens>(session_keys::AUTH_TOKENS)
                .await?;
            Err(AuthError::Expired)
        }
        Err(e) => Err(e),
    }
}

/// Session record for a fresh platform session.
#[must_use]
pub fn session_tokens(user: &AuthUser, auth: &AuthSession) -> SessionTokens {
    SessionTokens {
        user_id: user.id,
        email: user.email.clone(),
        access_token: auth.access_token.clone(),
        refresh_token: auth.refresh_token.clone(),
    }
}

/// Helper to store the platform tokens in the session (login).
///
/// The session id is cycled first so a pre-login id cannot be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn store_session_tokens(
    session: &Session,
    tokens: &SessionTokens,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::AUTH_TOKENS, tokens).await
}

/// Helper to remove the platform tokens from the session (logout).
///
/// Returns the tokens that were stored, if any.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_session_tokens(
    session: &Session,
) -> Result<Option<SessionTokens>, tower_sessions::session::Error> {
    let tokens = session
        .remove::<SessionTokens>(session_keys::AUTH_TOKENS)
        .await?;
    session.flush().await?;
    Ok(tokens)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use aizome_core::UserId;
    use axum::http::Request;
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;

    use super::*;

    fn parts_with(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/profile");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    fn unsigned_token(exp: i64) -> String {
        let payload = serde_json::json!({ "sub": "6f9619ff-8b86-d011-b42d-00c04fc964ff", "exp": exp });
        format!("e30.{}.sig", URL_SAFE_NO_PAD.encode(payload.to_string()))
    }

    fn stored(access_token: String, refresh_token: Option<&str>) -> SessionTokens {
        SessionTokens {
            user_id: UserId::generate(),
            email: Some("mei@example.com".to_string()),
            access_token,
            refresh_token: refresh_token.map(str::to_owned),
        }
    }

    #[tokio::test]
    async fn test_bearer_token_is_extracted() {
        let parts = parts_with(Some("Bearer abc.def.ghi"));
        assert!(matches!(
            credential(&parts).await,
            Ok(Some(Credential::Bearer(token))) if token == "abc.def.ghi"
        ));
    }

    #[tokio::test]
    async fn test_other_schemes_are_malformed() {
        for header in ["Basic dXNlcjpwdw==", "Bearer ", "abc.def.ghi"] {
            let parts = parts_with(Some(header));
            assert!(matches!(credential(&parts).await, Err(AuthError::Malformed)), "{header}");
        }
    }

    #[tokio::test]
    async fn test_no_header_and_no_session_is_anonymous() {
        let parts = parts_with(None);
        assert!(matches!(credential(&parts).await, Ok(None)));
    }

    #[test]
    fn test_refresh_due_when_token_expired_or_expiring() {
        let now = 1_700_000_000;
        let expired = stored(unsigned_token(now - 60), Some("r1"));
        assert_eq!(refresh_due(&expired, now), Some("r1"));

        let expiring = stored(unsigned_token(now + REFRESH_MARGIN_SECS), Some("r1"));
        assert_eq!(refresh_due(&expiring, now), Some("r1"));
    }

    #[test]
    fn test_refresh_not_due() {
        let now = 1_700_000_000;
        let fresh = stored(unsigned_token(now + 3600), Some("r1"));
        assert_eq!(refresh_due(&fresh, now), None);

        let no_refresh_token = stored(unsigned_token(now - 60), None);
        assert_eq!(refresh_due(&no_refresh_token, now), None);

        let garbage = stored("not-a-jwt".to_string(), Some("r1"));
        assert_eq!(refresh_due(&garbage, now), None);
    }

    #[test]
    fn test_session_tokens_from_sign_in() {
        let user = AuthUser {
            id: UserId::generate(),
            email: Some("mei@example.com".to_string()),
        };
        let auth: AuthSession = serde_json::from_value(serde_json::json!({
            "access_token": "a1",
            "refresh_token": "r1",
            "expires_in": 3600,
            "user": { "id": user.id.to_string(), "email": "mei@example.com" }
        }))
        .unwrap();

        let tokens = session_tokens(&user, &auth);
        assert_eq!(tokens.user_id, user.id);
        assert_eq!(tokens.access_token, "a1");
        assert_eq!(tokens.refresh_token.as_deref(), Some("r1"));
    }
}
