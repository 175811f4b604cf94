//! Authentication handlers.
//!
//! Identity lives on the hosted platform. Login keeps the platform tokens in
//! the server session for browser clients and also returns them so API
//! clients can send them as bearer tokens.

use axum::extract::State;
use axum::http::{HeaderMap, header::AUTHORIZATION};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::db::ProfileRepository;
use crate::error::{ApiResponse, ApiResult, add_breadcrumb, clear_sentry_user, ok, set_sentry_user};
use crate::extract::ApiJson;
use crate::middleware::{RequireUser, clear_session_tokens, session_tokens, store_session_tokens};
use crate::models::Profile;
use crate::platform::{AuthSession, SignUpOutcome};
use crate::services::{AuthError, AuthUser, rules};
use crate::state::AppState;

use super::profile::ensure_profile;

/// Body of `POST /api/auth/register`.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub username: Option<String>,
    pub display_name: Option<String>,
}

/// Body of `POST /api/auth/login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Result of login or registration.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: AuthUser,
    pub profile: Profile,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
    /// The platform wants the email confirmed before the first login.
    pub confirmation_required: bool,
}

impl AuthResponse {
    fn new(user: AuthUser, profile: Profile, session: Option<AuthSession>) -> Self {
        let confirmation_required = session.is_none();
        let (access_token, refresh_token, expires_in) = session.map_or((None, None, None), |s| {
            (Some(s.access_token), s.refresh_token, s.expires_in)
        });
        Self {
            user,
            profile,
            access_token,
            refresh_token,
            expires_in,
            confirmation_required,
        }
    }
}

/// `GET /api/auth/me` response.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: AuthUser,
    pub profile: Profile,
}

/// Keep the tokens of a fresh platform session in the server session.
async fn remember(session: &Session, user: &AuthUser, auth: &AuthSession) -> Result<(), AuthError> {
    store_session_tokens(session, &session_tokens(user, auth)).await?;
    Ok(())
}

/// `POST /api/auth/register`
#[instrument(skip(state, session, body), fields(email = %body.email))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    ApiJson(body): ApiJson<RegisterRequest>,
) -> ApiResult<AuthResponse> {
    let username = body.username.as_deref().map(rules::username).transpose()?;
    let display_name = body
        .display_name
        .as_deref()
        .map(rules::display_name)
        .transpose()?
        .unwrap_or_default();

    let metadata = serde_json::json!({ "username": username, "display_name": display_name });
    let (user, outcome) = state
        .auth()
        .register(&body.email, &body.password, &metadata)
        .await?;

    let username =
        username.unwrap_or_else(|| rules::default_username(user.email.as_deref(), user.id));
    let profile = ProfileRepository::new(state.pool())
        .get_or_create(user.id, &username, &display_name)
        .await?;

    let auth_session = match outcome {
        SignUpOutcome::Session(auth_session) => {
            remember(&session, &user, &auth_session).await?;
            set_sentry_user(&user.id, user.email.as_deref());
            Some(auth_session)
        }
        SignUpOutcome::PendingConfirmation(_) => None,
    };

    tracing::info!(user_id = %user.id, "User registered");
    add_breadcrumb("auth", "Registered", None);
    Ok(ApiResponse::created(AuthResponse::new(user, profile, auth_session)))
}

/// `POST /api/auth/login`
#[instrument(skip(state, session, body), fields(email = %body.email))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    ApiJson(body): ApiJson<LoginRequest>,
) -> ApiResult<AuthResponse> {
    let (user, auth_session) = state.auth().sign_in(&body.email, &body.password).await?;
    remember(&session, &user, &auth_session).await?;
    set_sentry_user(&user.id, user.email.as_deref());

    let profile = ensure_profile(&state, &user).await?;
    tracing::info!(user_id = %user.id, "User logged in");
    ok(AuthResponse::new(user, profile, Some(auth_session)))
}

/// `POST /api/auth/logout`
///
/// Always clears the session. Revoking the platform session is best effort.
#[instrument(skip_all)]
pub async fn logout(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
) -> ApiResult<serde_json::Value> {
    let stored = clear_session_tokens(&session)
        .await
        .map_err(AuthError::from)?;
    clear_sentry_user();

    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_owned);

    if let Some(token) = bearer.or_else(|| stored.map(|t| t.access_token))
        && let Err(e) = state.auth().sign_out(&token).await
    {
        tracing::warn!(error = %e, "Platform sign-out failed");
    }

    ok(serde_json::json!({ "signed_out": true }))
}

/// `GET /api/auth/me`
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn me(State(state): State<AppState>, RequireUser(user): RequireUser) -> ApiResult<MeResponse> {
    let profile = ensure_profile(&state, &user).await?;
    ok(MeResponse { user, profile })
}
