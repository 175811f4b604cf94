//! Profile and wallet handlers.

use axum::extract::State;
use serde::Deserialize;
use tracing::instrument;

use crate::db::profiles::ProfileUpdate;
use crate::db::{ProfileRepository, WalletRepository};
use crate::error::{ApiResult, Result, ok};
use crate::extract::ApiJson;
use crate::middleware::RequireUser;
use crate::models::{Profile, Wallet};
use crate::services::AuthUser;
use crate::services::rules;
use crate::state::AppState;

/// Body of `PUT /api/profile`. Absent fields are left unchanged.
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
}

/// The caller's profile, created on first access.
///
/// Every endpoint that touches coins or shows an author name goes through
/// here so the row exists before it is needed.
pub(crate) async fn ensure_profile(state: &AppState, user: &AuthUser) -> Result<Profile> {
    let username = rules::default_username(user.email.as_deref(), user.id);
    let profile = ProfileRepository::new(state.pool())
        .get_or_create(user.id, &username, "")
        .await?;
    Ok(profile)
}

/// `GET /api/profile`
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn show(State(state): State<AppState>, RequireUser(user): RequireUser) -> ApiResult<Profile> {
    ok(ensure_profile(&state, &user).await?)
}

/// `PUT /api/profile`
#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ApiJson(body): ApiJson<UpdateProfileRequest>,
) -> ApiResult<Profile> {
    let update = ProfileUpdate {
        username: body.username.as_deref().map(rules::username).transpose()?,
        display_name: body.display_name.as_deref().map(rules::display_name).transpose()?,
        avatar_url: body
            .avatar_url
            .as_deref()
            .map(|url| rules::bounded_text("avatar_url", url, 0, 512))
            .transpose()?,
        bio: body.bio.as_deref().map(rules::bio).transpose()?,
    };

    ensure_profile(&state, &user).await?;
    let profile = ProfileRepository::new(state.pool())
        .update(user.id, &update)
        .await?;
    tracing::info!("Profile updated");
    ok(profile)
}

/// `GET /api/wallet`
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn wallet(State(state): State<AppState>, RequireUser(user): RequireUser) -> ApiResult<Wallet> {
    ensure_profile(&state, &user).await?;
    ok(WalletRepository::new(state.pool()).wallet(user.id).await?)
}
