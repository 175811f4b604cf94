//! Dyeing mini-game handlers: scoring, saved works and the leaderboard.

use axum::extract::State;
use serde::Deserialize;
use tracing::instrument;

use aizome_core::{TaskAction, WorkId};

use crate::db::WorkRepository;
use crate::db::works::LEADERBOARD_SIZE;
use crate::error::{ApiResponse, ApiResult, AppError, Result, ok};
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::RequireUser;
use crate::models::{CraftWork, LeaderboardEntry};
use crate::services::scoring::{self, CraftLayer, ScoreCard};
use crate::services::{AuthUser, rules};
use crate::state::AppState;

use super::profile::ensure_profile;
use super::tasks::record_task;

const LEADERBOARD_MAX: i64 = 100;

/// Body of `POST /api/game/score`.
#[derive(Debug, Deserialize)]
pub struct ScoreRequest {
    pub layers: Vec<CraftLayer>,
}

/// Body of `POST /api/game/works`.
#[derive(Debug, Deserialize)]
pub struct SaveWorkRequest {
    pub title: String,
    pub layers: Vec<CraftLayer>,
}

/// Query of `GET /api/game/leaderboard`.
#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    pub limit: Option<i64>,
}

async fn owned_work(state: &AppState, user: &AuthUser, id: WorkId) -> Result<CraftWork> {
    let work = WorkRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("work not found".to_owned()))?;
    rules::ensure_owner(work.user_id, user.id)?;
    Ok(work)
}

/// `POST /api/game/score`
///
/// Scores the layers without saving anything.
#[instrument(skip(body), fields(layers = body.layers.len()))]
pub async fn score(ApiJson(body): ApiJson<ScoreRequest>) -> ApiResult<ScoreCard> {
    ok(scoring::score(&body.layers)?)
}

/// `POST /api/game/works`
#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn create_work(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ApiJson(body): ApiJson<SaveWorkRequest>,
) -> ApiResult<CraftWork> {
    let title = rules::title(&body.title)?;
    let card = scoring::score(&body.layers)?;
    ensure_profile(&state, &user).await?;

    let work = WorkRepository::new(state.pool())
        .create(user.id, &title, &body.layers, &card)
        .await?;
    record_task(&state, &user, TaskAction::CraftWork).await;
    Ok(ApiResponse::created(work))
}

/// `GET /api/game/works`
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn works(State(state): State<AppState>, RequireUser(user): RequireUser) -> ApiResult<Vec<CraftWork>> {
    ok(WorkRepository::new(state.pool()).list_for_user(user.id).await?)
}

/// `GET /api/game/works/{id}`
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn work(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ApiPath(id): ApiPath<WorkId>,
) -> ApiResult<CraftWork> {
    ok(owned_work(&state, &user, id).await?)
}

/// `DELETE /api/game/works/{id}`
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn delete_work(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ApiPath(id): ApiPath<WorkId>,
) -> ApiResult<WorkId> {
    owned_work(&state, &user, id).await?;
    WorkRepository::new(state.pool()).delete(id).await?;
    tracing::info!(work_id = %id, "Work deleted");
    ok(id)
}

/// `GET /api/game/leaderboard`
#[instrument(skip(state))]
pub async fn leaderboard(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<LeaderboardQuery>,
) -> ApiResult<Vec<LeaderboardEntry>> {
    let limit = leaderboard_limit(query.limit);
    ok(WorkRepository::new(state.pool()).leaderboard(limit).await?)
}

fn leaderboard_limit(requested: Option<i64>) -> i64 {
    requested.map_or(LEADERBOARD_SIZE, |n| n.clamp(1, LEADERBOARD_MAX))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leaderboard_limit() {
        assert_eq!(leaderboard_limit(None), LEADERBOARD_SIZE);
        assert_eq!(leaderboard_limit(Some(0)), 1);
        assert_eq!(leaderboard_limit(Some(5)), 5);
        assert_eq!(leaderboard_limit(Some(10_000)), LEADERBOARD_MAX);
    }
}
