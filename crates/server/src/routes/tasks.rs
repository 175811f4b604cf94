//! Task handlers and progress recording.

use axum::extract::State;
use tracing::instrument;

use aizome_core::{TaskAction, TaskId};

use crate::db::TaskRepository;
use crate::db::tasks::TaskReward;
use crate::error::{ApiResult, ok};
use crate::extract::ApiPath;
use crate::middleware::RequireUser;
use crate::models::TaskProgress;
use crate::services::AuthUser;
use crate::state::AppState;

use super::profile::ensure_profile;

/// Count `action` toward the caller's tasks.
///
/// Task progress never fails the request that triggered it.
pub(crate) async fn record_task(state: &AppState, user: &AuthUser, action: TaskAction) {
    match TaskRepository::new(state.pool()).record(user.id, action).await {
        Ok(updated) => tracing::debug!(%action, updated, "Task progress recorded"),
        Err(e) => tracing::warn!(%action, error = %e, "Failed to record task progress"),
    }
}

/// `GET /api/tasks`
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn index(State(state): State<AppState>, RequireUser(user): RequireUser) -> ApiResult<Vec<TaskProgress>> {
    ok(TaskRepository::new(state.pool()).list_for_user(user.id).await?)
}

/// `POST /api/tasks/{id}/claim`
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn claim(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ApiPath(id): ApiPath<TaskId>,
) -> ApiResult<TaskReward> {
    ensure_profile(&state, &user).await?;
    ok(TaskRepository::new(state.pool()).claim(user.id, id).await?)
}
