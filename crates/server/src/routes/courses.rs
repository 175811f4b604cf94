//! Course catalog, enrollment and comment handlers.
//!
//! Drafts and archived courses behave as if they did not exist.

use axum::extract::State;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use aizome_core::{CommentId, CourseId, TaskAction};

use crate::db::{CourseRepository, RepositoryError};
use crate::error::{ApiResponse, ApiResult, AppError, Result, ok};
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::{OptionalUser, RequireUser};
use crate::models::{Comment, Course, EnrolledCourse, Enrollment};
use crate::services::rules;
use crate::state::AppState;

use super::profile::ensure_profile;
use super::tasks::record_task;

/// Query of `GET /api/courses`.
#[derive(Debug, Deserialize)]
pub struct CourseQuery {
    pub level: Option<String>,
    pub q: Option<String>,
}

/// A course with the caller's enrollment, if any.
#[derive(Debug, Serialize)]
pub struct CourseDetail {
    #[serde(flatten)]
    pub course: Course,
    pub enrollment: Option<Enrollment>,
}

/// Body of `PUT /api/courses/{id}/progress`.
#[derive(Debug, Deserialize)]
pub struct ProgressRequest {
    pub progress: i32,
}

/// Body of `POST /api/courses/{id}/comments`.
#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub body: String,
}

async fn published(state: &AppState, id: CourseId) -> Result<Course> {
    CourseRepository::new(state.pool())
        .get_published(id)
        .await?
        .ok_or_else(|| AppError::NotFound("course not found".to_owned()))
}

/// `GET /api/courses`
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<CourseQuery>,
) -> ApiResult<Vec<Course>> {
    let level = query.level.as_deref().map(str::trim).filter(|l| !l.is_empty());
    let q = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty());
    ok(CourseRepository::new(state.pool()).list_published(level, q).await?)
}

/// `GET /api/courses/enrolled`
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn enrolled(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> ApiResult<Vec<EnrolledCourse>> {
    ok(CourseRepository::new(state.pool()).enrolled(user.id).await?)
}

/// `GET /api/courses/{id}`
#[instrument(skip(state, user))]
pub async fn show(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
    ApiPath(id): ApiPath<CourseId>,
) -> ApiResult<CourseDetail> {
    let course = published(&state, id).await?;
    let enrollment = match user {
        Some(user) => {
            CourseRepository::new(state.pool())
                .enrollment(user.id, id)
                .await?
        }
        None => None,
    };
    ok(CourseDetail { course, enrollment })
}

/// `POST /api/courses/{id}/enroll`
///
/// Enrolling again returns the existing enrollment with 200.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn enroll(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ApiPath(id): ApiPath<CourseId>,
) -> ApiResult<Enrollment> {
    published(&state, id).await?;
    let (enrollment, created) = CourseRepository::new(state.pool()).enroll(user.id, id).await?;

    if created {
        tracing::info!(course_id = %id, "Enrolled in course");
        record_task(&state, &user, TaskAction::EnrollCourse).await;
        Ok(ApiResponse::created(enrollment))
    } else {
        ok(enrollment)
    }
}

/// `PUT /api/courses/{id}/progress`
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn progress(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ApiPath(id): ApiPath<CourseId>,
    ApiJson(body): ApiJson<ProgressRequest>,
) -> ApiResult<Enrollment> {
    let progress = rules::course_progress(body.progress)?;
    published(&state, id).await?;

    let enrollment = CourseRepository::new(state.pool())
        .set_progress(user.id, id, progress)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => {
                AppError::Forbidden("enroll in this course first".to_owned())
            }
            other => other.into(),
        })?;
    ok(enrollment)
}

/// `GET /api/courses/{id}/comments`
#[instrument(skip(state))]
pub async fn comments(State(state): State<AppState>, ApiPath(id): ApiPath<CourseId>) -> ApiResult<Vec<Comment>> {
    published(&state, id).await?;
    ok(CourseRepository::new(state.pool()).comments(id).await?)
}

/// `POST /api/courses/{id}/comments`
#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn add_comment(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ApiPath(id): ApiPath<CourseId>,
    ApiJson(body): ApiJson<CommentRequest>,
) -> ApiResult<Comment> {
    let text = rules::comment_body(&body.body)?;
    published(&state, id).await?;
    ensure_profile(&state, &user).await?;

    let comment = CourseRepository::new(state.pool())
        .add_comment(id, user.id, &text)
        .await?;
    Ok(ApiResponse::created(comment))
}

/// `DELETE /api/comments/{id}`
///
/// Only the author may delete a comment.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn delete_comment(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ApiPath(id): ApiPath<CommentId>,
) -> ApiResult<CommentId> {
    let courses = CourseRepository::new(state.pool());
    let author = courses
        .comment_author(id)
        .await?
        .ok_or_else(|| AppError::NotFound("comment not found".to_owned()))?;
    rules::ensure_owner(author, user.id)?;

    courses.delete_comment(id).await?;
    tracing::info!(comment_id = %id, "Comment deleted");
    ok(id)
}
