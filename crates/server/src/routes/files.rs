//! Image upload and file handlers.
//!
//! Every caller owns the `{user_id}/` prefix. Uploads always land there and
//! only files under it may be listed or deleted by that caller.

use axum::extract::{Multipart, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use aizome_core::UserId;

use crate::error::{ApiResponse, ApiResult, AppError, Result, ok};
use crate::extract::{ApiPath, ApiQuery};
use crate::middleware::RequireUser;
use crate::services::ids;
use crate::services::storage::{self, FileEntry};
use crate::state::AppState;

/// Query of `GET /api/files`.
#[derive(Debug, Deserialize)]
pub struct FileQuery {
    pub prefix: Option<String>,
}

/// A stored upload.
#[derive(Debug, Serialize)]
pub struct Uploaded {
    pub path: String,
    pub content_type: String,
    pub size: usize,
}

/// Resolve a requested prefix inside the caller's own folder.
fn own_prefix(user: UserId, requested: Option<&str>) -> String {
    let root = user.to_string();
    let requested = requested.map(|p| p.trim_matches('/')).unwrap_or_default();
    if requested.is_empty() || requested == root {
        return root;
    }
    match requested.strip_prefix(&format!("{root}/")) {
        Some(rest) => format!("{root}/{rest}"),
        None => format!("{root}/{requested}"),
    }
}

fn ensure_own_path(user: UserId, path: &str) -> Result<()> {
    if path.starts_with(&format!("{user}/")) {
        Ok(())
    } else {
        Err(AppError::Forbidden("you may only change your own files".to_owned()))
    }
}

fn multipart_error(err: axum::extract::multipart::MultipartError) -> AppError {
    AppError::BadRequest(err.body_text())
}

/// `POST /api/upload`
///
/// Multipart form with a `file` part and an optional `folder` part.
#[instrument(skip(state, user, multipart), fields(user_id = %user.id))]
pub async fn upload(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    mut multipart: Multipart,
) -> ApiResult<Uploaded> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut folder: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("file") => {
                let filename = field.file_name().unwrap_or_default().to_owned();
                let bytes = field.bytes().await.map_err(multipart_error)?;
                file = Some((filename, bytes.to_vec()));
            }
            Some("folder") => {
                let value = field.text().await.map_err(multipart_error)?;
                let value = value.trim();
                if !value.is_empty() {
                    folder = Some(value.to_owned());
                }
            }
            _ => {}
        }
    }

    let (filename, bytes) = file.ok_or_else(|| AppError::BadRequest("missing file".to_owned()))?;
    if let Some(folder) = folder.as_deref()
        && !ids::is_folder_name(folder)
    {
        return Err(AppError::BadRequest("invalid folder name".to_owned()));
    }

    let path = ids::upload_object_name(user.id, folder.as_deref(), &filename)
        .ok_or_else(|| AppError::BadRequest("only jpg, png, gif and webp images are accepted".to_owned()))?;
    let content_type = path
        .rsplit_once('.')
        .and_then(|(_, ext)| ids::content_type_for(ext))
        .unwrap_or("application/octet-stream")
        .to_owned();
    let size = bytes.len();

    state.storage().put(&path, bytes, &content_type).await?;
    Ok(ApiResponse::created(Uploaded {
        path,
        content_type,
        size,
    }))
}

/// `GET /api/files`
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn list(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ApiQuery(query): ApiQuery<FileQuery>,
) -> ApiResult<Vec<FileEntry>> {
    let prefix = own_prefix(user.id, query.prefix.as_deref());
    ok(state.storage().list(&prefix).await?)
}

/// `GET /api/files/{*path}`
#[instrument(skip(state))]
pub async fn read(State(state): State<AppState>, ApiPath(path): ApiPath<String>) -> Result<Response> {
    let file = state.storage().get(&path).await?;
    Ok((
        [
            (header::CONTENT_TYPE, file.content_type),
            (header::CACHE_CONTROL, "private, max-age=300".to_owned()),
        ],
        file.bytes,
    )
        .into_response())
}

/// `DELETE /api/files/{*path}`
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ApiPath(path): ApiPath<String>,
) -> ApiResult<String> {
    storage::validate_path(&path)?;
    ensure_own_path(user.id, &path)?;
    state.storage().delete(&path).await?;
    ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_own_prefix_stays_inside_user_folder() {
        let user = UserId::generate();
        let root = user.to_string();
        assert_eq!(own_prefix(user, None), root);
        assert_eq!(own_prefix(user, Some("/")), root);
        assert_eq!(own_prefix(user, Some("works")), format!("{root}/works"));
        assert_eq!(own_prefix(user, Some(&format!("{root}/works/"))), format!("{root}/works"));

        let other = UserId::generate();
        assert_eq!(
            own_prefix(user, Some(&format!("{other}/works"))),
            format!("{root}/{other}/works")
        );
    }

    #[test]
    fn test_ensure_own_path() {
        let user = UserId::generate();
        assert!(ensure_own_path(user, &format!("{user}/a.png")).is_ok());
        assert!(matches!(
            ensure_own_path(user, &format!("{}/a.png", UserId::generate())),
            Err(AppError::Forbidden(_))
        ));
        assert!(ensure_own_path(user, &user.to_string()).is_err());
    }
}
