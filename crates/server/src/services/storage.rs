//! File storage for uploaded images.
//!
//! Files live in the hosted platform's bucket when `STORAGE_BUCKET` is set,
//! otherwise under a local directory. Both backends share the same path
//! rules so a deployment can move between them without rewriting keys.

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::instrument;

use crate::platform::{PlatformClient, PlatformError, StoredObject};
use crate::services::ids;

/// Largest accepted upload.
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Longest accepted object path.
pub const MAX_PATH_LEN: usize = 256;

/// Errors from file storage.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("file is too large ({size} bytes, limit {max})")]
    TooLarge { size: usize, max: usize },

    #[error("unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("file not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("platform error: {0}")]
    Platform(PlatformError),
}

impl From<PlatformError> for StorageError {
    fn from(err: PlatformError) -> Self {
        match err {
            PlatformError::NotFound(path) => Self::NotFound(path),
            other => Self::Platform(other),
        }
    }
}

/// A file read back from storage.
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Metadata of a stored file.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FileEntry {
    /// Full path, including the prefix.
    pub path: String,
    pub size: Option<u64>,
    pub content_type: Option<String>,
}

/// Where files are kept.
#[derive(Debug, Clone)]
pub enum FileStorage {
    Hosted {
        client: PlatformClient,
        bucket: String,
    },
    Local {
        root: PathBuf,
    },
}

impl FileStorage {
    /// Human-readable backend name for logs.
    #[must_use]
    pub const fn backend(&self) -> &'static str {
        match self {
            Self::Hosted { .. } => "hosted",
            Self::Local { .. } => "local",
        }
    }

    /// Store `bytes` at `path`, overwriting any existing file.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the path, size or content type is rejected,
    /// or the backend write fails.
    #[instrument(skip(self, bytes), fields(backend = self.backend(), size = bytes.len()))]
    pub async fn put(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), StorageError> {
        validate_path(path)?;
        validate_upload(bytes.len(), content_type)?;

        match self {
            Self::Hosted { client, bucket } => {
                client.upload(bucket, path, bytes, content_type).await?;
            }
            Self::Local { root } => {
                let full = root.join(path);
                if let Some(parent) = full.parent() {
                    tokio::fs::create_dir_all(parent).await?;
                }
                tokio::fs::write(&full, bytes).await?;
            }
        }
        tracing::info!(path = %path, "Stored file");
        Ok(())
    }

    /// Read the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if no such file exists.
    #[instrument(skip(self), fields(backend = self.backend()))]
    pub async fn get(&self, path: &str) -> Result<StoredFile, StorageError> {
        validate_path(path)?;

        match self {
            Self::Hosted { client, bucket } => {
                let (bytes, content_type) = client.download(bucket, path).await?;
                Ok(StoredFile {
                    bytes,
                    content_type: content_type.unwrap_or_else(|| guess_content_type(path)),
                })
            }
            Self::Local { root } => {
                let full = root.join(path);
                match tokio::fs::read(&full).await {
                    Ok(bytes) => Ok(StoredFile {
                        bytes,
                        content_type: guess_content_type(path),
                    }),
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                        Err(StorageError::NotFound(path.to_owned()))
                    }
                    Err(e) => Err(e.into()),
                }
            }
        }
    }

    /// Delete the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if a local file does not exist.
    #[instrument(skip(self), fields(backend = self.backend()))]
    pub async fn delete(&self, path: &str) -> Result<(), StorageError> {
        validate_path(path)?;

        match self {
            Self::Hosted { client, bucket } => {
                client.remove(bucket, &[path.to_owned()]).await?;
            }
            Self::Local { root } => match tokio::fs::remove_file(root.join(path)).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    return Err(StorageError::NotFound(path.to_owned()));
                }
                Err(e) => return Err(e.into()),
            },
        }
        tracing::info!(path = %path, "Deleted file");
        Ok(())
    }

    /// List files directly under `prefix`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the prefix is invalid or the backend fails.
    #[instrument(skip(self), fields(backend = self.backend()))]
    pub async fn list(&self, prefix: &str) -> Result<Vec<FileEntry>, StorageError> {
        let prefix = prefix.trim_end_matches('/');
        validate_path(prefix)?;

        match self {
            Self::Hosted { client, bucket } => {
                let objects = client.list(bucket, prefix).await?;
                Ok(objects
                    .into_iter()
                    .map(|o: StoredObject| FileEntry {
                        path: format!("{prefix}/{}", o.name),
                        size: o.size,
                        content_type: o.content_type,
                    })
                    .collect())
            }
            Self::Local { root } => list_local(&root.join(prefix), prefix).await,
        }
    }
}

async fn list_local(dir: &Path, prefix: &str) -> Result<Vec<FileEntry>, StorageError> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let metadata = entry.metadata().await?;
        if !metadata.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        files.push(FileEntry {
            content_type: Some(guess_content_type(&name)),
            path: format!("{prefix}/{name}"),
            size: Some(metadata.len()),
        });
    }
    files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(files)
}

/// Check that `path` is a relative, `/`-separated path without traversal.
///
/// # Errors
///
/// Returns `StorageError::InvalidPath` describing the first problem found.
pub fn validate_path(path: &str) -> Result<(), StorageError> {
    let invalid = |reason: &str| -> Result<(), StorageError> {
        Err(StorageError::InvalidPath(reason.to_owned()))
    };

    if path.is_empty() {
        return invalid("path is empty");
    }
    if path.len() > MAX_PATH_LEN {
        return invalid("path is too long");
    }
    if path.starts_with('/') {
        return invalid("path must be relative");
    }
    if path.contains('\\') || path.contains('\0') {
        return invalid("path contains forbidden characters");
    }
    for segment in path.split('/') {
        if segment.is_empty() {
            return invalid("path contains an empty segment");
        }
        if segment == ".." || segment == "." {
            return invalid("path may not contain '.' or '..'");
        }
    }
    Ok(())
}

/// Check upload size and content type.
///
/// # Errors
///
/// Returns `StorageError::TooLarge` or `StorageError::UnsupportedType`.
pub fn validate_upload(size: usize, content_type: &str) -> Result<(), StorageError> {
    if size > MAX_UPLOAD_BYTES {
        return Err(StorageError::TooLarge {
            size,
            max: MAX_UPLOAD_BYTES,
        });
    }
    if !ids::ALLOWED_IMAGE_TYPES
        .iter()
        .any(|(_, ct)| *ct == content_type)
    {
        return Err(StorageError::UnsupportedType(content_type.to_owned()));
    }
    Ok(())
}

fn guess_content_type(path: &str) -> String {
    path.rsplit_once('.')
        .and_then(|(_, ext)| ids::content_type_for(ext))
        .unwrap_or("application/octet-stream")
        .to_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_path() {
        assert!(validate_path("user/works/a.png").is_ok());
        for bad in ["", "/abs.png", "a//b.png", "a/../b.png", "./a.png", "a\\b.png", "a/"] {
            assert!(
                matches!(validate_path(bad), Err(StorageError::InvalidPath(_))),
                "accepted {bad:?}"
            );
        }
        assert!(validate_path(&"a".repeat(257)).is_err());
        assert!(validate_path(&"a".repeat(256)).is_ok());
    }

    #[test]
    fn test_validate_upload() {
        assert!(validate_upload(10, "image/png").is_ok());
        assert!(matches!(
            validate_upload(MAX_UPLOAD_BYTES + 1, "image/png"),
            Err(StorageError::TooLarge { .. })
        ));
        assert!(matches!(
            validate_upload(10, "text/html"),
            Err(StorageError::UnsupportedType(_))
        ));
    }

    #[test]
    fn test_platform_not_found_maps_to_not_found() {
        let err = StorageError::from(PlatformError::NotFound("a.png".into()));
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_local_roundtrip_and_listing() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::Local {
            root: dir.path().to_path_buf(),
        };

        storage
            .put("u1/works/b.png", vec![1, 2, 3], "image/png")
            .await
            .unwrap();
        storage
            .put("u1/works/a.webp", vec![4], "image/webp")
            .await
            .unwrap();

        let file = storage.get("u1/works/b.png").await.unwrap();
        assert_eq!(file.bytes, vec![1, 2, 3]);
        assert_eq!(file.content_type, "image/png");

        let listed = storage.list("u1/works/").await.unwrap();
        let paths: Vec<_> = listed.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["u1/works/a.webp", "u1/works/b.png"]);

        storage.delete("u1/works/b.png").await.unwrap();
        assert!(matches!(
            storage.get("u1/works/b.png").await,
            Err(StorageError::NotFound(_))
        ));
        assert!(matches!(
            storage.delete("u1/works/b.png").await,
            Err(StorageError::NotFound(_))
        ));
        assert!(storage.list("u2").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_local_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::Local {
            root: dir.path().to_path_buf(),
        };
        assert!(matches!(
            storage.put("../escape.png", vec![0], "image/png").await,
            Err(StorageError::InvalidPath(_))
        ));
    }
}
