//! Hosted object storage endpoints (`/storage/v1/...`).

use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::{PlatformClient, PlatformError};

const LIST_LIMIT: u32 = 1000;

/// An object (or folder placeholder) returned by a listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredObject {
    pub name: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Deserialize)]
struct ListEntry {
    name: String,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    updated_at: Option<String>,
    #[serde(default)]
    metadata: Option<ListMetadata>,
}

#[derive(Deserialize)]
struct ListMetadata {
    #[serde(default)]
    size: Option<u64>,
    #[serde(default)]
    mimetype: Option<String>,
}

#[derive(Serialize)]
struct ListBody<'a> {
    prefix: &'a str,
    limit: u32,
    offset: u32,
    #[serde(rename = "sortBy")]
    sort_by: SortBy,
}

#[derive(Serialize)]
struct SortBy {
    column: &'static str,
    order: &'static str,
}

#[derive(Serialize)]
struct RemoveBody<'a> {
    prefixes: &'a [String],
}

/// Percent-encode each `/`-separated segment of an object path.
fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

impl PlatformClient {
    /// Upload (or overwrite) an object.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform rejects the upload.
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), PlatformError> {
        let url = format!("/storage/v1/object/{}/{}", encode_path(bucket), encode_path(path));
        self.send(
            self.post(&url)
                .bearer_auth(self.storage_token())
                .header("Content-Type", content_type)
                .header("x-upsert", "true")
                .body(bytes),
        )
        .await?;
        Ok(())
    }

    /// Download an object's bytes and content type.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::NotFound` if the object does not exist.
    #[instrument(skip(self))]
    pub async fn download(
        &self,
        bucket: &str,
        path: &str,
    ) -> Result<(Vec<u8>, Option<String>), PlatformError> {
        let url = format!("/storage/v1/object/{}/{}", encode_path(bucket), encode_path(path));
        let response = self
            .send(self.get(&url).bearer_auth(self.storage_token()))
            .await?;
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let bytes = response.bytes().await?;
        Ok((bytes.to_vec(), content_type))
    }

    /// Delete objects by path.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform call fails.
    #[instrument(skip(self))]
    pub async fn remove(&self, bucket: &str, paths: &[String]) -> Result<(), PlatformError> {
        let url = format!("/storage/v1/object/{}", encode_path(bucket));
        self.send(
            self.delete(&url)
                .bearer_auth(self.storage_token())
                .json(&RemoveBody { prefixes: paths }),
        )
        .await?;
        Ok(())
    }

    /// List objects directly under `prefix`. Names are relative to the prefix.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform call fails.
    #[instrument(skip(self))]
    pub async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<StoredObject>, PlatformError> {
        let url = format!("/storage/v1/object/list/{}", encode_path(bucket));
        let entries: Vec<ListEntry> = self
            .send_json(self.post(&url).bearer_auth(self.storage_token()).json(&ListBody {
                prefix,
                limit: LIST_LIMIT,
                offset: 0,
                sort_by: SortBy {
                    column: "name",
                    order: "asc",
                },
            }))
            .await?;

        Ok(entries
            .into_iter()
            // Folder placeholders have no id
            .filter(|e| e.id.is_some())
            .map(|e| {
                let (size, content_type) = e
                    .metadata
                    .map_or((None, None), |m| (m.size, m.mimetype));
                StoredObject {
                    name: e.name,
                    size,
                    content_type,
                    updated_at: e.updated_at,
                }
            })
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_path_keeps_separators() {
        assert_eq!(encode_path("u1/my work.png"), "u1/my%20work.png");
        assert_eq!(encode_path("a/b/c"), "a/b/c");
    }

    #[test]
    fn test_list_entry_parsing() {
        let entries: Vec<ListEntry> = serde_json::from_str(
            r#"[{"name":"works","id":null,"metadata":null},
                {"name":"a.png","id":"1","updated_at":"2026-01-01T00:00:00Z",
                 "metadata":{"size":42,"mimetype":"image/png"}}]"#,
        )
        .unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries[0].id.is_none());
        assert_eq!(entries[1].metadata.as_ref().unwrap().size, Some(42));
    }
}
