//! REST client for the hosted platform (auth + object storage).
//!
//! # Architecture
//!
//! - The hosted platform is the source of truth for users, sessions and files
//! - Every call carries the public `apikey` header; user-scoped calls add the
//!   caller's bearer token, storage writes use the service key when configured
//! - No caching: each request goes straight to the platform
//!
//! # Example
//!
//! ```rust,ignore
//! use aizome_server::platform::PlatformClient;
//!
//! let client = PlatformClient::new(&config.platform);
//! let session = client.sign_in_with_password("mei@example.com", "hunter22").await?;
//! let user = client.get_user(&session.access_token).await?;
//! ```

mod auth;
mod storage;

pub use auth::{AuthSession, PlatformUser, SignUpOutcome};
pub use storage::StoredObject;

use std::sync::Arc;
use std::time::Duration;

use reqwest::{RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::config::PlatformConfig;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Errors that can occur when talking to the hosted platform.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Platform answered with a non-success status.
    #[error("platform returned {status}: {message}")]
    Status { status: u16, message: String },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the platform.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),
}

impl PlatformError {
    /// Status code reported by the platform, if any.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::NotFound(_) => Some(404),
            Self::RateLimited(_) => Some(429),
            Self::Http(_) | Self::Parse(_) => None,
        }
    }

    /// Whether the platform rejected the caller's credentials or input.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        self.status().is_some_and(|s| (400..500).contains(&s))
    }
}

/// Client for the hosted platform's REST API.
#[derive(Clone)]
pub struct PlatformClient {
    inner: Arc<PlatformClientInner>,
}

struct PlatformClientInner {
    client: reqwest::Client,
    base_url: String,
    anon_key: String,
    service_key: Option<SecretString>,
}

impl std::fmt::Debug for PlatformClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlatformClient")
            .field("base_url", &self.inner.base_url)
            .finish_non_exhaustive()
    }
}

impl PlatformClient {
    /// Create a new platform client.
    #[must_use]
    pub fn new(config: &PlatformConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self {
            inner: Arc::new(PlatformClientInner {
                client,
                base_url: config.url.trim_end_matches('/').to_string(),
                anon_key: config.anon_key.clone(),
                service_key: config.service_key.clone(),
            }),
        }
    }

    /// Base URL without trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base_url)
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.with_api_key(self.inner.client.get(self.url(path)))
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.with_api_key(self.inner.client.post(self.url(path)))
    }

    fn delete(&self, path: &str) -> RequestBuilder {
        self.with_api_key(self.inner.client.delete(self.url(path)))
    }

    fn with_api_key(&self, request: RequestBuilder) -> RequestBuilder {
        request.header("apikey", &self.inner.anon_key)
    }

    /// Bearer token for server-side storage calls: service key, else anon key.
    fn storage_token(&self) -> &str {
        self.inner
            .service_key
            .as_ref()
            .map_or(self.inner.anon_key.as_str(), |k| k.expose_secret())
    }

    /// Send a request and return the response if it succeeded.
    async fn send(&self, request: RequestBuilder) -> Result<Response, PlatformError> {
        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(PlatformError::RateLimited(retry_after));
        }

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = error_message(&body);

        if status == StatusCode::NOT_FOUND || is_not_found_body(&body) {
            return Err(PlatformError::NotFound(message));
        }

        if status.is_server_error() {
            tracing::error!(
                status = %status,
                body = %body.chars().take(500).collect::<String>(),
                "Platform returned server error"
            );
        } else {
            tracing::debug!(status = %status, message = %message, "Platform rejected request");
        }

        Err(PlatformError::Status {
            status: status.as_u16(),
            message,
        })
    }

    /// Send a request and parse the JSON body.
    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, PlatformError> {
        let response = self.send(request).await?;
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %text.chars().take(500).collect::<String>(),
                "Failed to parse platform response"
            );
            PlatformError::Parse(e)
        })
    }
}

/// Pull a human-readable message out of a platform error body.
fn error_message(body: &str) -> String {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
    parsed
        .as_ref()
        .and_then(|v| {
            ["error_description", "msg", "message", "error"]
                .iter()
                .find_map(|key| v.get(key).and_then(serde_json::Value::as_str))
        })
        .map_or_else(
            || body.chars().take(200).collect(),
            ToString::to_string,
        )
}

/// Storage answers missing objects with `400 {"statusCode":"404", ...}`.
fn is_not_found_body(body: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("statusCode").cloned())
        .is_some_and(|code| code == "404" || code == 404)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_prefers_description() {
        assert_eq!(
            error_message(r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#),
            "Invalid login credentials"
        );
        assert_eq!(error_message(r#"{"msg":"User already registered"}"#), "User already registered");
        assert_eq!(error_message("plain text"), "plain text");
    }

    #[test]
    fn test_not_found_body() {
        assert!(is_not_found_body(r#"{"statusCode":"404","error":"not_found"}"#));
        assert!(!is_not_found_body(r#"{"statusCode":"400"}"#));
        assert!(!is_not_found_body("nope"));
    }

    #[test]
    fn test_client_error_classification() {
        let err = PlatformError::Status {
            status: 400,
            message: "bad".into(),
        };
        assert!(err.is_client_error());
        assert!(PlatformError::NotFound("x".into()).is_client_error());
        let err = PlatformError::Status {
            status: 503,
            message: "down".into(),
        };
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_client_strips_trailing_slash() {
        let client = PlatformClient::new(&PlatformConfig {
            url: "https://platform.test/".into(),
            anon_key: "anon".into(),
            service_key: None,
            jwt_secret: None,
        });
        assert_eq!(client.base_url(), "https://platform.test");
        assert_eq!(client.storage_token(), "anon");
    }
}
