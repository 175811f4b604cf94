//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::ServerConfig;
use crate::platform::PlatformClient;
use crate::services::{AuthService, FileStorage};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    pool: PgPool,
    platform: PlatformClient,
    storage: FileStorage,
}

impl AppState {
    /// Create a new application state.
    ///
    /// Files go to the platform bucket when one is configured, otherwise to
    /// the local upload directory.
    #[must_use]
    pub fn new(config: ServerConfig, pool: PgPool) -> Self {
        let platform = PlatformClient::new(&config.platform);
        let storage = match &config.storage.bucket {
            Some(bucket) => FileStorage::Hosted {
                client: platform.clone(),
                bucket: bucket.clone(),
            },
            None => FileStorage::Local {
                root: config.storage.upload_dir.clone(),
            },
        };
        tracing::info!(backend = storage.backend(), "File storage configured");

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                platform,
                storage,
            }),
        }
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the hosted platform client.
    #[must_use]
    pub fn platform(&self) -> &PlatformClient {
        &self.inner.platform
    }

    /// Get a reference to file storage.
    #[must_use]
    pub fn storage(&self) -> &FileStorage {
        &self.inner.storage
    }

    /// Authentication service bound to this state.
    #[must_use]
    pub fn auth(&self) -> AuthService<'_> {
        AuthService::new(
            &self.inner.platform,
            self.inner.config.platform.jwt_secret.as_ref(),
        )
    }
}
