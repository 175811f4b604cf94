//! Database operations against the hosted `PostgreSQL` store.
//!
//! The hosted platform owns the database; this server only reads and writes
//! rows through a `sqlx` pool. Queries are runtime-checked (`query_as` with
//! `FromRow`) so the crate builds without a live database.
//!
//! ## Tables
//!
//! - `profiles` - Display data and coin balance per auth user
//! - `products`, `cart_items`, `coupons`, `orders`, `order_items`, `favorites`
//! - `courses`, `course_enrollments`, `course_comments`
//! - `craft_works`, `items`, `user_items`, `listings`, `transactions`
//! - `tasks`, `user_tasks`
//! - `tower_sessions.session` - Tower-sessions storage
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p aizome-cli -- migrate
//! ```

pub mod cart;
pub mod coupons;
pub mod courses;
pub mod favorites;
pub mod items;
pub mod listings;
pub mod orders;
pub mod products;
pub mod profiles;
pub mod tasks;
pub mod wallet;
pub mod works;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use cart::CartRepository;
pub use coupons::CouponRepository;
pub use courses::CourseRepository;
pub use favorites::FavoriteRepository;
pub use items::ItemRepository;
pub use listings::ListingRepository;
pub use orders::OrderRepository;
pub use products::ProductRepository;
pub use profiles::ProfileRepository;
pub use tasks::TaskRepository;
pub use wallet::WalletRepository;
pub use works::WorkRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique username).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map a unique violation to `Conflict(message)`, anything else to `Database`.
    pub(crate) fn unique(e: sqlx::Error, message: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_unique_violation()
        {
            return Self::Conflict(message.to_owned());
        }
        Self::Database(e)
    }
}

/// Page window for list endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Page {
    pub const DEFAULT_PER_PAGE: i64 = 20;
    pub const MAX_PER_PAGE: i64 = 100;

    /// Build a window from 1-based `page` and `per_page`, clamping both.
    #[must_use]
    pub fn new(page: Option<i64>, per_page: Option<i64>) -> Self {
        let limit = per_page
            .unwrap_or(Self::DEFAULT_PER_PAGE)
            .clamp(1, Self::MAX_PER_PAGE);
        let page = page.unwrap_or(1).max(1);
        Self {
            limit,
            offset: (page - 1).saturating_mul(limit),
        }
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_defaults_and_clamps() {
        assert_eq!(Page::new(None, None), Page { limit: 20, offset: 0 });
        assert_eq!(Page::new(Some(3), Some(10)), Page { limit: 10, offset: 20 });
        assert_eq!(Page::new(Some(0), Some(1000)), Page { limit: 100, offset: 0 });
        assert_eq!(Page::new(Some(-4), Some(0)), Page { limit: 1, offset: 0 });
    }

    #[test]
    fn test_unique_passes_through_other_errors() {
        let err = RepositoryError::unique(sqlx::Error::RowNotFound, "taken");
        assert!(matches!(err, RepositoryError::Database(_)));
    }
}
