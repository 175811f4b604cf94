//! Coupon lookups.

use sqlx::PgPool;

use super::RepositoryError;
use crate::models::Coupon;

/// Repository for coupon database operations.
pub struct CouponRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CouponRepository<'a> {
    /// Create a new coupon repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a coupon by code. Codes are matched case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, code: &str) -> Result<Option<Coupon>, RepositoryError> {
        let coupon = sqlx::query_as::<_, Coupon>(
            "SELECT code, kind, value, min_spend, active, expires_at FROM coupons WHERE upper(code) = upper($1)",
        )
        .bind(code.trim())
        .fetch_optional(self.pool)
        .await?;
        Ok(coupon)
    }
}
