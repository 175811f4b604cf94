//! Favorite products.

use sqlx::PgPool;

use aizome_core::{ProductId, UserId};

use super::RepositoryError;
use crate::models::Product;

/// Repository for favorite database operations.
pub struct FavoriteRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> FavoriteRepository<'a> {
    /// Create a new favorite repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The user's favorite products that are still active, most recent first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, user: UserId) -> Result<Vec<Product>, RepositoryError> {
        let products = sqlx::query_as::<_, Product>(
            r"
            SELECT p.* FROM favorites f
            JOIN products p ON p.id = f.product_id
            WHERE f.user_id = $1 AND p.status = 'active'
            ORDER BY f.created_at DESC
            ",
        )
        .bind(user)
        .fetch_all(self.pool)
        .await?;
        Ok(products)
    }

    /// Which of `products` the user has favorited.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn favorited_among(
        &self,
        user: UserId,
        products: &[ProductId],
    ) -> Result<Vec<ProductId>, RepositoryError> {
        let ids = sqlx::query_scalar(
            "SELECT product_id FROM favorites WHERE user_id = $1 AND product_id = ANY($2)",
        )
        .bind(user)
        .bind(products)
        .fetch_all(self.pool)
        .await?;
        Ok(ids)
    }

    /// Flip the favorite flag. Returns whether the product is now a favorite.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn toggle(&self, user: UserId, product: ProductId) -> Result<bool, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND product_id = $2")
            .bind(user)
            .bind(product)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if removed == 0 {
            sqlx::query(
                "INSERT INTO favorites (user_id, product_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(user)
            .bind(product)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(removed == 0)
    }

    /// Remove a favorite. Returns whether one existed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn remove(&self, user: UserId, product: ProductId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND product_id = $2")
            .bind(user)
            .bind(product)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
