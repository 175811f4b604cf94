//! Cart queries. One row per (user, product); adding again accumulates.

use sqlx::{PgConnection, PgPool};

use aizome_core::{CartItemId, ProductId, UserId};

use super::RepositoryError;
use crate::models::CartLine;
use crate::services::rules::CART_QUANTITY_MAX;

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The user's cart lines joined with their products, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn lines(&self, user: UserId) -> Result<Vec<CartLine>, RepositoryError> {
        let lines = sqlx::query_as::<_, CartLine>(
            r"
            SELECT c.id, c.product_id, c.quantity,
                   p.name, p.price, p.image_url, p.stock, p.status
            FROM cart_items c
            JOIN products p ON p.id = c.product_id
            WHERE c.user_id = $1
            ORDER BY c.created_at, c.id
            ",
        )
        .bind(user)
        .fetch_all(self.pool)
        .await?;
        Ok(lines)
    }

    /// Add `quantity` of a product, accumulating onto an existing line.
    ///
    /// Returns the line's new quantity.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the line would exceed the
    /// per-line maximum.
    pub async fn add(
        &self,
        user: UserId,
        product: ProductId,
        quantity: i32,
    ) -> Result<i32, RepositoryError> {
        let new_quantity: Option<i32> = sqlx::query_scalar(
            r"
            INSERT INTO cart_items (user_id, product_id, quantity)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, product_id) DO UPDATE
                SET quantity = cart_items.quantity + EXCLUDED.quantity
                WHERE cart_items.quantity + EXCLUDED.quantity <= $4
            RETURNING quantity
            ",
        )
        .bind(user)
        .bind(product)
        .bind(quantity)
        .bind(CART_QUANTITY_MAX)
        .fetch_optional(self.pool)
        .await?;

        new_quantity.ok_or_else(|| {
            RepositoryError::Conflict(format!("cart line may hold at most {CART_QUANTITY_MAX}"))
        })
    }

    /// Owner of a cart line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn owner(&self, id: CartItemId) -> Result<Option<UserId>, RepositoryError> {
        let owner = sqlx::query_scalar("SELECT user_id FROM cart_items WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(owner)
    }

    /// Overwrite a line's quantity.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the line is gone.
    pub async fn set_quantity(&self, id: CartItemId, quantity: i32) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE cart_items SET quantity = $2 WHERE id = $1")
            .bind(id)
            .bind(quantity)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Remove one line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the line is gone.
    pub async fn remove(&self, id: CartItemId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM cart_items WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Empty the user's cart. Returns the number of removed lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn clear(&self, user: UserId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
            .bind(user)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

/// Drop the given products from the user's cart inside a transaction.
pub(crate) async fn remove_products(
    conn: &mut PgConnection,
    user: UserId,
    products: &[ProductId],
) -> Result<(), RepositoryError> {
    sqlx::query("DELETE FROM cart_items WHERE user_id = $1 AND product_id = ANY($2)")
        .bind(user)
        .bind(products)
        .execute(conn)
        .await?;
    Ok(())
}
