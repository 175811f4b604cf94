//! Product catalog queries.

use serde::Deserialize;
use sqlx::{PgConnection, PgPool};

use aizome_core::ProductId;

use super::{Page, RepositoryError};
use crate::models::Product;

/// Catalog ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    Name,
}

impl ProductSort {
    const fn order_by(self) -> &'static str {
        match self {
            Self::Newest => "created_at DESC, id",
            Self::PriceAsc => "price ASC, id",
            Self::PriceDesc => "price DESC, id",
            Self::Name => "name ASC, id",
        }
    }
}

/// Catalog filters. Only active products are ever returned.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub category: Option<String>,
    pub query: Option<String>,
    pub sort: ProductSort,
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// One page of active products plus the total match count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        filter: &ProductFilter,
        page: Page,
    ) -> Result<(Vec<Product>, i64), RepositoryError> {
        let pattern = filter.query.as_deref().map(like_pattern);

        let sql = format!(
            r"
            SELECT * FROM products
            WHERE status = 'active'
              AND ($1::text IS NULL OR category = $1)
              AND ($2::text IS NULL OR name ILIKE $2 OR description ILIKE $2)
            ORDER BY {}
            LIMIT $3 OFFSET $4
            ",
            filter.sort.order_by()
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(filter.category.as_deref())
            .bind(pattern.as_deref())
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(self.pool)
            .await?;

        let total: i64 = sqlx::query_scalar(
            r"
            SELECT COUNT(*) FROM products
            WHERE status = 'active'
              AND ($1::text IS NULL OR category = $1)
              AND ($2::text IS NULL OR name ILIKE $2 OR description ILIKE $2)
            ",
        )
        .bind(filter.category.as_deref())
        .bind(pattern.as_deref())
        .fetch_one(self.pool)
        .await?;

        Ok((products, total))
    }

    /// Distinct categories of active products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn categories(&self) -> Result<Vec<String>, RepositoryError> {
        let rows = sqlx::query_scalar(
            "SELECT DISTINCT category FROM products WHERE status = 'active' ORDER BY category",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// An active product by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_active(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE id = $1 AND status = 'active'",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(product)
    }
}

/// Lock the given products for the rest of the transaction.
pub(crate) async fn lock_many(
    conn: &mut PgConnection,
    ids: &[ProductId],
) -> Result<Vec<Product>, RepositoryError> {
    let products = sqlx::query_as::<_, Product>(
        "SELECT * FROM products WHERE id = ANY($1) ORDER BY id FOR UPDATE",
    )
    .bind(ids)
    .fetch_all(conn)
    .await?;
    Ok(products)
}

/// Adjust stock by `delta`, refusing to go below zero.
pub(crate) async fn adjust_stock(
    conn: &mut PgConnection,
    id: ProductId,
    delta: i32,
) -> Result<(), RepositoryError> {
    let result = sqlx::query("UPDATE products SET stock = stock + $2 WHERE id = $1 AND stock + $2 >= 0")
        .bind(id)
        .bind(delta)
        .execute(conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(RepositoryError::Conflict("insufficient stock".to_owned()));
    }
    Ok(())
}

/// `%term%` with LIKE metacharacters escaped.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .trim()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes() {
        assert_eq!(like_pattern(" indigo "), "%indigo%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }

    #[test]
    fn test_sort_parses_snake_case() {
        let sort: ProductSort = serde_json::from_str("\"price_desc\"").unwrap_or_default();
        assert_eq!(sort, ProductSort::PriceDesc);
        assert_eq!(ProductSort::default().order_by(), "created_at DESC, id");
    }
}
