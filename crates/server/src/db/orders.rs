//! Order queries.
//!
//! Creating an order locks the ordered products, prices the lines from the
//! locked rows, decrements stock and writes the order with its lines in one
//! transaction. Any failure rolls the whole order back.

use sqlx::types::Json;
use sqlx::PgPool;

use aizome_core::{OrderId, OrderStatus, Price, ProductId, ProductStatus, UserId};

use super::{RepositoryError, cart, products};
use crate::models::{Order, OrderDetail, OrderItem, ShippingAddress};
use crate::services::pricing::Quote;

/// One requested order line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub quantity: i32,
}

/// Everything needed to write an order except prices, which come from the
/// locked product rows.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user: UserId,
    pub order_no: String,
    pub lines: Vec<OrderLine>,
    pub shipping: ShippingAddress,
    /// Remove the ordered products from the cart on success.
    pub from_cart: bool,
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The user's orders, newest first, optionally filtered by status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(
        &self,
        user: UserId,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>, RepositoryError> {
        let orders = sqlx::query_as::<_, Order>(
            r"
            SELECT * FROM orders
            WHERE user_id = $1 AND ($2::text IS NULL OR status = $2)
            ORDER BY created_at DESC
            ",
        )
        .bind(user)
        .bind(status)
        .fetch_all(self.pool)
        .await?;
        Ok(orders)
    }

    /// Get an order by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(order)
    }

    /// The lines of an order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn items(&self, id: OrderId) -> Result<Vec<OrderItem>, RepositoryError> {
        let items = sqlx::query_as::<_, OrderItem>(
            "SELECT * FROM order_items WHERE order_id = $1 ORDER BY product_name, id",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;
        Ok(items)
    }

    /// Write a new pending order.
    ///
    /// `price` turns the subtotal of the locked lines into the final quote,
    /// which is where a coupon gets applied.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if a product does not exist,
    /// `RepositoryError::Conflict` if one is inactive or short on stock,
    /// or whatever `price` returns.
    pub async fn create<E, F>(&self, order: NewOrder, price: F) -> Result<OrderDetail, E>
    where
        E: From<RepositoryError>,
        F: FnOnce(Price) -> Result<Quote, E>,
    {
        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;

        let ids: Vec<ProductId> = order.lines.iter().map(|l| l.product_id).collect();
        let locked = products::lock_many(&mut tx, &ids).await?;

        let mut priced = Vec::with_capacity(order.lines.len());
        for line in &order.lines {
            let product = locked
                .iter()
                .find(|p| p.id == line.product_id)
                .ok_or(RepositoryError::NotFound)?;
            if product.status != ProductStatus::Active {
                return Err(RepositoryError::Conflict(format!("{} is no longer available", product.name)).into());
            }
            priced.push((line, product.name.clone(), product.price));
        }

        let subtotal: Price = priced.iter().map(|(line, _, unit)| unit.times(line.quantity)).sum();
        let quote = price(subtotal)?;

        let created = sqlx::query_as::<_, Order>(
            r"
            INSERT INTO orders (user_id, order_no, subtotal, discount, total, coupon_code, shipping_address)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            ",
        )
        .bind(order.user)
        .bind(&order.order_no)
        .bind(quote.subtotal)
        .bind(quote.discount)
        .bind(quote.total)
        .bind(quote.coupon_code.as_deref())
        .bind(Json(&order.shipping))
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepositoryError::unique(e, "order number already used"))?;

        let mut items = Vec::with_capacity(priced.len());
        for (line, name, unit_price) in priced {
            products::adjust_stock(&mut tx, line.product_id, -line.quantity).await?;

            let item = sqlx::query_as::<_, OrderItem>(
                r"
                INSERT INTO order_items (order_id, product_id, product_name, unit_price, quantity)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING *
                ",
            )
            .bind(created.id)
            .bind(line.product_id)
            .bind(name)
            .bind(unit_price)
            .bind(line.quantity)
            .fetch_one(&mut *tx)
            .await
            .map_err(RepositoryError::from)?;
            items.push(item);
        }

        if order.from_cart {
            cart::remove_products(&mut tx, order.user, &ids).await?;
        }

        tx.commit().await.map_err(RepositoryError::from)?;

        tracing::info!(order_id = %created.id, order_no = %created.order_no, "Order created");
        Ok(OrderDetail {
            order: created,
            items,
        })
    }

    /// Move an order from `from` to `to`, only if it is still in `from`.
    ///
    /// Cancelling returns the ordered stock.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the order changed status
    /// concurrently.
    pub async fn transition(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let order = sqlx::query_as::<_, Order>(
            r"
            UPDATE orders SET status = $3, updated_at = now()
            WHERE id = $1 AND status = $2
            RETURNING *
            ",
        )
        .bind(id)
        .bind(from)
        .bind(to)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| RepositoryError::Conflict(format!("order is no longer {from}")))?;

        if to == OrderStatus::Cancelled {
            let lines: Vec<(ProductId, i32)> =
                sqlx::query_as("SELECT product_id, quantity FROM order_items WHERE order_id = $1")
                    .bind(id)
                    .fetch_all(&mut *tx)
                    .await?;
            for (product, quantity) in lines {
                products::adjust_stock(&mut tx, product, quantity).await?;
            }
        }

        tx.commit().await?;
        tracing::info!(order_id = %id, %from, %to, "Order status changed");
        Ok(order)
    }
}
