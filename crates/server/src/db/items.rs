//! Item catalog and inventories.

use serde::Serialize;
use sqlx::{PgConnection, PgPool};

use aizome_core::{ItemId, TransactionKind, UserId};

use super::{RepositoryError, wallet};
use crate::models::{InventoryItem, Item};

/// Result of buying items with coins.
#[derive(Debug, Clone, Serialize)]
pub struct ItemPurchase {
    pub item: InventoryItem,
    pub spent: i64,
    pub coins: i64,
}

/// Repository for item database operations.
pub struct ItemRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ItemRepository<'a> {
    /// Create a new item repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The full catalog, cheapest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn catalog(&self) -> Result<Vec<Item>, RepositoryError> {
        let items = sqlx::query_as::<_, Item>("SELECT * FROM items ORDER BY kind, price, name")
            .fetch_all(self.pool)
            .await?;
        Ok(items)
    }

    /// Get a catalog item.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ItemId) -> Result<Option<Item>, RepositoryError> {
        let item = sqlx::query_as::<_, Item>("SELECT * FROM items WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(item)
    }

    /// Items the user holds (quantity above zero, or equipped).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn inventory(&self, user: UserId) -> Result<Vec<InventoryItem>, RepositoryError> {
        let items = sqlx::query_as::<_, InventoryItem>(
            r"
            SELECT i.*, ui.quantity, ui.equipped, ui.acquired_at
            FROM user_items ui
            JOIN items i ON i.id = ui.item_id
            WHERE ui.user_id = $1 AND (ui.quantity > 0 OR ui.equipped)
            ORDER BY i.kind, i.name
            ",
        )
        .bind(user)
        .fetch_all(self.pool)
        .await?;
        Ok(items)
    }

    /// Buy `quantity` of `item` with coins.
    ///
    /// The debit, the inventory change and the ledger row commit together.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the item does not exist and
    /// `RepositoryError::Conflict` if the user cannot afford it.
    pub async fn purchase(
        &self,
        user: UserId,
        item: &Item,
        quantity: i32,
    ) -> Result<ItemPurchase, RepositoryError> {
        let spent = item
            .price
            .checked_mul(i64::from(quantity))
            .ok_or_else(|| RepositoryError::Conflict("purchase total is too large".to_owned()))?;

        let mut tx = self.pool.begin().await?;

        let coins = wallet::debit(&mut tx, user, spent).await?;

        sqlx::query(
            r"
            INSERT INTO user_items (user_id, item_id, quantity)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, item_id) DO UPDATE
                SET quantity = user_items.quantity + EXCLUDED.quantity
            ",
        )
        .bind(user)
        .bind(item.id)
        .bind(quantity)
        .execute(&mut *tx)
        .await?;

        wallet::record(
            &mut tx,
            user,
            TransactionKind::ItemPurchase,
            -spent,
            Some(item.id.as_uuid()),
            &format!("Bought {quantity} × {}", item.name),
        )
        .await?;

        let held = held_item(&mut tx, user, item.id)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        tx.commit().await?;
        tracing::info!(item_id = %item.id, quantity, spent, "Item purchased");

        Ok(ItemPurchase {
            item: held,
            spent,
            coins,
        })
    }

    /// Use up one unit of a held item.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if none are left.
    pub async fn consume(&self, user: UserId, item: ItemId) -> Result<InventoryItem, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r"
            UPDATE user_items SET quantity = quantity - 1
            WHERE user_id = $1 AND item_id = $2 AND quantity > 0
            ",
        )
        .bind(user)
        .bind(item)
        .execute(&mut *tx)
        .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::Conflict("you have none of this item left".to_owned()));
        }

        let held = held_item(&mut tx, user, item)
            .await?
            .ok_or(RepositoryError::NotFound)?;
        tx.commit().await?;
        Ok(held)
    }

    /// Flip the equipped flag. Equipping unequips any other item of the
    /// same kind first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not hold the item.
    pub async fn toggle_equipped(
        &self,
        user: UserId,
        item: ItemId,
    ) -> Result<InventoryItem, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let current = held_item(&mut tx, user, item)
            .await?
            .filter(|held| held.quantity > 0 || held.equipped)
            .ok_or(RepositoryError::NotFound)?;

        if !current.equipped {
            sqlx::query(
                r"
                UPDATE user_items ui SET equipped = FALSE
                FROM items i
                WHERE i.id = ui.item_id AND ui.user_id = $1 AND ui.item_id <> $2
                  AND ui.equipped AND i.kind = $3
                ",
            )
            .bind(user)
            .bind(item)
            .bind(current.item.kind)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("UPDATE user_items SET equipped = $3 WHERE user_id = $1 AND item_id = $2")
            .bind(user)
            .bind(item)
            .bind(!current.equipped)
            .execute(&mut *tx)
            .await?;

        let updated = held_item(&mut tx, user, item)
            .await?
            .ok_or(RepositoryError::NotFound)?;
        tx.commit().await?;
        Ok(updated)
    }
}

async fn held_item(
    conn: &mut PgConnection,
    user: UserId,
    item: ItemId,
) -> Result<Option<InventoryItem>, RepositoryError> {
    let held = sqlx::query_as::<_, InventoryItem>(
        r"
        SELECT i.*, ui.quantity, ui.equipped, ui.acquired_at
        FROM user_items ui
        JOIN items i ON i.id = ui.item_id
        WHERE ui.user_id = $1 AND ui.item_id = $2
        FOR UPDATE OF ui
        ",
    )
    .bind(user)
    .bind(item)
    .fetch_optional(conn)
    .await?;
    Ok(held)
}
