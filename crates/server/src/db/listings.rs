//! The listing market.
//!
//! A shop is the set of listings sharing a `seller_id`. A work can be
//! actively listed once, and each shop features at most one listing; both
//! are enforced by partial unique indexes.

use serde::Serialize;
use sqlx::{PgConnection, PgPool};

use aizome_core::{ListingId, ListingStatus, TransactionKind, UserId, WorkId};

use super::{RepositoryError, wallet};
use crate::models::{Listing, ListingView};

/// Result of buying a listing.
#[derive(Debug, Clone, Serialize)]
pub struct ListingPurchase {
    pub listing: Listing,
    pub coins: i64,
}

const VIEW_SELECT: &str = r"
    SELECT l.*, w.score, w.grade, p.username AS seller_name
    FROM listings l
    JOIN craft_works w ON w.id = l.work_id
    LEFT JOIN profiles p ON p.id = l.seller_id
";

/// Repository for listing database operations.
pub struct ListingRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ListingRepository<'a> {
    /// Create a new listing repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Active listings, newest first, optionally for one seller.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_active(&self, seller: Option<UserId>) -> Result<Vec<ListingView>, RepositoryError> {
        let sql = format!(
            "{VIEW_SELECT} WHERE l.status = 'active' AND ($1::uuid IS NULL OR l.seller_id = $1) \
             ORDER BY l.created_at DESC"
        );
        let listings = sqlx::query_as::<_, ListingView>(&sql)
            .bind(seller)
            .fetch_all(self.pool)
            .await?;
        Ok(listings)
    }

    /// A seller's shop: active listings with the featured one first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn shop(&self, seller: UserId) -> Result<Vec<ListingView>, RepositoryError> {
        let sql = format!(
            "{VIEW_SELECT} WHERE l.status = 'active' AND l.seller_id = $1 \
             ORDER BY l.featured DESC, l.created_at DESC"
        );
        let listings = sqlx::query_as::<_, ListingView>(&sql)
            .bind(seller)
            .fetch_all(self.pool)
            .await?;
        Ok(listings)
    }

    /// Get a listing by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ListingId) -> Result<Option<Listing>, RepositoryError> {
        let listing = sqlx::query_as::<_, Listing>("SELECT * FROM listings WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(listing)
    }

    /// Put a work up for sale. Ownership and price bounds are checked by
    /// the caller.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the work is already listed.
    pub async fn create(
        &self,
        seller: UserId,
        work: WorkId,
        title: &str,
        price: i64,
    ) -> Result<Listing, RepositoryError> {
        let listing = sqlx::query_as::<_, Listing>(
            r"
            INSERT INTO listings (seller_id, work_id, title, price)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            ",
        )
        .bind(seller)
        .bind(work)
        .bind(title)
        .bind(price)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::unique(e, "this work is already listed"))?;

        tracing::info!(listing_id = %listing.id, work_id = %work, price, "Listing created");
        Ok(listing)
    }

    /// Take an active listing off the market.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if it is no longer active.
    pub async fn withdraw(&self, id: ListingId) -> Result<Listing, RepositoryError> {
        sqlx::query_as::<_, Listing>(
            r"
            UPDATE listings SET status = $2, featured = FALSE
            WHERE id = $1 AND status = $3
            RETURNING *
            ",
        )
        .bind(id)
        .bind(ListingStatus::Withdrawn)
        .bind(ListingStatus::Active)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| RepositoryError::Conflict("listing is no longer active".to_owned()))
    }

    /// Make `id` the featured listing of the seller's shop.
    ///
    /// Any other featured listing in the shop is cleared first, in the same
    /// transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the listing is not an active
    /// listing of `seller`.
    pub async fn set_featured(&self, seller: UserId, id: ListingId) -> Result<Listing, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE listings SET featured = FALSE WHERE seller_id = $1 AND featured AND id <> $2")
            .bind(seller)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let listing = sqlx::query_as::<_, Listing>(
            r"
            UPDATE listings SET featured = TRUE
            WHERE id = $1 AND seller_id = $2 AND status = 'active'
            RETURNING *
            ",
        )
        .bind(id)
        .bind(seller)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| RepositoryError::Conflict("only an active listing can be featured".to_owned()))?;

        tx.commit().await?;
        Ok(listing)
    }

    /// Buy an active listing.
    ///
    /// Moves the price from buyer to seller, hands the work to the buyer,
    /// marks the listing sold and writes both ledger rows.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the listing does not exist and
    /// `RepositoryError::Conflict` if it is no longer active, belongs to the
    /// buyer, or the buyer cannot afford it.
    pub async fn buy(&self, id: ListingId, buyer: UserId) -> Result<ListingPurchase, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let listing = lock(&mut tx, id).await?.ok_or(RepositoryError::NotFound)?;
        if listing.status != ListingStatus::Active {
            return Err(RepositoryError::Conflict("listing is no longer active".to_owned()));
        }
        if listing.seller_id == buyer {
            return Err(RepositoryError::Conflict("you cannot buy your own listing".to_owned()));
        }

        // Works cannot be deleted while actively listed.
        let work = listing.work_id.ok_or_else(|| {
            RepositoryError::DataCorruption(format!("active listing {id} has no work"))
        })?;

        let coins = wallet::debit(&mut tx, buyer, listing.price).await?;
        wallet::credit(&mut tx, listing.seller_id, listing.price).await?;

        sqlx::query("UPDATE craft_works SET user_id = $2 WHERE id = $1")
            .bind(work)
            .bind(buyer)
            .execute(&mut *tx)
            .await?;

        let sold = sqlx::query_as::<_, Listing>(
            r"
            UPDATE listings
            SET status = $2, featured = FALSE, buyer_id = $3, sold_at = now()
            WHERE id = $1
            RETURNING *
            ",
        )
        .bind(id)
        .bind(ListingStatus::Sold)
        .bind(buyer)
        .fetch_one(&mut *tx)
        .await?;

        let reference = Some(id.as_uuid());
        wallet::record(
            &mut tx,
            buyer,
            TransactionKind::ListingPurchase,
            -listing.price,
            reference,
            &format!("Bought \"{}\"", listing.title),
        )
        .await?;
        wallet::record(
            &mut tx,
            listing.seller_id,
            TransactionKind::ListingSale,
            listing.price,
            reference,
            &format!("Sold \"{}\"", listing.title),
        )
        .await?;

        tx.commit().await?;
        tracing::info!(listing_id = %id, price = listing.price, "Listing sold");

        Ok(ListingPurchase {
            listing: sold,
            coins,
        })
    }
}

async fn lock(conn: &mut PgConnection, id: ListingId) -> Result<Option<Listing>, RepositoryError> {
    let listing = sqlx::query_as::<_, Listing>("SELECT * FROM listings WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(listing)
}
