//! Craft works, the item catalog and the listing market.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::types::Json;

use aizome_core::{ItemId, ItemKind, ListingId, ListingStatus, UserId, WorkId};

use crate::services::scoring::CraftLayer;

/// A `craft_works` row. `user_id` is the current owner.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CraftWork {
    pub id: WorkId,
    pub user_id: UserId,
    pub title: String,
    pub layers: Json<Vec<CraftLayer>>,
    pub score: i32,
    pub grade: String,
    pub suggested_price: i64,
    pub created_at: DateTime<Utc>,
}

/// One leaderboard row.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct LeaderboardEntry {
    pub work_id: WorkId,
    pub title: String,
    pub score: i32,
    pub grade: String,
    pub user_id: UserId,
    pub username: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// An `items` row.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub description: String,
    pub kind: ItemKind,
    pub price: i64,
    pub consumable: bool,
    pub created_at: DateTime<Utc>,
}

/// An inventory row joined with its item.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct InventoryItem {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub item: Item,
    pub quantity: i32,
    pub equipped: bool,
    pub acquired_at: DateTime<Utc>,
}

/// A `listings` row.
///
/// `work_id` is `None` once the work was deleted after the listing closed.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Listing {
    pub id: ListingId,
    pub seller_id: UserId,
    pub work_id: Option<WorkId>,
    pub title: String,
    pub price: i64,
    pub status: ListingStatus,
    pub featured: bool,
    pub buyer_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub sold_at: Option<DateTime<Utc>>,
}

/// A listing joined with its work's grade and its seller's name.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ListingView {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub listing: Listing,
    pub score: i32,
    pub grade: String,
    pub seller_name: Option<String>,
}
