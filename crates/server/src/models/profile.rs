//! Profiles and the coin ledger.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use aizome_core::{TransactionId, TransactionKind, UserId};

/// A `profiles` row.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Profile {
    pub id: UserId,
    pub username: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub bio: String,
    pub coins: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A `transactions` row. `amount` is signed: debits are negative.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Transaction {
    pub id: TransactionId,
    pub user_id: UserId,
    pub kind: TransactionKind,
    pub amount: i64,
    pub reference_id: Option<Uuid>,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// Coin balance with recent ledger entries.
#[derive(Debug, Clone, Serialize)]
pub struct Wallet {
    pub coins: i64,
    pub transactions: Vec<Transaction>,
}
