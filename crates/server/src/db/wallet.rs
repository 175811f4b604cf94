//! Coin balances and the transaction ledger.
//!
//! Balance changes happen inside the caller's transaction through the free
//! functions here, so a debit and its ledger row commit together.

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use aizome_core::{TransactionKind, UserId};

use super::RepositoryError;
use crate::models::{Transaction, Wallet};

/// Number of ledger rows returned with the wallet.
pub const RECENT_TRANSACTIONS: i64 = 50;

/// Repository for wallet reads.
pub struct WalletRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> WalletRepository<'a> {
    /// Create a new wallet repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Balance plus the most recent ledger rows.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user has no profile.
    pub async fn wallet(&self, user: UserId) -> Result<Wallet, RepositoryError> {
        let coins: i64 = sqlx::query_scalar("SELECT coins FROM profiles WHERE id = $1")
            .bind(user)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        let transactions = sqlx::query_as::<_, Transaction>(
            r"
            SELECT * FROM transactions
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            ",
        )
        .bind(user)
        .bind(RECENT_TRANSACTIONS)
        .fetch_all(self.pool)
        .await?;

        Ok(Wallet {
            coins,
            transactions,
        })
    }
}

/// Take `amount` coins from `user`. Returns the new balance.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if the balance is too low, and
/// `RepositoryError::NotFound` if the user has no profile.
pub(crate) async fn debit(
    conn: &mut PgConnection,
    user: UserId,
    amount: i64,
) -> Result<i64, RepositoryError> {
    let balance: Option<i64> = sqlx::query_scalar(
        r"
        UPDATE profiles SET coins = coins - $2, updated_at = now()
        WHERE id = $1 AND coins >= $2
        RETURNING coins
        ",
    )
    .bind(user)
    .bind(amount)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(balance) = balance {
        return Ok(balance);
    }

    let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM profiles WHERE id = $1)")
        .bind(user)
        .fetch_one(&mut *conn)
        .await?;
    if exists {
        Err(RepositoryError::Conflict("not enough coins".to_owned()))
    } else {
        Err(RepositoryError::NotFound)
    }
}

/// Give `amount` coins to `user`. Returns the new balance.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the user has no profile.
pub(crate) async fn credit(
    conn: &mut PgConnection,
    user: UserId,
    amount: i64,
) -> Result<i64, RepositoryError> {
    sqlx::query_scalar(
        r"
        UPDATE profiles SET coins = coins + $2, updated_at = now()
        WHERE id = $1
        RETURNING coins
        ",
    )
    .bind(user)
    .bind(amount)
    .fetch_optional(conn)
    .await?
    .ok_or(RepositoryError::NotFound)
}

/// Append a ledger row. `amount` is negative for debits.
pub(crate) async fn record(
    conn: &mut PgConnection,
    user: UserId,
    kind: TransactionKind,
    amount: i64,
    reference: Option<Uuid>,
    description: &str,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        INSERT INTO transactions (user_id, kind, amount, reference_id, description)
        VALUES ($1, $2, $3, $4, $5)
        ",
    )
    .bind(user)
    .bind(kind)
    .bind(amount)
    .bind(reference)
    .bind(description)
    .execute(conn)
    .await?;
    Ok(())
}
