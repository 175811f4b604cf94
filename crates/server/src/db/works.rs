//! Craft works and the score leaderboard.

use sqlx::PgPool;
use sqlx::types::Json;

use aizome_core::{UserId, WorkId};

use super::RepositoryError;
use crate::models::{CraftWork, LeaderboardEntry};
use crate::services::scoring::{CraftLayer, ScoreCard};

/// Default number of leaderboard rows.
pub const LEADERBOARD_SIZE: i64 = 20;

/// Repository for craft work database operations.
pub struct WorkRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> WorkRepository<'a> {
    /// Create a new work repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Save a scored work owned by `user`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        user: UserId,
        title: &str,
        layers: &[CraftLayer],
        card: &ScoreCard,
    ) -> Result<CraftWork, RepositoryError> {
        let score = i32::try_from(card.score)
            .map_err(|_| RepositoryError::DataCorruption(format!("score {} out of range", card.score)))?;

        let work = sqlx::query_as::<_, CraftWork>(
            r"
            INSERT INTO craft_works (user_id, title, layers, score, grade, suggested_price)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            ",
        )
        .bind(user)
        .bind(title)
        .bind(Json(layers))
        .bind(score)
        .bind(card.grade.as_str())
        .bind(card.suggested_price)
        .fetch_one(self.pool)
        .await?;

        tracing::info!(work_id = %work.id, score, grade = %card.grade, "Work saved");
        Ok(work)
    }

    /// Works currently owned by `user`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user: UserId) -> Result<Vec<CraftWork>, RepositoryError> {
        let works = sqlx::query_as::<_, CraftWork>(
            "SELECT * FROM craft_works WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user)
        .fetch_all(self.pool)
        .await?;
        Ok(works)
    }

    /// Get a work by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: WorkId) -> Result<Option<CraftWork>, RepositoryError> {
        let work = sqlx::query_as::<_, CraftWork>("SELECT * FROM craft_works WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(work)
    }

    /// Delete a work unless it is actively listed.
    ///
    /// Closed listings of the work keep their rows with `work_id` cleared.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` while an active listing exists,
    /// or `RepositoryError::NotFound` if the work is gone.
    pub async fn delete(&self, id: WorkId) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            DELETE FROM craft_works
            WHERE id = $1
              AND NOT EXISTS (SELECT 1 FROM listings WHERE work_id = $1 AND status = 'active')
            ",
        )
        .bind(id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(());
        }
        match self.get(id).await? {
            Some(_) => Err(RepositoryError::Conflict(
                "withdraw the listing before deleting this work".to_owned(),
            )),
            None => Err(RepositoryError::NotFound),
        }
    }

    /// Highest scoring works. Ties go to the earlier work.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn leaderboard(&self, limit: i64) -> Result<Vec<LeaderboardEntry>, RepositoryError> {
        let entries = sqlx::query_as::<_, LeaderboardEntry>(
            r"
            SELECT w.id AS work_id, w.title, w.score, w.grade, w.user_id,
                   p.username, w.created_at
            FROM craft_works w
            LEFT JOIN profiles p ON p.id = w.user_id
            ORDER BY w.score DESC, w.created_at ASC
            LIMIT $1
            ",
        )
        .bind(limit)
        .fetch_all(self.pool)
        .await?;
        Ok(entries)
    }
}
