//! Profile queries. A profile row is created the first time a user shows up.

use sqlx::PgPool;

use aizome_core::UserId;

use super::RepositoryError;
use crate::models::Profile;

/// Fields a user may change on their own profile. `None` leaves a field as is.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
}

/// Repository for profile database operations.
pub struct ProfileRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProfileRepository<'a> {
    /// Create a new profile repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a profile by user id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: UserId) -> Result<Option<Profile>, RepositoryError> {
        let profile = sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(profile)
    }

    /// Get the profile, creating it with `username` if it does not exist.
    ///
    /// If `username` is taken by someone else the profile is created with a
    /// name derived from the full user id instead.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_or_create(
        &self,
        id: UserId,
        username: &str,
        display_name: &str,
    ) -> Result<Profile, RepositoryError> {
        if let Some(profile) = self.get(id).await? {
            return Ok(profile);
        }

        let tag: String = id.as_uuid().simple().to_string().chars().take(20).collect();
        let fallback = format!("u_{tag}");
        for candidate in [username, fallback.as_str()] {
            let created = sqlx::query_as::<_, Profile>(
                r"
                INSERT INTO profiles (id, username, display_name)
                VALUES ($1, $2, $3)
                ON CONFLICT DO NOTHING
                RETURNING *
                ",
            )
            .bind(id)
            .bind(candidate)
            .bind(display_name)
            .fetch_optional(self.pool)
            .await?;

            if let Some(profile) = created {
                tracing::info!(user_id = %id, username = %profile.username, "Profile created");
                return Ok(profile);
            }
            // Lost a race with a concurrent first request for the same user
            if let Some(profile) = self.get(id).await? {
                return Ok(profile);
            }
        }

        Err(RepositoryError::Conflict("could not allocate a username".to_owned()))
    }

    /// Apply a partial update.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the username is taken, or
    /// `RepositoryError::NotFound` if the profile does not exist.
    pub async fn update(&self, id: UserId, update: &ProfileUpdate) -> Result<Profile, RepositoryError> {
        sqlx::query_as::<_, Profile>(
            r"
            UPDATE profiles SET
                username = COALESCE($2, username),
                display_name = COALESCE($3, display_name),
                avatar_url = COALESCE($4, avatar_url),
                bio = COALESCE($5, bio),
                updated_at = now()
            WHERE id = $1
            RETURNING *
            ",
        )
        .bind(id)
        .bind(update.username.as_deref())
        .bind(update.display_name.as_deref())
        .bind(update.avatar_url.as_deref())
        .bind(update.bio.as_deref())
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::unique(e, "username is already taken"))?
        .ok_or(RepositoryError::NotFound)
    }
}
