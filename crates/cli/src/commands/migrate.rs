//! Database migration command.
//!
//! Applies `crates/server/migrations/` and creates the `tower_sessions`
//! schema used by the server's session layer. Both steps are idempotent.

use sqlx::PgPool;
use tower_sessions_sqlx_store::PostgresStore;

use super::CommandError;

/// Run all migrations.
///
/// # Errors
///
/// Returns an error if a migration fails to apply.
pub async fn run(pool: &PgPool) -> Result<(), CommandError> {
    tracing::info!("Running schema migrations...");
    sqlx::migrate!("../server/migrations").run(pool).await?;

    tracing::info!("Running session store migrations...");
    PostgresStore::new(pool.clone())
        .migrate()
        .await
        .map_err(|e| CommandError::SessionStore(e.to_string()))?;

    tracing::info!("Migrations complete!");
    Ok(())
}
