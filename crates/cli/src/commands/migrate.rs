//! Database migration command.
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` - `PostgreSQL` connection string, or
//! - `DB_USER`, `DB_PASS`, `DB_NAME`, `DB_HOST` - connection parts
//!
//! Migrations live in `crates/server/migrations/` and are embedded at
//! compile time.

use parcelpath_server::config::DatabaseConfig;
use parcelpath_server::db::create_pool;

use super::CommandError;

/// Apply all pending migrations.
///
/// # Errors
///
/// Returns `CommandError` if configuration is missing, the database is
/// unreachable, or a migration fails.
pub async fn run() -> Result<(), CommandError> {
    let database = DatabaseConfig::from_env()?;

    tracing::info!("Connecting to database...");
    let pool = create_pool(&database).await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../server/migrations").run(&pool).await?;

    tracing::info!("Migrations complete");
    Ok(())
}
