//! Database access
//!
//! One SQLite file holds both halves of the persisted state: the
//! `properties` record store (keyed by `property_id`, with rowid as the
//! insertion sequence) and the `properties_fts` full-text index keyed by
//! that same rowid. The pool runs in WAL journal mode so search and lookup
//! queries proceed concurrently with an in-progress ingestion run and never
//! observe a half-committed chunk.

pub mod search;

use std::path::Path;
use std::time::Duration;

use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions,
    SqliteSynchronous,
};
use tracing::info;

use escheat_common::Result;

use crate::config::DatabaseConfig;

/// Open (creating if missing) the database at the configured path.
pub async fn create_pool(config: &DatabaseConfig) -> Result<SqlitePool> {
    if let Some(parent) = Path::new(&config.path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let options = SqliteConnectOptions::new()
        .filename(&config.path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(Duration::from_millis(config.busy_timeout_ms))
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(options)
        .await?;

    info!(path = %config.path, "Database pool established");
    Ok(pool)
}

/// Apply pending migrations from the workspace `migrations/` directory.
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    sqlx::migrate!("../../migrations").run(pool).await?;
    info!("Database migrations completed");
    Ok(())
}
