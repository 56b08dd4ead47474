//! Embedded `SQLite` database holding the registry and cache tables.

use std::str::FromStr;
use std::time::Duration;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use crate::error::Result;

/// Open (or create) the metadata database and run migrations.
///
/// Foreign keys are enabled per connection so that deleting a project
/// cascades to its documents. `":memory:"` opens a private in-memory database
/// on a single connection.
///
/// # Errors
///
/// Returns an error if the database cannot be opened or migrations fail.
pub async fn open_pool(path: &str, timeout: Duration) -> Result<SqlitePool> {
    let in_memory = path == ":memory:";
    let url = if in_memory {
        "sqlite::memory:".to_string()
    } else {
        if let Some(parent) = std::path::Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| crate::StoreError::InvalidPath {
                path: parent.to_path_buf(),
                reason: e.to_string(),
            })?;
        }
        format!("sqlite:{path}?mode=rwc")
    };

    let opts = SqliteConnectOptions::from_str(&url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(timeout)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);

    let pool = SqlitePoolOptions::new()
        .max_connections(if in_memory { 1 } else { 5 })
        .acquire_timeout(timeout)
        .connect_with(opts)
        .await?;

    run_migrations(&pool).await?;
    tracing::debug!(path, "metadata database ready");
    Ok(pool)
}

/// Run all migrations on the given pool.
///
/// # Errors
///
/// Returns an error if any migration fails.
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}
