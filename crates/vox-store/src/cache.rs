//! Per-project memoisation keyed by `(project_id, key)`.
//!
//! Values are stored JSON-encoded. Rows written by other tools that are not
//! valid JSON come back as a plain string.

use serde::Serialize;
use sqlx::SqlitePool;

use crate::error::Result;

#[derive(Debug, Clone)]
pub struct CacheLayer {
    pool: SqlitePool,
}

impl CacheLayer {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get(&self, project_id: &str, key: &str) -> Result<Option<serde_json::Value>> {
        let raw: Option<String> =
            sqlx::query_scalar("SELECT value FROM cache WHERE project_id = ? AND key = ?")
                .bind(project_id)
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;
        Ok(raw.map(|raw| {
            serde_json::from_str(&raw).unwrap_or(serde_json::Value::String(raw))
        }))
    }

    /// Insert or replace an entry, refreshing `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be serialised or the write fails.
    pub async fn set<T: Serialize + ?Sized>(
        &self,
        project_id: &str,
        key: &str,
        value: &T,
    ) -> Result<()> {
        let encoded = serde_json::to_string(value)?;
        sqlx::query(
            "INSERT INTO cache (project_id, key, value, updated_at) \
             VALUES (?, ?, ?, datetime('now')) \
             ON CONFLICT(project_id, key) DO UPDATE SET \
             value = excluded.value, \
             updated_at = datetime('now')",
        )
        .bind(project_id)
        .bind(key)
        .bind(encoded)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Drop one entry, or every entry of the project when `key` is `None`.
    ///
    /// Returns the number of rows removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub async fn invalidate(&self, project_id: &str, key: Option<&str>) -> Result<u64> {
        let result = match key {
            Some(key) => {
                sqlx::query("DELETE FROM cache WHERE project_id = ? AND key = ?")
                    .bind(project_id)
                    .bind(key)
                    .execute(&self.pool)
                    .await?
            }
            None => {
                sqlx::query("DELETE FROM cache WHERE project_id = ?")
                    .bind(project_id)
                    .execute(&self.pool)
                    .await?
            }
        };
        Ok(result.rows_affected())
    }

    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn count(&self, project_id: &str) -> Result<u64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cache WHERE project_id = ?")
            .bind(project_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(u64::try_from(n).unwrap_or(0))
    }
}
