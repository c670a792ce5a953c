//! Sync metadata: the last-run timestamp.

use crate::error::DatabaseError;
use crate::{Error, Result};
use chrono::{DateTime, Utc};

use super::{Database, millis_to_datetime};

const LAST_RUN_KEY: &str = "last_run_at";

impl Database {
    /// Record when the pipeline last ran
    ///
    /// Creates the metadata record on first use and overwrites it afterwards.
    /// Stored with millisecond precision.
    pub async fn set_last_run_at(&self, at: DateTime<Utc>) -> Result<()> {
        let value = at.timestamp_millis().to_string();
        let now = Utc::now().timestamp();

        sqlx::query(
            r#"
            INSERT INTO sync_metadata (key, value, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(LAST_RUN_KEY)
        .bind(&value)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to record last run: {}",
                e
            )))
        })?;

        Ok(())
    }

    /// When the pipeline last ran, if ever
    pub async fn last_run_at(&self) -> Result<Option<DateTime<Utc>>> {
        let value: Option<String> =
            sqlx::query_scalar("SELECT value FROM sync_metadata WHERE key = ?")
                .bind(LAST_RUN_KEY)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    Error::Database(DatabaseError::QueryFailed(format!(
                        "Failed to read last run: {}",
                        e
                    )))
                })?;

        value
            .map(|v| {
                v.parse::<i64>().map(millis_to_datetime).map_err(|e| {
                    Error::Database(DatabaseError::QueryFailed(format!(
                        "Corrupt last run value {:?}: {}",
                        v, e
                    )))
                })
            })
            .transpose()
    }
}
