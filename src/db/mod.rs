//! Database layer for wiki-image-sync
//!
//! Handles SQLite persistence for image records and sync metadata.
//!
//! ## Submodules
//!
//! Methods on [`Database`] are organized by domain:
//! - [`migrations`] — Database lifecycle, schema migrations
//! - [`images`] — Image record CRUD
//! - [`sync_state`] — Last-run timestamp
//! - [`records`] — [`RecordStore`](crate::storage::RecordStore) implementation

use chrono::{DateTime, TimeZone, Utc};
use sqlx::{FromRow, sqlite::SqlitePool};

mod images;
mod migrations;
mod records;
mod sync_state;

/// New image record to be inserted into the database
#[derive(Debug, Clone)]
pub struct NewImageRecord {
    /// Record name (file name without extension)
    pub name: String,
    /// Object path in blob storage
    pub storage_path: String,
}

/// Image record from database
#[derive(Debug, Clone, FromRow)]
pub struct ImageRecord {
    /// Unique database ID
    pub id: i64,
    /// Record name (file name without extension)
    pub name: String,
    /// Object path in blob storage
    pub storage_path: String,
    /// Auxiliary image reference, always NULL when written by the sync
    pub image: Option<String>,
    /// Unix timestamp (milliseconds) when the record was created
    pub created_at: i64,
    /// Unix timestamp (milliseconds) of the last overwrite
    pub updated_at: i64,
}

pub(crate) fn millis_to_datetime(millis: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// Database handle for wiki-image-sync
pub struct Database {
    pool: SqlitePool,
}
