//! Persistence seams for ingested images
//!
//! Two traits separate the pipeline from concrete backends:
//! - [`BlobStore`] durably stores object bytes under a relative path,
//!   overwriting whatever was there.
//! - [`RecordStore`] holds the structured image records and the run metadata.
//!
//! [`ArtifactStore`] combines both into the operations the sync loop needs.
//! [`FsBlobStore`] is the filesystem blob backend; the SQLite
//! [`Database`](crate::db::Database) implements [`RecordStore`].

use crate::error::{PersistError, UploadError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::Path;

mod artifacts;
mod fs;

pub use artifacts::ArtifactStore;
pub use fs::FsBlobStore;

/// An object written to blob storage
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Object path relative to the store root
    pub path: String,
    /// Number of bytes written
    pub bytes: u64,
    /// Hex-encoded SHA-256 of the object contents
    pub sha256: String,
}

/// Durable object storage addressed by relative path
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Copy the local file at `source` to `dest`, overwriting any existing object
    ///
    /// `dest` is a `/`-separated relative path. The source file is left in place.
    async fn put_file(&self, source: &Path, dest: &str) -> Result<StoredObject, UploadError>;
}

/// Structured record storage
///
/// Implementations provide plain reads and writes; the insert-or-overwrite
/// decision is made by [`ArtifactStore::upsert_record`].
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Id of the record named `name`, if one exists
    async fn lookup_record(&self, name: &str) -> Result<Option<i64>, PersistError>;

    /// Insert a new record and return its id
    async fn insert_record(&self, name: &str, storage_path: &str) -> Result<i64, PersistError>;

    /// Overwrite every field of record `id`
    async fn overwrite_record(
        &self,
        id: i64,
        name: &str,
        storage_path: &str,
    ) -> Result<(), PersistError>;

    /// Create or overwrite the run metadata record with `at`
    async fn record_last_run(&self, at: DateTime<Utc>) -> Result<(), PersistError>;
}
