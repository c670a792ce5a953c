//! Upload and record-upsert operations used by the sync loop.

use crate::downloader::LocalArtifact;
use crate::error::{PersistError, UploadError};
use crate::types::RecordWrite;
use crate::utils::blob_path;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::debug;

use super::{BlobStore, RecordStore, StoredObject};

/// Blob and record stores bound to one source tag
#[derive(Clone)]
pub struct ArtifactStore {
    blobs: Arc<dyn BlobStore>,
    records: Arc<dyn RecordStore>,
    prefix: String,
    source_tag: String,
}

impl std::fmt::Debug for ArtifactStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactStore")
            .field("prefix", &self.prefix)
            .field("source_tag", &self.source_tag)
            .finish_non_exhaustive()
    }
}

impl ArtifactStore {
    /// Bind the stores to an object path prefix and source tag
    pub fn new(
        blobs: Arc<dyn BlobStore>,
        records: Arc<dyn RecordStore>,
        prefix: impl Into<String>,
        source_tag: impl Into<String>,
    ) -> Self {
        Self {
            blobs,
            records,
            prefix: prefix.into(),
            source_tag: source_tag.into(),
        }
    }

    /// Object path for a file name: `<prefix>/<source_tag>/<file_name>`
    pub fn storage_path(&self, file_name: &str) -> String {
        blob_path(&self.prefix, &self.source_tag, file_name)
    }

    /// Write a downloaded artifact to blob storage
    ///
    /// Overwrites any existing object at the destination. The artifact itself
    /// is not removed.
    pub async fn upload(
        &self,
        artifact: &LocalArtifact,
        file_name: &str,
    ) -> Result<StoredObject, UploadError> {
        let dest = self.storage_path(file_name);
        self.blobs.put_file(artifact.path(), &dest).await
    }

    /// Insert the record `name` if absent, otherwise overwrite it
    ///
    /// The lookup and the write are separate operations, so two concurrent
    /// upserts of the same new name can both insert.
    pub async fn upsert_record(
        &self,
        name: &str,
        storage_path: &str,
    ) -> Result<RecordWrite, PersistError> {
        match self.records.lookup_record(name).await? {
            Some(id) => {
                self.records
                    .overwrite_record(id, name, storage_path)
                    .await?;
                debug!(name, id, "Overwrote image record");
                Ok(RecordWrite::Updated(id))
            }
            None => {
                let id = self.records.insert_record(name, storage_path).await?;
                debug!(name, id, "Inserted image record");
                Ok(RecordWrite::Created(id))
            }
        }
    }

    /// Create or overwrite the run metadata record
    pub async fn record_last_run(&self, at: DateTime<Utc>) -> Result<(), PersistError> {
        self.records.record_last_run(at).await
    }
}
