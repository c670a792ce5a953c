//! [`RecordStore`] backed by SQLite.

use crate::error::PersistError;
use crate::storage::RecordStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{Database, NewImageRecord};

#[async_trait]
impl RecordStore for Database {
    async fn lookup_record(&self, name: &str) -> Result<Option<i64>, PersistError> {
        self.find_image_by_name(name)
            .await
            .map(|record| record.map(|r| r.id))
            .map_err(|e| PersistError::Lookup {
                name: name.to_string(),
                reason: e.to_string(),
            })
    }

    async fn insert_record(&self, name: &str, storage_path: &str) -> Result<i64, PersistError> {
        let record = NewImageRecord {
            name: name.to_string(),
            storage_path: storage_path.to_string(),
        };
        self.insert_image(&record)
            .await
            .map_err(|e| PersistError::Write {
                name: name.to_string(),
                reason: e.to_string(),
            })
    }

    async fn overwrite_record(
        &self,
        id: i64,
        name: &str,
        storage_path: &str,
    ) -> Result<(), PersistError> {
        let record = NewImageRecord {
            name: name.to_string(),
            storage_path: storage_path.to_string(),
        };
        match self.update_image(id, &record).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(PersistError::Write {
                name: name.to_string(),
                reason: format!("record {} disappeared before overwrite", id),
            }),
            Err(e) => Err(PersistError::Write {
                name: name.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    async fn record_last_run(&self, at: DateTime<Utc>) -> Result<(), PersistError> {
        self.set_last_run_at(at)
            .await
            .map_err(|e| PersistError::Metadata {
                reason: e.to_string(),
            })
    }
}
