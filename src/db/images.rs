//! Image record operations.

use crate::{Error, Result};

use super::{Database, ImageRecord, NewImageRecord};

impl Database {
    /// Insert a new image record
    ///
    /// The `image` column is always written as NULL. Returns the new row id.
    pub async fn insert_image(&self, record: &NewImageRecord) -> Result<i64> {
        let now = chrono::Utc::now().timestamp_millis();

        let result = sqlx::query(
            r#"
            INSERT INTO images (name, storage_path, image, created_at, updated_at)
            VALUES (?, ?, NULL, ?, ?)
            "#,
        )
        .bind(&record.name)
        .bind(&record.storage_path)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(Error::Sqlx)?;

        Ok(result.last_insert_rowid())
    }

    /// Find an image record by name
    ///
    /// If several rows share the name, the oldest one (lowest id) is returned.
    pub async fn find_image_by_name(&self, name: &str) -> Result<Option<ImageRecord>> {
        let row = sqlx::query_as::<_, ImageRecord>(
            r#"
            SELECT id, name, storage_path, image, created_at, updated_at
            FROM images
            WHERE name = ?
            ORDER BY id ASC
            LIMIT 1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Sqlx)?;

        Ok(row)
    }

    /// Overwrite an existing image record in full
    ///
    /// Returns `false` if no row has the given id.
    pub async fn update_image(&self, id: i64, record: &NewImageRecord) -> Result<bool> {
        let now = chrono::Utc::now().timestamp_millis();

        let result = sqlx::query(
            r#"
            UPDATE images
            SET name = ?, storage_path = ?, image = NULL, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&record.name)
        .bind(&record.storage_path)
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(Error::Sqlx)?;

        Ok(result.rows_affected() > 0)
    }

    /// List every image record ordered by id
    pub async fn list_images(&self) -> Result<Vec<ImageRecord>> {
        let rows = sqlx::query_as::<_, ImageRecord>(
            r#"
            SELECT id, name, storage_path, image, created_at, updated_at
            FROM images
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Sqlx)?;

        Ok(rows)
    }

    /// Count image records with the given name
    pub async fn count_images_named(&self, name: &str) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM images WHERE name = ?")
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Sqlx)?;

        Ok(count)
    }
}
