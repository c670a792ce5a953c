//! Filesystem blob store.

use crate::error::UploadError;
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::path::{Component, Path, PathBuf};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use super::{BlobStore, StoredObject};

const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// Blob store rooted at a local directory
///
/// Objects are written to a sibling temporary file first and renamed into
/// place, so a reader never observes a half-written object and an existing
/// object is replaced whole.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    /// Create a store rooted at `root` (created on first write)
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Map a relative object path onto the filesystem
    fn resolve(&self, dest: &str) -> Result<PathBuf, UploadError> {
        let invalid = |reason: &str| UploadError::InvalidPath {
            path: dest.to_string(),
            reason: reason.to_string(),
        };

        if dest.is_empty() || dest.ends_with('/') {
            return Err(invalid("object path must name a file"));
        }

        let relative = Path::new(dest);
        let mut resolved = self.root.clone();
        for component in relative.components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                Component::ParentDir => return Err(invalid("parent directory component")),
                Component::RootDir | Component::Prefix(_) => {
                    return Err(invalid("object path must be relative"));
                }
            }
        }

        if resolved == self.root {
            return Err(invalid("object path must name a file"));
        }
        Ok(resolved)
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put_file(&self, source: &Path, dest: &str) -> Result<StoredObject, UploadError> {
        let target = self.resolve(dest)?;
        let io_err = |source: std::io::Error| UploadError::Io {
            path: dest.to_string(),
            source,
        };

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }

        let mut staging_name = target.file_name().unwrap_or_default().to_os_string();
        staging_name.push(".partial");
        let staging = target.with_file_name(staging_name);

        match copy_with_digest(source, &staging).await {
            Ok((bytes, sha256)) => {
                if let Err(e) = tokio::fs::rename(&staging, &target).await {
                    let _ = tokio::fs::remove_file(&staging).await;
                    return Err(io_err(e));
                }
                tracing::debug!(path = dest, bytes, "Stored object");
                Ok(StoredObject {
                    path: dest.to_string(),
                    bytes,
                    sha256,
                })
            }
            Err(e) => {
                let _ = tokio::fs::remove_file(&staging).await;
                Err(io_err(e))
            }
        }
    }
}

/// Copy `source` to `dest` while hashing, returning the size and hex digest
async fn copy_with_digest(source: &Path, dest: &Path) -> std::io::Result<(u64, String)> {
    let mut reader = tokio::fs::File::open(source).await?;
    let mut writer = tokio::fs::File::create(dest).await?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; COPY_BUFFER_SIZE];
    let mut total = 0u64;

    loop {
        let n = reader.read(&mut buffer).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
        writer.write_all(&buffer[..n]).await?;
        total += n as u64;
    }

    writer.flush().await?;
    writer.sync_all().await?;

    Ok((total, format!("{:x}", hasher.finalize())))
}
