//! Streaming image downloads into scoped temporary files.
//!
//! Each download lands in a uniquely named file inside the configured work
//! directory. The file is owned by the returned [`LocalArtifact`] and removed
//! when the artifact is discarded or dropped. A failed or timed-out download
//! removes its partial file before returning.

use crate::error::DownloadError;
use crate::wiki::Session;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempPath;
use tokio::io::AsyncWriteExt;
use tracing::debug;
use url::Url;

const TEMP_PREFIX: &str = "wiki-image-";
const TEMP_SUFFIX: &str = ".part";

/// Downloaded bytes in a scoped local file
#[derive(Debug)]
pub struct LocalArtifact {
    path: TempPath,
    bytes: u64,
}

impl LocalArtifact {
    /// Location of the file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of bytes written
    pub fn len(&self) -> u64 {
        self.bytes
    }

    /// Whether the download was empty
    pub fn is_empty(&self) -> bool {
        self.bytes == 0
    }

    /// Remove the file now and report whether removal succeeded
    pub fn discard(self) -> std::io::Result<()> {
        self.path.close()
    }
}

/// HTTP downloader bound to a work directory and a per-download timeout
#[derive(Clone, Debug)]
pub struct ImageDownloader {
    http: reqwest::Client,
    work_dir: PathBuf,
    timeout: Duration,
}

impl ImageDownloader {
    /// Create a downloader
    ///
    /// `timeout` bounds the whole transfer: connect, headers and body.
    pub fn new(http: reqwest::Client, work_dir: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            http,
            work_dir: work_dir.into(),
            timeout,
        }
    }

    /// Directory temporary files are created in
    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Fetch `url` into a fresh temporary file
    ///
    /// # Errors
    /// Returns [`DownloadError`] if the file cannot be created, the request
    /// fails or returns a non-success status, writing fails, or the timeout
    /// elapses. No partial file survives an error.
    pub async fn download(
        &self,
        url: &Url,
        session: &Session,
    ) -> Result<LocalArtifact, DownloadError> {
        let temp_err = |source| DownloadError::TempFile {
            dir: self.work_dir.clone(),
            source,
        };

        tokio::fs::create_dir_all(&self.work_dir)
            .await
            .map_err(temp_err)?;
        let (file, path) = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .suffix(TEMP_SUFFIX)
            .tempfile_in(&self.work_dir)
            .map_err(temp_err)?
            .into_parts();
        let mut file = tokio::fs::File::from_std(file);

        debug!(url = %url, path = %path.display(), "Starting download");

        let outcome = tokio::time::timeout(
            self.timeout,
            self.stream_into(url, session, &mut file, &path),
        )
        .await;
        drop(file);

        let failure = match outcome {
            Ok(Ok(bytes)) => {
                debug!(url = %url, bytes, "Download complete");
                return Ok(LocalArtifact { path, bytes });
            }
            Ok(Err(e)) => e,
            Err(_) => DownloadError::TimedOut {
                url: url.to_string(),
                timeout: self.timeout,
            },
        };

        if let Err(e) = path.close() {
            tracing::warn!(url = %url, error = %e, "Failed to remove partial download");
        }
        Err(failure)
    }

    async fn stream_into(
        &self,
        url: &Url,
        session: &Session,
        file: &mut tokio::fs::File,
        path: &Path,
    ) -> Result<u64, DownloadError> {
        let transport = |source| DownloadError::Transport {
            url: url.to_string(),
            source,
        };
        let write_err = |source| DownloadError::Write {
            path: path.to_path_buf(),
            source,
        };

        let mut response = session
            .authorize(self.http.get(url.clone()))
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await.map_err(transport)? {
            file.write_all(&chunk).await.map_err(write_err)?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(write_err)?;
        file.sync_all().await.map_err(write_err)?;

        Ok(written)
    }
}
