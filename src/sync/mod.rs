//! Sync run orchestration
//!
//! One run walks the stages in order:
//! 1. Authenticate against the wiki
//! 2. List the images embedded in the configured page
//! 3. Keep the ones whose extension passes the filter
//! 4. For each kept image: resolve its URL, download it, upload it to blob
//!    storage, remove the local copy, upsert its record
//! 5. Write the run timestamp
//!
//! Failures in steps 1 and 2 abort the run before anything is written. A
//! failure while processing one image is logged and recorded in the report,
//! and the loop moves on to the next image.

use crate::config::{Config, Credentials};
use crate::downloader::ImageDownloader;
use crate::error::{Error, ErrorCode, ItemError, Result};
use crate::filter::ImageFilter;
use crate::storage::{ArtifactStore, BlobStore, RecordStore};
use crate::types::{ImageReference, IngestedImage, ItemOutcome, RunContext, RunReport, SyncStage};
use crate::wiki::{Session, WikiClient};
use chrono::{SubsecRound, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Drives authenticate → list → filter → ingest → finalize
#[derive(Clone, Debug)]
pub struct SyncOrchestrator {
    wiki: WikiClient,
    credentials: Credentials,
    page: String,
    filter: ImageFilter,
    downloader: ImageDownloader,
    artifacts: ArtifactStore,
}

impl SyncOrchestrator {
    /// Wire an orchestrator from configuration and storage backends
    ///
    /// `http` is shared by the wiki client and the downloader.
    ///
    /// # Errors
    /// Returns a configuration error if `config` does not validate.
    pub fn new(
        config: &Config,
        http: reqwest::Client,
        blobs: Arc<dyn BlobStore>,
        records: Arc<dyn RecordStore>,
    ) -> Result<Self> {
        config.validate()?;

        let wiki = WikiClient::from_config(http.clone(), &config.wiki, &config.timeouts)?;
        let downloader = ImageDownloader::new(
            http,
            config.storage.work_dir.clone(),
            config.timeouts.download,
        );
        let artifacts = ArtifactStore::new(
            blobs,
            records,
            config.storage.prefix.clone(),
            config.storage.source_tag.clone(),
        );

        Ok(Self {
            wiki,
            credentials: config.credentials.clone(),
            page: config.wiki.page.clone(),
            filter: ImageFilter::new(&config.filter),
            downloader,
            artifacts,
        })
    }

    /// Execute one sync run
    ///
    /// Returns a report once the run timestamp has been written, even if some
    /// images failed.
    ///
    /// # Errors
    /// - [`Error::Auth`] if login fails
    /// - [`Error::Fetch`] if the image list cannot be fetched
    /// - [`Error::Persist`] if the run timestamp cannot be written
    pub async fn run(&self, ctx: &RunContext) -> Result<RunReport> {
        let started_at = Utc::now();
        info!(
            page = %self.page,
            caller = ctx.caller.as_deref().unwrap_or("-"),
            started_at = %started_at,
            "Starting sync run"
        );

        let mut stage = SyncStage::Authenticating;
        debug!(stage = %stage, "Entering stage");
        let session = match self.wiki.login(&self.credentials).await {
            Ok(session) => session,
            Err(e) => return Err(self.abort(stage, e.into())),
        };

        stage = SyncStage::Listing;
        debug!(stage = %stage, "Entering stage");
        let listed = match self.wiki.fetch_image_names(&session, &self.page).await {
            Ok(listed) => listed,
            Err(e) => return Err(self.abort(stage, e.into())),
        };

        stage = SyncStage::Filtering;
        debug!(stage = %stage, "Entering stage");
        let listed_count = listed.len();
        let allowed = self.filter.filter_allowed(listed);
        let total = allowed.len();
        info!(
            page = %self.page,
            listed = listed_count,
            allowed = total,
            "Filtered image list"
        );

        let mut outcomes = Vec::with_capacity(total);
        for (index, image) in allowed.into_iter().enumerate() {
            stage = SyncStage::Processing { index, total };
            debug!(stage = %stage, "Entering stage");

            let image = image.into_reference();
            let result = self.process_image(&session, &image).await;
            match &result {
                Ok(ingested) => info!(
                    image = %image,
                    path = %ingested.storage_path,
                    bytes = ingested.bytes,
                    sha256 = %ingested.sha256,
                    record_id = ingested.record.id(),
                    "Image ingested"
                ),
                Err(e) => warn!(
                    image = %image,
                    stage = e.stage(),
                    error_code = e.error_code(),
                    error = %e,
                    "Image failed"
                ),
            }
            outcomes.push(ItemOutcome {
                position: index,
                image,
                result,
            });
        }

        stage = SyncStage::Finalizing;
        debug!(stage = %stage, "Entering stage");
        let finalized_at = Utc::now().trunc_subsecs(3);
        if let Err(e) = self.artifacts.record_last_run(finalized_at).await {
            return Err(self.abort(stage, e.into()));
        }

        let report = RunReport {
            started_at,
            finalized_at,
            listed: listed_count,
            allowed: total,
            outcomes,
        };
        info!(
            stage = %SyncStage::Done,
            started_at = %started_at,
            succeeded = report.succeeded(),
            failed = report.failed(),
            "Sync run finished"
        );
        Ok(report)
    }

    /// [`run`](Self::run) bounded by a wall-clock deadline
    ///
    /// Work in flight when the deadline hits is dropped, which also removes any
    /// temporary file it owned.
    ///
    /// # Errors
    /// [`Error::DeadlineExceeded`] if the run does not finish in time, otherwise
    /// whatever [`run`](Self::run) returns.
    pub async fn run_with_deadline(
        &self,
        ctx: &RunContext,
        deadline: Duration,
    ) -> Result<RunReport> {
        match tokio::time::timeout(deadline, self.run(ctx)).await {
            Ok(result) => result,
            Err(_) => {
                let err = Error::DeadlineExceeded(deadline);
                error!(
                    page = %self.page,
                    error_code = err.error_code(),
                    error = %err,
                    "Sync run aborted"
                );
                Err(err)
            }
        }
    }

    async fn process_image(
        &self,
        session: &Session,
        image: &ImageReference,
    ) -> std::result::Result<IngestedImage, ItemError> {
        let url = self.wiki.resolve_download_url(session, image).await?;
        let artifact = self.downloader.download(&url, session).await?;

        let uploaded = self.artifacts.upload(&artifact, image.file_name()).await;
        if let Err(e) = artifact.discard() {
            warn!(image = %image, error = %e, "Failed to remove temporary file");
        }
        let stored = uploaded?;

        let name = image.record_name();
        let record = self.artifacts.upsert_record(name, &stored.path).await?;

        Ok(IngestedImage {
            name: name.to_string(),
            storage_path: stored.path,
            bytes: stored.bytes,
            sha256: stored.sha256,
            record,
        })
    }

    fn abort(&self, stage: SyncStage, err: Error) -> Error {
        error!(
            page = %self.page,
            stage = %stage,
            error_code = err.error_code(),
            error = %err,
            "Sync run aborted"
        );
        err
    }
}
