//! # wiki-image-sync
//!
//! Pulls the images embedded in a wiki page into blob storage and keeps one
//! metadata record per image name.
//!
//! ## Pipeline
//!
//! Each run is a straight line:
//! - **Authenticate** with the two-step login handshake and carry the
//!   resulting session cookies through every later call
//! - **List** the images referenced by the configured page
//! - **Filter** the list by file extension
//! - **Ingest** each allowed image: resolve its download URL, stream it into a
//!   scoped temporary file, copy it to blob storage, delete the local copy,
//!   then insert or overwrite its record by name
//! - **Finalize** by stamping the run time in the sync metadata record
//!
//! A failed image is logged and reported without stopping the run. Failing to
//! authenticate or list aborts the run before anything is written.
//!
//! The crate has no scheduler of its own; callers decide when to run it.
//!
//! ## Quick Start
//!
//! ```no_run
//! use wiki_image_sync::{Config, run_once};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let report = run_once(config).await?;
//!
//!     println!(
//!         "{} of {} images ingested",
//!         report.succeeded(),
//!         report.allowed
//!     );
//!     for failure in report.failures() {
//!         println!("failed: {}", failure.image);
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Database persistence layer
pub mod db;
/// Streaming downloads into scoped temporary files
pub mod downloader;
/// Error types
pub mod error;
/// Extension filter
pub mod filter;
/// Blob and record storage seams
pub mod storage;
/// Sync run orchestration
pub mod sync;
/// Core types
pub mod types;
/// Utility functions
pub mod utils;
/// Wiki API client
pub mod wiki;

use std::sync::Arc;

// Re-export commonly used types
pub use config::{Config, Credentials, ExtensionMatch};
pub use db::Database;
pub use downloader::{ImageDownloader, LocalArtifact};
pub use error::{
    AuthError, DatabaseError, DownloadError, Error, ErrorCode, FetchError, ItemError,
    PersistError, ResolveError, Result, UploadError,
};
pub use filter::{ImageFilter, filter_allowed};
pub use storage::{ArtifactStore, BlobStore, FsBlobStore, RecordStore, StoredObject};
pub use sync::SyncOrchestrator;
pub use types::{
    AllowedImage, ImageReference, IngestedImage, ItemOutcome, RecordWrite, RunContext,
    RunReport, SyncStage,
};
pub use wiki::{Session, WikiClient};

/// Run the pipeline once against the configured SQLite database and blob root
///
/// Opens (and migrates) the record database, builds the HTTP client and
/// performs a single run. The database is closed before returning.
///
/// # Example
///
/// ```no_run
/// use wiki_image_sync::{Config, run_once};
///
/// # async fn example() -> wiki_image_sync::Result<()> {
/// let config = Config::from_env()?;
/// let report = run_once(config).await?;
/// assert!(report.finalized_at >= report.started_at);
/// # Ok(())
/// # }
/// ```
pub async fn run_once(config: Config) -> Result<RunReport> {
    let (orchestrator, db) = open_stores(&config).await?;
    let result = orchestrator.run(&RunContext::default()).await;

    drop(orchestrator);
    if let Ok(db) = Arc::try_unwrap(db) {
        db.close().await;
    }
    result
}

async fn open_stores(config: &Config) -> Result<(SyncOrchestrator, Arc<Database>)> {
    config.validate()?;

    let db = Arc::new(Database::new(&config.storage.database_path).await?);
    let blobs = Arc::new(FsBlobStore::new(config.storage.blob_root.clone()));
    let http = wiki::build_http_client(&config.wiki)?;

    let orchestrator = SyncOrchestrator::new(config, http, blobs, db.clone())?;
    Ok((orchestrator, db))
}

/// Run the pipeline, stopping early on a termination signal
///
/// If SIGTERM or SIGINT (Ctrl+C on other platforms) arrives first, the
/// in-flight run is dropped, which removes any temporary file it owned, and
/// [`Error::Interrupted`] is returned. The run timestamp is not written in
/// that case.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use wiki_image_sync::{
///     Config, Database, FsBlobStore, RunContext, SyncOrchestrator, run_with_shutdown,
/// };
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = Config::from_env()?;
///     let db = Arc::new(Database::new(&config.storage.database_path).await?);
///     let blobs = Arc::new(FsBlobStore::new(config.storage.blob_root.clone()));
///     let http = wiki_image_sync::wiki::build_http_client(&config.wiki)?;
///     let orchestrator = SyncOrchestrator::new(&config, http, blobs, db)?;
///
///     let report = run_with_shutdown(&orchestrator, &RunContext::for_caller("cron")).await?;
///     println!("{} failed", report.failed());
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(
    orchestrator: &SyncOrchestrator,
    ctx: &RunContext,
) -> Result<RunReport> {
    tokio::select! {
        result = orchestrator.run(ctx) => result,
        _ = wait_for_signal() => {
            tracing::warn!("Sync run interrupted, in-flight work discarded");
            Err(Error::Interrupted)
        }
    }
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Signal registration may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), Ok(mut sigint)) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            sigint.recv().await;
            tracing::info!("Received SIGINT signal (Ctrl+C)");
        }
        (Ok(mut sigterm), Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            sigterm.recv().await;
            tracing::info!("Received SIGTERM signal");
        }
        (Err(e), Err(_)) => {
            tracing::error!(error = %e, "Could not register any signal handlers, using ctrl_c fallback");
            tokio::signal::ctrl_c().await.ok();
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
