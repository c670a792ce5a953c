//! Error types for wiki-image-sync
//!
//! Errors are split along the boundary the sync pipeline cares about:
//! - [`Error`] is the run-level error. Authentication and listing failures
//!   ([`AuthError`], [`FetchError`]) surface here and abort the run.
//! - [`ItemError`] covers everything that can go wrong while ingesting a
//!   single image ([`ResolveError`], [`DownloadError`], [`UploadError`],
//!   [`PersistError`]). These are caught at the item boundary and recorded in
//!   the run report instead of aborting the run.
//!
//! Every error exposes a stable machine-readable code through [`ErrorCode`],
//! which is what gets attached to structured log events.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for wiki-image-sync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for wiki-image-sync
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "WIKI_API_URL")
        key: Option<String>,
    },

    /// Login handshake failed; the run is aborted
    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),

    /// Gallery listing failed; the run is aborted
    #[error("gallery listing failed: {0}")]
    Fetch(#[from] FetchError),

    /// Run-level record store write failed (sync metadata)
    #[error("record store error: {0}")]
    Persist(#[from] PersistError),

    /// Database lifecycle operation failed
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// SQLx database error
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// HTTP client could not be constructed
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The run did not finish within the caller-imposed deadline
    #[error("sync run exceeded its deadline of {}s", .0.as_secs())]
    DeadlineExceeded(Duration),

    /// The run was stopped by a termination signal
    #[error("sync run interrupted by signal")]
    Interrupted,
}

/// Database lifecycle errors
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to connect to database
    #[error("failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Failed to run migrations
    #[error("failed to run migrations: {0}")]
    MigrationFailed(String),

    /// Query failed
    #[error("query failed: {0}")]
    QueryFailed(String),
}

/// The two requests of the login handshake
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStep {
    /// Login token request (`meta=tokens&type=login`)
    Token,
    /// Credential submission (`action=login`)
    Login,
}

impl fmt::Display for AuthStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthStep::Token => f.write_str("token"),
            AuthStep::Login => f.write_str("login"),
        }
    }
}

/// Login handshake errors
#[derive(Debug, Error)]
pub enum AuthError {
    /// The request could not be sent or its body could not be read
    #[error("{step} request failed: {source}")]
    Transport {
        /// Which handshake request failed
        step: AuthStep,
        /// Underlying HTTP client error
        #[source]
        source: reqwest::Error,
    },

    /// The API answered with a non-success HTTP status
    #[error("{step} request returned HTTP {status}")]
    Status {
        /// Which handshake request failed
        step: AuthStep,
        /// HTTP status code
        status: u16,
    },

    /// The response body was not the expected JSON document
    #[error("{step} response could not be decoded: {source}")]
    Malformed {
        /// Which handshake request failed
        step: AuthStep,
        /// Underlying decode error
        #[source]
        source: reqwest::Error,
    },

    /// The token response carried no (or an empty) login token
    #[error("token response did not contain a login token")]
    MissingToken,

    /// The response did not set any cookie
    #[error("{step} response did not set a session cookie")]
    MissingCookie {
        /// Which handshake request returned no cookie
        step: AuthStep,
    },

    /// The API explicitly rejected the credentials
    #[error("login rejected with result {result}{}", reason_suffix(.reason))]
    Rejected {
        /// The `login.result` value (e.g., "Failed", "WrongToken")
        result: String,
        /// Optional human-readable reason from the API
        reason: Option<String>,
    },
}

fn reason_suffix(reason: &Option<String>) -> String {
    reason.as_deref().map(|r| format!(": {r}")).unwrap_or_default()
}

/// Gallery listing errors
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request could not be sent or its body could not be read
    #[error("parse request for page {page} failed: {source}")]
    Transport {
        /// Page being listed
        page: String,
        /// Underlying HTTP client error
        #[source]
        source: reqwest::Error,
    },

    /// The API answered with a non-success HTTP status
    #[error("parse request for page {page} returned HTTP {status}")]
    Status {
        /// Page being listed
        page: String,
        /// HTTP status code
        status: u16,
    },

    /// The response body was not the expected JSON document
    #[error("parse response for page {page} could not be decoded: {source}")]
    Malformed {
        /// Page being listed
        page: String,
        /// Underlying decode error
        #[source]
        source: reqwest::Error,
    },

    /// The API returned an error object instead of a parse result
    #[error("API error for page {page}: {code}: {info}")]
    Api {
        /// Page being listed
        page: String,
        /// API error code (e.g., "missingtitle")
        code: String,
        /// API error description
        info: String,
    },

    /// The parse result has no image collection
    #[error("parse response for page {page} has no image list")]
    MissingImages {
        /// Page being listed
        page: String,
    },
}

/// Download URL resolution errors
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The request could not be sent or its body could not be read
    #[error("imageinfo request for {title} failed: {source}")]
    Transport {
        /// File title being resolved
        title: String,
        /// Underlying HTTP client error
        #[source]
        source: reqwest::Error,
    },

    /// The API answered with a non-success HTTP status
    #[error("imageinfo request for {title} returned HTTP {status}")]
    Status {
        /// File title being resolved
        title: String,
        /// HTTP status code
        status: u16,
    },

    /// The response body was not the expected JSON document
    #[error("imageinfo response for {title} could not be decoded: {source}")]
    Malformed {
        /// File title being resolved
        title: String,
        /// Underlying decode error
        #[source]
        source: reqwest::Error,
    },

    /// No download URL present in the response
    #[error("no download URL for {title}")]
    MissingUrl {
        /// File title being resolved
        title: String,
    },

    /// The URL in the response could not be parsed
    #[error("invalid download URL {url} for {title}: {source}")]
    InvalidUrl {
        /// File title being resolved
        title: String,
        /// The raw URL from the response
        url: String,
        /// Underlying parse error
        #[source]
        source: url::ParseError,
    },
}

/// Binary download errors
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The scoped temporary file could not be created
    #[error("failed to create temporary file in {}: {source}", .dir.display())]
    TempFile {
        /// Work directory the file was created in
        dir: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The request failed or the body stream broke
    #[error("download of {url} failed: {source}")]
    Transport {
        /// Download URL
        url: String,
        /// Underlying HTTP client error
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success HTTP status
    #[error("download of {url} returned HTTP {status}")]
    Status {
        /// Download URL
        url: String,
        /// HTTP status code
        status: u16,
    },

    /// The download did not finish within the download timeout
    #[error("download of {url} exceeded {}s", .timeout.as_secs())]
    TimedOut {
        /// Download URL
        url: String,
        /// Configured download timeout
        timeout: Duration,
    },

    /// Writing to the local file failed
    #[error("failed to write {}: {source}", .path.display())]
    Write {
        /// Partial file that was removed
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Blob storage errors
#[derive(Debug, Error)]
pub enum UploadError {
    /// The destination path is not a valid relative object path
    #[error("invalid destination path {path}: {reason}")]
    InvalidPath {
        /// Requested destination path
        path: String,
        /// Why it was rejected
        reason: String,
    },

    /// Reading the source or writing the object failed
    #[error("failed to store {path}: {source}")]
    Io {
        /// Destination path
        path: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Record store errors
#[derive(Debug, Error)]
pub enum PersistError {
    /// Looking up a record by name failed
    #[error("failed to look up image record {name}: {reason}")]
    Lookup {
        /// Record name
        name: String,
        /// Underlying failure
        reason: String,
    },

    /// Inserting or overwriting a record failed
    #[error("failed to write image record {name}: {reason}")]
    Write {
        /// Record name
        name: String,
        /// Underlying failure
        reason: String,
    },

    /// Writing the run metadata record failed
    #[error("failed to write sync metadata: {reason}")]
    Metadata {
        /// Underlying failure
        reason: String,
    },
}

/// Failure while ingesting a single image
///
/// Produced inside the per-image loop and never propagated past it.
#[derive(Debug, Error)]
pub enum ItemError {
    /// Download URL could not be resolved
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// Bytes could not be fetched to a local file
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// Local file could not be written to blob storage
    #[error(transparent)]
    Upload(#[from] UploadError),

    /// Image record could not be upserted
    #[error(transparent)]
    Persist(#[from] PersistError),
}

impl ItemError {
    /// Pipeline stage the failure happened in
    pub fn stage(&self) -> &'static str {
        match self {
            ItemError::Resolve(_) => "resolve",
            ItemError::Download(_) => "download",
            ItemError::Upload(_) => "upload",
            ItemError::Persist(_) => "persist",
        }
    }
}

/// Machine-readable error codes for structured logging
pub trait ErrorCode {
    /// Get the machine-readable error code
    fn error_code(&self) -> &'static str;
}

impl ErrorCode for AuthError {
    fn error_code(&self) -> &'static str {
        match self {
            AuthError::Transport { .. } => "auth_transport",
            AuthError::Status { .. } => "auth_status",
            AuthError::Malformed { .. } => "auth_malformed",
            AuthError::MissingToken => "auth_missing_token",
            AuthError::MissingCookie { .. } => "auth_missing_cookie",
            AuthError::Rejected { .. } => "auth_rejected",
        }
    }
}

impl ErrorCode for FetchError {
    fn error_code(&self) -> &'static str {
        match self {
            FetchError::Transport { .. } => "fetch_transport",
            FetchError::Status { .. } => "fetch_status",
            FetchError::Malformed { .. } => "fetch_malformed",
            FetchError::Api { .. } => "fetch_api_error",
            FetchError::MissingImages { .. } => "fetch_missing_images",
        }
    }
}

impl ErrorCode for PersistError {
    fn error_code(&self) -> &'static str {
        match self {
            PersistError::Lookup { .. } => "persist_lookup",
            PersistError::Write { .. } => "persist_write",
            PersistError::Metadata { .. } => "persist_metadata",
        }
    }
}

impl ErrorCode for ItemError {
    fn error_code(&self) -> &'static str {
        match self {
            ItemError::Resolve(e) => match e {
                ResolveError::Transport { .. } => "resolve_transport",
                ResolveError::Status { .. } => "resolve_status",
                ResolveError::Malformed { .. } => "resolve_malformed",
                ResolveError::MissingUrl { .. } => "resolve_missing_url",
                ResolveError::InvalidUrl { .. } => "resolve_invalid_url",
            },
            ItemError::Download(e) => match e {
                DownloadError::TempFile { .. } => "download_temp_file",
                DownloadError::Transport { .. } => "download_transport",
                DownloadError::Status { .. } => "download_status",
                DownloadError::TimedOut { .. } => "download_timed_out",
                DownloadError::Write { .. } => "download_write",
            },
            ItemError::Upload(e) => match e {
                UploadError::InvalidPath { .. } => "upload_invalid_path",
                UploadError::Io { .. } => "upload_io",
            },
            ItemError::Persist(e) => e.error_code(),
        }
    }
}

impl ErrorCode for Error {
    fn error_code(&self) -> &'static str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Auth(e) => e.error_code(),
            Error::Fetch(e) => e.error_code(),
            Error::Persist(e) => e.error_code(),
            Error::Database(_) => "database_error",
            Error::Sqlx(_) => "database_error",
            Error::Network(_) => "network_error",
            Error::DeadlineExceeded(_) => "deadline_exceeded",
            Error::Interrupted => "interrupted",
        }
    }
}
