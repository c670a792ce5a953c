//! Core types for the sync pipeline

use crate::error::ItemError;
use crate::utils::{FILE_NAMESPACE_ALIASES, normalize_title, strip_extension, strip_namespace};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw image name as listed on the source page
///
/// May carry a file namespace prefix (`File:`) and literal spaces. Only a
/// recognized namespace is stripped; a bare name such as `Map: north.png`
/// keeps its colon.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ImageReference {
    raw: String,
    name_start: usize,
}

impl ImageReference {
    /// Wrap a raw listing entry, recognizing the built-in file namespace names
    pub fn new(raw: impl Into<String>) -> Self {
        Self::with_namespaces(raw, FILE_NAMESPACE_ALIASES)
    }

    /// Wrap a raw listing entry, also recognizing a site-specific namespace
    /// name (e.g. a localized `Datei`)
    pub fn in_namespace(raw: impl Into<String>, namespace: &str) -> Self {
        let mut names: Vec<&str> = FILE_NAMESPACE_ALIASES.to_vec();
        names.push(namespace);
        Self::with_namespaces(raw, &names)
    }

    fn with_namespaces(raw: impl Into<String>, namespaces: &[&str]) -> Self {
        let raw = raw.into();
        let name_start = raw.len() - strip_namespace(&raw, namespaces).len();
        Self { raw, name_start }
    }

    /// The raw reference exactly as listed
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// File name without the namespace prefix (used for object paths)
    pub fn file_name(&self) -> &str {
        &self.raw[self.name_start..]
    }

    /// Whitespace-normalized file name (used for metadata queries)
    pub fn title(&self) -> String {
        normalize_title(self.file_name())
    }

    /// Record name: the file name without its extension
    pub fn record_name(&self) -> &str {
        strip_extension(self.file_name())
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl From<&str> for ImageReference {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

/// An image reference that passed the extension filter
///
/// Only [`ImageFilter`](crate::filter::ImageFilter) constructs these.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AllowedImage(ImageReference);

impl AllowedImage {
    pub(crate) fn new(reference: ImageReference) -> Self {
        Self(reference)
    }

    /// The underlying reference
    pub fn reference(&self) -> &ImageReference {
        &self.0
    }

    /// Unwrap into the underlying reference
    pub fn into_reference(self) -> ImageReference {
        self.0
    }
}

impl fmt::Display for AllowedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Stage of a sync run
///
/// ```text
/// Idle → Authenticating → Listing → Filtering → Processing(i) → Finalizing → Done
///              └──────────────┴──→ Aborted
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "stage")]
pub enum SyncStage {
    /// Not started
    Idle,
    /// Running the login handshake
    Authenticating,
    /// Fetching the page's image list
    Listing,
    /// Applying the extension filter
    Filtering,
    /// Ingesting allowed image `index` of `total`
    Processing {
        /// Zero-based position in the filtered list
        index: usize,
        /// Number of allowed images
        total: usize,
    },
    /// Writing the run timestamp
    Finalizing,
    /// Run finished (individual images may still have failed)
    Done,
    /// Run stopped before any image was processed
    Aborted,
}

impl SyncStage {
    /// Whether the run can make no further progress from this stage
    pub fn is_terminal(&self) -> bool {
        matches!(self, SyncStage::Done | SyncStage::Aborted)
    }
}

impl fmt::Display for SyncStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncStage::Idle => f.write_str("idle"),
            SyncStage::Authenticating => f.write_str("authenticating"),
            SyncStage::Listing => f.write_str("listing"),
            SyncStage::Filtering => f.write_str("filtering"),
            SyncStage::Processing { index, total } => {
                write!(f, "processing {}/{}", index + 1, total)
            }
            SyncStage::Finalizing => f.write_str("finalizing"),
            SyncStage::Done => f.write_str("done"),
            SyncStage::Aborted => f.write_str("aborted"),
        }
    }
}

/// Optional context supplied at the invocation boundary
#[derive(Clone, Debug, Default)]
pub struct RunContext {
    /// Identity of the caller that triggered the run, if known
    pub caller: Option<String>,
}

impl RunContext {
    /// Context for a run triggered by a known caller
    pub fn for_caller(caller: impl Into<String>) -> Self {
        Self {
            caller: Some(caller.into()),
        }
    }
}

/// Whether an upsert created a new record or overwrote an existing one
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "action", content = "id")]
pub enum RecordWrite {
    /// A new record was inserted with this id
    Created(i64),
    /// The existing record with this id was overwritten
    Updated(i64),
}

impl RecordWrite {
    /// Id of the record that was written
    pub fn id(&self) -> i64 {
        match self {
            RecordWrite::Created(id) | RecordWrite::Updated(id) => *id,
        }
    }
}

/// A successfully ingested image
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IngestedImage {
    /// Record name (file name without extension)
    pub name: String,
    /// Object path in blob storage
    pub storage_path: String,
    /// Size of the stored object in bytes
    pub bytes: u64,
    /// Hex-encoded SHA-256 of the stored object
    pub sha256: String,
    /// Record upsert result
    pub record: RecordWrite,
}

/// Result of processing one allowed image
#[derive(Debug)]
pub struct ItemOutcome {
    /// Zero-based position in the filtered list
    pub position: usize,
    /// The image that was processed
    pub image: ImageReference,
    /// Success details or the typed failure
    pub result: std::result::Result<IngestedImage, ItemError>,
}

impl ItemOutcome {
    /// Whether the image was ingested
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Summary of a sync run that reached the finalize step
#[derive(Debug)]
pub struct RunReport {
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// Timestamp written to the sync metadata record
    pub finalized_at: DateTime<Utc>,
    /// Number of images listed on the page
    pub listed: usize,
    /// Number of images that passed the filter
    pub allowed: usize,
    /// One outcome per allowed image, in processing order
    pub outcomes: Vec<ItemOutcome>,
}

impl RunReport {
    /// Number of images ingested
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    /// Number of images that failed at any stage
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    /// Whether every allowed image was ingested
    pub fn all_succeeded(&self) -> bool {
        self.failed() == 0
    }

    /// Iterate over the failed outcomes
    pub fn failures(&self) -> impl Iterator<Item = &ItemOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DownloadError, ItemError};

    #[test]
    fn reference_derives_names() {
        let reference = ImageReference::new("File:Red car.photo.jpg");
        assert_eq!(reference.as_str(), "File:Red car.photo.jpg");
        assert_eq!(reference.file_name(), "Red car.photo.jpg");
        assert_eq!(reference.title(), "Red_car.photo.jpg");
        assert_eq!(reference.record_name(), "Red car.photo");
    }

    #[test]
    fn reference_without_namespace() {
        let reference = ImageReference::from("logo.PNG");
        assert_eq!(reference.file_name(), "logo.PNG");
        assert_eq!(reference.record_name(), "logo");
    }

    #[test]
    fn bare_name_with_colon_keeps_its_prefix() {
        let reference = ImageReference::new("Map: north.png");
        assert_eq!(reference.file_name(), "Map: north.png");
        assert_eq!(reference.title(), "Map:_north.png");
        assert_eq!(reference.record_name(), "Map: north");
    }

    #[test]
    fn namespaced_name_with_colon_strips_only_the_namespace() {
        let reference = ImageReference::new("File:Map: north.png");
        assert_eq!(reference.as_str(), "File:Map: north.png");
        assert_eq!(reference.file_name(), "Map: north.png");
        assert_eq!(reference.record_name(), "Map: north");
    }

    #[test]
    fn site_namespace_is_recognized() {
        let reference = ImageReference::in_namespace("Datei:Auto.jpg", "Datei");
        assert_eq!(reference.file_name(), "Auto.jpg");

        let reference = ImageReference::in_namespace("File:car.jpg", "Datei");
        assert_eq!(reference.file_name(), "car.jpg");

        assert_eq!(ImageReference::new("Datei:Auto.jpg").file_name(), "Datei:Auto.jpg");
    }

    #[test]
    fn stage_display_is_one_based_for_processing() {
        assert_eq!(SyncStage::Processing { index: 0, total: 3 }.to_string(), "processing 1/3");
        assert_eq!(SyncStage::Aborted.to_string(), "aborted");
        assert!(SyncStage::Done.is_terminal());
        assert!(SyncStage::Aborted.is_terminal());
        assert!(!SyncStage::Finalizing.is_terminal());
    }

    #[test]
    fn report_counts_outcomes() {
        let ok = ItemOutcome {
            position: 0,
            image: "File:a.jpg".into(),
            result: Ok(IngestedImage {
                name: "a".into(),
                storage_path: "images/t/a.jpg".into(),
                bytes: 3,
                sha256: "00".into(),
                record: RecordWrite::Created(1),
            }),
        };
        let failed = ItemOutcome {
            position: 1,
            image: "File:b.jpg".into(),
            result: Err(ItemError::Download(DownloadError::Status {
                url: "http://localhost/b.jpg".into(),
                status: 500,
            })),
        };

        let report = RunReport {
            started_at: Utc::now(),
            finalized_at: Utc::now(),
            listed: 3,
            allowed: 2,
            outcomes: vec![ok, failed],
        };

        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failed(), 1);
        assert!(!report.all_succeeded());
        assert_eq!(report.failures().next().unwrap().image.as_str(), "File:b.jpg");
    }

    #[test]
    fn record_write_exposes_id() {
        assert_eq!(RecordWrite::Created(4).id(), 4);
        assert_eq!(RecordWrite::Updated(9).id(), 9);
    }
}
