//! Configuration types for wiki-image-sync
//!
//! Settings are grouped into sub-configs:
//! - [`WikiConfig`] — API endpoint, target page, file namespace
//! - [`Credentials`] — login secrets (never logged or serialized back out)
//! - [`StorageConfig`] — blob root, object path prefix, record database, work dir
//! - [`FilterConfig`] — allowed image extensions and matching policy
//! - [`TimeoutConfig`] — per-call bounds for metadata and binary downloads
//!
//! Everything except the wiki location and credentials has a sensible default.
//! [`Config::from_env`] reads the secret configuration from `WIKI_*`
//! environment variables.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{fmt, path::PathBuf, time::Duration};

/// Wiki API location and target page
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WikiConfig {
    /// Full URL of the API endpoint (e.g. "https://wiki.example.org/w/api.php")
    #[serde(default)]
    pub api_url: String,

    /// Page whose embedded images are synced
    #[serde(default)]
    pub page: String,

    /// Namespace used when querying file metadata (default: "File")
    #[serde(default = "default_file_namespace")]
    pub file_namespace: String,

    /// User-Agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for WikiConfig {
    fn default() -> Self {
        Self {
            api_url: String::new(),
            page: String::new(),
            file_namespace: default_file_namespace(),
            user_agent: default_user_agent(),
        }
    }
}

/// Login credentials for the wiki account
///
/// The password is skipped on serialization and redacted from `Debug` output.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct Credentials {
    /// Account name (bot passwords use the `User@BotName` form)
    #[serde(default)]
    pub username: String,

    /// Account password
    #[serde(default, skip_serializing)]
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Blob storage, record store and scratch space locations
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory of the filesystem blob store (default: "./blobs")
    #[serde(default = "default_blob_root")]
    pub blob_root: PathBuf,

    /// First path segment of every stored object (default: "images")
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Tag identifying the source wiki; second path segment of every object
    #[serde(default)]
    pub source_tag: String,

    /// Record database path (default: "./wiki-image-sync.db")
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// Directory for in-flight download files (default: system temp dir)
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            blob_root: default_blob_root(),
            prefix: default_prefix(),
            source_tag: String::new(),
            database_path: default_database_path(),
            work_dir: default_work_dir(),
        }
    }
}

/// How an image's extension is compared against the allowed list
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtensionMatch {
    /// The last dot-delimited segment contains an allowed token (default)
    ///
    /// Matches `jpg` inside `jpgx` or `xjpg` as well. Kept as the default for
    /// compatibility with existing synced collections.
    #[default]
    Contains,
    /// The last dot-delimited segment equals an allowed token
    Exact,
}

/// Image extension filtering
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Allowed extension tokens, compared case-insensitively (default: jpg, png, jpeg)
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,

    /// Matching policy
    #[serde(default)]
    pub match_mode: ExtensionMatch,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            allowed_extensions: default_allowed_extensions(),
            match_mode: ExtensionMatch::default(),
        }
    }
}

/// Per-call network timeouts
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// Bound for token, login, parse and imageinfo calls (default: 30 seconds)
    #[serde(default = "default_metadata_timeout", with = "duration_serde")]
    pub metadata: Duration,

    /// Bound for a single binary download, body included (default: 300 seconds)
    #[serde(default = "default_download_timeout", with = "duration_serde")]
    pub download: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            metadata: default_metadata_timeout(),
            download: default_download_timeout(),
        }
    }
}

/// Main configuration for a sync run
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Wiki API location and target page
    #[serde(default)]
    pub wiki: WikiConfig,

    /// Login credentials
    #[serde(default)]
    pub credentials: Credentials,

    /// Storage locations
    #[serde(default)]
    pub storage: StorageConfig,

    /// Extension filter
    #[serde(default)]
    pub filter: FilterConfig,

    /// Network timeouts
    #[serde(default)]
    pub timeouts: TimeoutConfig,
}

/// Environment variable names read by [`Config::from_env`]
pub mod env_keys {
    /// API endpoint URL (required)
    pub const API_URL: &str = "WIKI_API_URL";
    /// Target page (required)
    pub const PAGE: &str = "WIKI_PAGE";
    /// Account name (required)
    pub const USERNAME: &str = "WIKI_USERNAME";
    /// Account password (required)
    pub const PASSWORD: &str = "WIKI_PASSWORD";
    /// Source tag for object paths (required)
    pub const SOURCE_TAG: &str = "WIKI_SOURCE_TAG";
    /// Blob store root directory
    pub const BLOB_ROOT: &str = "WIKI_BLOB_ROOT";
    /// Record database path
    pub const DATABASE_PATH: &str = "WIKI_DATABASE_PATH";
    /// Download work directory
    pub const WORK_DIR: &str = "WIKI_WORK_DIR";
    /// Metadata call timeout in seconds
    pub const METADATA_TIMEOUT_SECS: &str = "WIKI_METADATA_TIMEOUT_SECS";
    /// Download timeout in seconds
    pub const DOWNLOAD_TIMEOUT_SECS: &str = "WIKI_DOWNLOAD_TIMEOUT_SECS";
    /// Extension match policy ("contains" or "exact")
    pub const EXTENSION_MATCH: &str = "WIKI_EXTENSION_MATCH";
}

impl Config {
    /// Load configuration from `WIKI_*` environment variables
    ///
    /// See [`env_keys`] for the variable names. The result is validated.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    ///
    /// Empty values are treated as unset. The result is validated.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &str| {
            get(key).ok_or_else(|| Error::Config {
                message: format!("{key} is not set"),
                key: Some(key.to_string()),
            })
        };
        let seconds = |key: &str| -> Result<Option<Duration>> {
            get(key)
                .map(|raw| {
                    raw.trim()
                        .parse::<u64>()
                        .map(Duration::from_secs)
                        .map_err(|e| Error::Config {
                            message: format!("{key} must be a whole number of seconds: {e}"),
                            key: Some(key.to_string()),
                        })
                })
                .transpose()
        };

        let mut config = Config {
            wiki: WikiConfig {
                api_url: require(env_keys::API_URL)?,
                page: require(env_keys::PAGE)?,
                ..Default::default()
            },
            credentials: Credentials {
                username: require(env_keys::USERNAME)?,
                password: require(env_keys::PASSWORD)?,
            },
            storage: StorageConfig {
                source_tag: require(env_keys::SOURCE_TAG)?,
                ..Default::default()
            },
            ..Default::default()
        };

        if let Some(root) = get(env_keys::BLOB_ROOT) {
            config.storage.blob_root = PathBuf::from(root);
        }
        if let Some(path) = get(env_keys::DATABASE_PATH) {
            config.storage.database_path = PathBuf::from(path);
        }
        if let Some(dir) = get(env_keys::WORK_DIR) {
            config.storage.work_dir = PathBuf::from(dir);
        }
        if let Some(timeout) = seconds(env_keys::METADATA_TIMEOUT_SECS)? {
            config.timeouts.metadata = timeout;
        }
        if let Some(timeout) = seconds(env_keys::DOWNLOAD_TIMEOUT_SECS)? {
            config.timeouts.download = timeout;
        }
        if let Some(mode) = get(env_keys::EXTENSION_MATCH) {
            config.filter.match_mode = match mode.trim().to_ascii_lowercase().as_str() {
                "contains" => ExtensionMatch::Contains,
                "exact" => ExtensionMatch::Exact,
                other => {
                    return Err(Error::Config {
                        message: format!(
                            "{} must be \"contains\" or \"exact\", got \"{other}\"",
                            env_keys::EXTENSION_MATCH
                        ),
                        key: Some(env_keys::EXTENSION_MATCH.to_string()),
                    });
                }
            };
        }

        config.validate()?;
        Ok(config)
    }

    /// Check the configuration for values the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        fn invalid(key: &str, message: &str) -> Error {
            Error::Config {
                message: message.to_string(),
                key: Some(key.to_string()),
            }
        }

        if self.wiki.api_url.trim().is_empty() {
            return Err(invalid("wiki.api_url", "API URL must not be empty"));
        }
        url::Url::parse(&self.wiki.api_url).map_err(|e| Error::Config {
            message: format!("API URL is not a valid URL: {e}"),
            key: Some("wiki.api_url".to_string()),
        })?;
        if self.wiki.page.trim().is_empty() {
            return Err(invalid("wiki.page", "target page must not be empty"));
        }
        if self.credentials.username.trim().is_empty() {
            return Err(invalid("credentials.username", "username must not be empty"));
        }
        if self.storage.source_tag.trim_matches('/').is_empty() {
            return Err(invalid("storage.source_tag", "source tag must not be empty"));
        }
        if self.filter.allowed_extensions.iter().all(|e| e.trim().is_empty()) {
            return Err(invalid(
                "filter.allowed_extensions",
                "at least one allowed extension is required",
            ));
        }
        if self.timeouts.metadata.is_zero() {
            return Err(invalid("timeouts.metadata", "metadata timeout must be positive"));
        }
        if self.timeouts.download <= self.timeouts.metadata {
            return Err(invalid(
                "timeouts.download",
                "download timeout must be longer than the metadata timeout",
            ));
        }
        Ok(())
    }
}

fn default_file_namespace() -> String {
    "File".to_string()
}

fn default_user_agent() -> String {
    concat!("wiki-image-sync/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_blob_root() -> PathBuf {
    PathBuf::from("./blobs")
}

fn default_prefix() -> String {
    "images".to_string()
}

fn default_database_path() -> PathBuf {
    PathBuf::from("./wiki-image-sync.db")
}

fn default_work_dir() -> PathBuf {
    std::env::temp_dir()
}

fn default_allowed_extensions() -> Vec<String> {
    vec!["jpg".to_string(), "png".to_string(), "jpeg".to_string()]
}

fn default_metadata_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_download_timeout() -> Duration {
    Duration::from_secs(300)
}

// Duration serialization helper (whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
