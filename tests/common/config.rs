//! Test configuration helpers for mock and live wiki endpoints

use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use wiki_image_sync::{Config, Credentials};

use super::fixtures::{API_PATH, MockWiki};

/// Source tag used by every mock-backed test
pub const SOURCE_TAG: &str = "lake-01";

/// Build a configuration pointing at a mock wiki with all storage under `root`
pub fn mock_config(wiki: &MockWiki, root: &Path) -> Config {
    let mut config = Config::default();
    config.wiki.api_url = format!("{}{}", wiki.server.uri(), API_PATH);
    config.wiki.page = "Lake Gallery".to_string();
    config.credentials = Credentials {
        username: "SyncBot".to_string(),
        password: "hunter2".to_string(),
    };
    config.storage.source_tag = SOURCE_TAG.to_string();
    config.storage.blob_root = root.join("blobs");
    config.storage.database_path = root.join("db").join("sync.db");
    config.storage.work_dir = root.join("work");
    config.timeouts.metadata = Duration::from_secs(5);
    config.timeouts.download = Duration::from_secs(10);
    config
}

/// Check whether live wiki credentials are present in the environment or `.env`
pub fn has_live_credentials() -> bool {
    dotenvy::dotenv().ok();
    ["WIKI_API_URL", "WIKI_PAGE", "WIKI_USERNAME", "WIKI_PASSWORD"]
        .iter()
        .all(|key| std::env::var(key).is_ok_and(|v| !v.trim().is_empty()))
}

/// Load a live configuration from `.env`, redirecting all storage into a temp dir
///
/// `WIKI_SOURCE_TAG` defaults to `live-test` so a run never writes next to
/// production objects by accident.
pub fn load_live_config() -> Result<(Config, TempDir), wiki_image_sync::Error> {
    dotenvy::dotenv().ok();
    let temp_dir = TempDir::new().map_err(|e| wiki_image_sync::Error::Config {
        message: format!("failed to create temp dir: {e}"),
        key: None,
    })?;

    let mut config = Config::from_lookup(|key| match key {
        "WIKI_SOURCE_TAG" => std::env::var(key).ok().or_else(|| Some("live-test".to_string())),
        "WIKI_BLOB_ROOT" | "WIKI_DATABASE_PATH" | "WIKI_WORK_DIR" => None,
        _ => std::env::var(key).ok(),
    })?;
    config.storage.blob_root = temp_dir.path().join("blobs");
    config.storage.database_path = temp_dir.path().join("sync.db");
    config.storage.work_dir = temp_dir.path().join("work");

    Ok((config, temp_dir))
}
