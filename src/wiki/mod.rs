//! Client for the wiki's `api.php` endpoint
//!
//! Methods on [`WikiClient`] are organized by pipeline step:
//! - [`auth`] — two-step login handshake producing a [`Session`]
//! - [`gallery`] — listing the images embedded in a page
//! - [`imageinfo`] — resolving an image to its download URL
//!
//! The client holds no session state of its own; every authenticated call
//! takes the [`Session`] explicitly.

use crate::config::{TimeoutConfig, WikiConfig};
use crate::error::{Error, Result};
use reqwest::RequestBuilder;
use std::time::Duration;
use url::Url;

mod auth;
mod gallery;
mod imageinfo;
mod session;

pub use session::{Cookie, Session};

/// Build the HTTP client shared by the wiki client and the downloader
///
/// Cookies are handled explicitly through [`Session`], so the client's own
/// cookie store stays disabled.
pub fn build_http_client(config: &WikiConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(config.user_agent.as_str())
        .build()?;
    Ok(client)
}

/// Wiki API client
#[derive(Clone, Debug)]
pub struct WikiClient {
    http: reqwest::Client,
    api_url: Url,
    file_namespace: String,
    metadata_timeout: Duration,
}

impl WikiClient {
    /// Create a client for an API endpoint
    ///
    /// `metadata_timeout` bounds every token, login, parse and imageinfo call.
    pub fn new(
        http: reqwest::Client,
        api_url: Url,
        file_namespace: impl Into<String>,
        metadata_timeout: Duration,
    ) -> Self {
        Self {
            http,
            api_url,
            file_namespace: file_namespace.into(),
            metadata_timeout,
        }
    }

    /// Create a client from configuration
    ///
    /// # Errors
    /// Returns a configuration error if the API URL does not parse
    pub fn from_config(
        http: reqwest::Client,
        wiki: &WikiConfig,
        timeouts: &TimeoutConfig,
    ) -> Result<Self> {
        let api_url = Url::parse(&wiki.api_url).map_err(|e| Error::Config {
            message: format!("API URL is not a valid URL: {}", e),
            key: Some("wiki.api_url".to_string()),
        })?;
        Ok(Self::new(
            http,
            api_url,
            wiki.file_namespace.clone(),
            timeouts.metadata,
        ))
    }

    /// GET against the API with the JSON format parameters already applied
    fn api_get(&self) -> RequestBuilder {
        self.http
            .get(self.api_url.clone())
            .timeout(self.metadata_timeout)
            .query(&[("format", "json"), ("formatversion", "2")])
    }

    /// POST against the API; the caller supplies the form body
    fn api_post(&self) -> RequestBuilder {
        self.http
            .post(self.api_url.clone())
            .timeout(self.metadata_timeout)
    }
}

/// `error` object returned by the API in place of a result
#[derive(Debug, serde::Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: String,
    #[serde(default)]
    info: String,
}
