//! Resolving an image reference to its download URL.

use crate::error::ResolveError;
use crate::types::ImageReference;
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::debug;
use url::Url;

use super::WikiClient;
use super::session::Session;

#[derive(Debug, Deserialize)]
struct ImageInfoResponse {
    query: Option<ImageInfoQuery>,
}

#[derive(Debug, Deserialize)]
struct ImageInfoQuery {
    pages: Option<Pages>,
}

/// `formatversion=2` returns a list; older servers key pages by id
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Pages {
    List(Vec<PageInfo>),
    ById(BTreeMap<String, PageInfo>),
}

impl Pages {
    fn into_first_url(self) -> Option<String> {
        let first = match self {
            Pages::List(pages) => pages.into_iter().next(),
            Pages::ById(pages) => pages.into_values().next(),
        }?;
        first
            .imageinfo
            .into_iter()
            .next()
            .and_then(|info| info.url)
            .filter(|url| !url.is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct PageInfo {
    #[serde(default)]
    imageinfo: Vec<ImageInfo>,
}

#[derive(Debug, Deserialize)]
struct ImageInfo {
    url: Option<String>,
}

impl WikiClient {
    /// Ask the wiki where the bytes of `image` live
    ///
    /// The query uses the file namespace plus the whitespace-normalized title.
    /// Protocol-relative and relative URLs are resolved against the API URL.
    ///
    /// # Errors
    /// Returns [`ResolveError`] on a transport failure, a non-success status,
    /// an undecodable body, or a response without a usable URL.
    pub async fn resolve_download_url(
        &self,
        session: &Session,
        image: &ImageReference,
    ) -> Result<Url, ResolveError> {
        let title = format!("{}:{}", self.file_namespace, image.title());
        debug!(image = %image, title = %title, "Resolving download URL");

        let request = self.api_get().query(&[
            ("action", "query"),
            ("prop", "imageinfo"),
            ("iiprop", "url"),
            ("titles", title.as_str()),
        ]);
        let response = session
            .authorize(request)
            .send()
            .await
            .map_err(|source| ResolveError::Transport {
                title: title.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ResolveError::Status {
                title,
                status: status.as_u16(),
            });
        }

        let body: ImageInfoResponse =
            response.json().await.map_err(|source| ResolveError::Malformed {
                title: title.clone(),
                source,
            })?;

        let Some(raw) = body
            .query
            .and_then(|q| q.pages)
            .and_then(Pages::into_first_url)
        else {
            return Err(ResolveError::MissingUrl { title });
        };

        self.api_url
            .join(&raw)
            .map_err(|source| ResolveError::InvalidUrl {
                title,
                url: raw,
                source,
            })
    }
}
