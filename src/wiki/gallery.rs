//! Listing the images embedded in a page.

use crate::error::FetchError;
use crate::types::ImageReference;
use serde::Deserialize;
use tracing::debug;

use super::session::Session;
use super::{ApiErrorBody, WikiClient};

#[derive(Debug, Deserialize)]
struct ParseResponse {
    parse: Option<ParseResult>,
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ParseResult {
    images: Option<Vec<String>>,
}

impl WikiClient {
    /// Fetch the ordered list of images embedded in `page`
    ///
    /// # Errors
    /// Returns [`FetchError`] on a transport failure, a non-success status, an
    /// API error object, or a response without an image collection. An empty
    /// collection is not an error.
    pub async fn fetch_image_names(
        &self,
        session: &Session,
        page: &str,
    ) -> Result<Vec<ImageReference>, FetchError> {
        debug!(page, "Fetching image list");

        let request = self
            .api_get()
            .query(&[("action", "parse"), ("page", page), ("prop", "images")]);
        let response = session
            .authorize(request)
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                page: page.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                page: page.to_string(),
                status: status.as_u16(),
            });
        }

        let body: ParseResponse = response.json().await.map_err(|source| FetchError::Malformed {
            page: page.to_string(),
            source,
        })?;

        if let Some(ApiErrorBody { code, info }) = body.error {
            return Err(FetchError::Api {
                page: page.to_string(),
                code,
                info,
            });
        }

        let images = body
            .parse
            .and_then(|p| p.images)
            .ok_or_else(|| FetchError::MissingImages {
                page: page.to_string(),
            })?;

        debug!(page, count = images.len(), "Fetched image list");
        Ok(images
            .into_iter()
            .map(|name| ImageReference::in_namespace(name, &self.file_namespace))
            .collect())
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::wiki::test_support::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_fetch_image_names_preserves_order_and_sends_cookie() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(API_PATH))
            .and(query_param("action", "parse"))
            .and(query_param("page", "Lake Gallery"))
            .and(query_param("prop", "images"))
            .and(header("cookie", "wikidb_session=fresh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "parse": {
                    "title": "Lake Gallery",
                    "pageid": 12,
                    "images": ["File:car.jpg", "File:manual.pdf", "File:logo.PNG"]
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let names = client_for(&server)
            .fetch_image_names(&session(), "Lake Gallery")
            .await
            .unwrap();

        let names: Vec<&str> = names.iter().map(ImageReference::as_str).collect();
        assert_eq!(names, vec!["File:car.jpg", "File:manual.pdf", "File:logo.PNG"]);
    }

    #[tokio::test]
    async fn test_fetch_image_names_keeps_colons_in_bare_names() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(API_PATH))
            .and(query_param("action", "parse"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "parse": {"images": ["Map: north.png", "File:Map: south.png", "car.jpg"]}
            })))
            .mount(&server)
            .await;

        let names = client_for(&server)
            .fetch_image_names(&session(), "Lake Gallery")
            .await
            .unwrap();

        let files: Vec<&str> = names.iter().map(ImageReference::file_name).collect();
        assert_eq!(files, vec!["Map: north.png", "Map: south.png", "car.jpg"]);
    }

    #[tokio::test]
    async fn test_fetch_image_names_empty_list_is_ok() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(API_PATH))
            .and(query_param("action", "parse"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"parse": {"title": "Empty", "images": []}})),
            )
            .mount(&server)
            .await;

        let names = client_for(&server)
            .fetch_image_names(&session(), "Empty")
            .await
            .unwrap();
        assert!(names.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_image_names_missing_collection() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(API_PATH))
            .and(query_param("action", "parse"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"parse": {"title": "X"}})),
            )
            .mount(&server)
            .await;

        let err = client_for(&server)
            .fetch_image_names(&session(), "X")
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::MissingImages { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn test_fetch_image_names_api_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(API_PATH))
            .and(query_param("action", "parse"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "error": {"code": "missingtitle", "info": "The page you specified doesn't exist."}
            })))
            .mount(&server)
            .await;

        match client_for(&server).fetch_image_names(&session(), "Nope").await {
            Err(FetchError::Api { page, code, .. }) => {
                assert_eq!(page, "Nope");
                assert_eq!(code, "missingtitle");
            }
            other => panic!("expected API error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_image_names_http_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(API_PATH))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .fetch_image_names(&session(), "Gallery")
            .await
            .unwrap_err();
        assert!(
            matches!(err, FetchError::Status { status: 502, .. }),
            "got {err:?}"
        );
    }
}
