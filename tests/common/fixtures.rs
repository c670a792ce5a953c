//! Mock wiki API fixtures

use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Path of the mocked `api.php` endpoint
pub const API_PATH: &str = "/w/api.php";

/// Cookie set by the token step
pub const INITIAL_COOKIE: &str = "wikidb_session=initial";

/// Cookie set by the login step, required by every later call
pub const SESSION_COOKIE: &str = "wikidb_session=fresh";

/// A wiremock server speaking enough of the wiki API for one sync run
pub struct MockWiki {
    /// Underlying mock server
    pub server: MockServer,
}

impl MockWiki {
    /// Start a server with working token and login steps
    pub async fn start() -> Self {
        let wiki = Self::start_bare().await;
        wiki.mount_token().await;
        wiki.mount_login().await;
        wiki
    }

    /// Start a server with nothing mounted
    pub async fn start_bare() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Token step: returns a login token and the initial cookie
    pub async fn mount_token(&self) {
        self.mount_token_value("d41d8cd98f00b204e9800998ecf8427e+\\").await;
    }

    /// Token step returning `token` (possibly empty) and the initial cookie
    pub async fn mount_token_value(&self, token: &str) {
        Mock::given(method("GET"))
            .and(path(API_PATH))
            .and(query_param("meta", "tokens"))
            .respond_with(
                ResponseTemplate::new(200)
                    .append_header("set-cookie", format!("{INITIAL_COOKIE}; path=/; HttpOnly"))
                    .set_body_json(json!({
                        "batchcomplete": true,
                        "query": {"tokens": {"logintoken": token}}
                    })),
            )
            .mount(&self.server)
            .await;
    }

    /// Login step: accepts only requests carrying the initial cookie
    pub async fn mount_login(&self) {
        Mock::given(method("POST"))
            .and(path(API_PATH))
            .and(header("cookie", INITIAL_COOKIE))
            .and(body_string_contains("action=login"))
            .respond_with(
                ResponseTemplate::new(200)
                    .append_header("set-cookie", format!("{SESSION_COOKIE}; path=/; HttpOnly"))
                    .set_body_json(json!({
                        "login": {"result": "Success", "lguserid": 7, "lgusername": "SyncBot"}
                    })),
            )
            .mount(&self.server)
            .await;
    }

    /// Login step that reports success but sets no cookie
    pub async fn mount_login_without_cookie(&self) {
        Mock::given(method("POST"))
            .and(path(API_PATH))
            .and(body_string_contains("action=login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "login": {"result": "Success", "lguserid": 7, "lgusername": "SyncBot"}
            })))
            .mount(&self.server)
            .await;
    }

    /// Login step that rejects the credentials
    pub async fn mount_login_rejected(&self) {
        Mock::given(method("POST"))
            .and(path(API_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "login": {"result": "Failed", "reason": "Incorrect username or password entered."}
            })))
            .mount(&self.server)
            .await;
    }

    /// Page listing, expected to be requested `expected` times
    pub async fn mount_listing(&self, images: &[&str], expected: u64) {
        Mock::given(method("GET"))
            .and(path(API_PATH))
            .and(query_param("action", "parse"))
            .and(header("cookie", SESSION_COOKIE))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "parse": {"title": "Lake Gallery", "pageid": 12, "images": images}
            })))
            .expect(expected)
            .mount(&self.server)
            .await;
    }

    /// Page listing that fails with an API error
    pub async fn mount_listing_error(&self) {
        Mock::given(method("GET"))
            .and(path(API_PATH))
            .and(query_param("action", "parse"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "error": {"code": "missingtitle", "info": "The page you specified doesn't exist."}
            })))
            .mount(&self.server)
            .await;
    }

    /// Imageinfo for `title` (already normalized) pointing at `/files/<file_name>`
    pub async fn mount_imageinfo(&self, title: &str, file_name: &str) {
        let url = format!("{}/files/{}", self.server.uri(), file_name);
        Mock::given(method("GET"))
            .and(path(API_PATH))
            .and(query_param("prop", "imageinfo"))
            .and(query_param("titles", format!("File:{title}").as_str()))
            .and(header("cookie", SESSION_COOKIE))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "query": {"pages": [{"ns": 6, "title": format!("File:{title}"), "imageinfo": [{"url": url}]}]}
            })))
            .mount(&self.server)
            .await;
    }

    /// Imageinfo for `title` with no URL
    pub async fn mount_imageinfo_missing(&self, title: &str) {
        Mock::given(method("GET"))
            .and(path(API_PATH))
            .and(query_param("prop", "imageinfo"))
            .and(query_param("titles", format!("File:{title}").as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "query": {"pages": [{"title": format!("File:{title}"), "missing": true}]}
            })))
            .mount(&self.server)
            .await;
    }

    /// Serve `body` at `/files/<file_name>`
    pub async fn mount_file(&self, file_name: &str, body: &[u8]) {
        Mock::given(method("GET"))
            .and(path(format!("/files/{file_name}").as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body.to_vec()))
            .mount(&self.server)
            .await;
    }

    /// Answer `/files/<file_name>` with `status`
    pub async fn mount_file_status(&self, file_name: &str, status: u16) {
        Mock::given(method("GET"))
            .and(path(format!("/files/{file_name}").as_str()))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }

    /// Imageinfo plus bytes for an image whose title needs no normalization
    pub async fn mount_image(&self, file_name: &str, body: &[u8]) {
        self.mount_imageinfo(file_name, file_name).await;
        self.mount_file(file_name, body).await;
    }
}
