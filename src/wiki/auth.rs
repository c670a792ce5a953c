//! Two-step login handshake.

use crate::config::Credentials;
use crate::error::{AuthError, AuthStep};
use serde::Deserialize;
use tracing::debug;

use super::WikiClient;
use super::session::{CookieJar, Session};

#[derive(Debug, Deserialize)]
struct TokenResponse {
    query: Option<TokenQuery>,
}

#[derive(Debug, Deserialize)]
struct TokenQuery {
    tokens: Option<Tokens>,
}

#[derive(Debug, Deserialize)]
struct Tokens {
    logintoken: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    login: Option<LoginResult>,
}

#[derive(Debug, Deserialize)]
struct LoginResult {
    result: Option<String>,
    reason: Option<String>,
}

impl WikiClient {
    /// Log in and return a session for the rest of the run
    ///
    /// 1. Requests a login token; the response must carry a non-empty token and
    ///    at least one cookie.
    /// 2. Submits the credentials with that token and the step-1 cookies; the
    ///    response must set at least one cookie. Cookies from step 2 replace
    ///    step-1 cookies of the same name.
    ///
    /// Nothing is retained on failure.
    ///
    /// # Errors
    /// Returns [`AuthError`] if either request fails, a token or cookie is
    /// missing, or the API reports a result other than `Success`.
    pub async fn login(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        let (token, mut jar) = self.request_login_token().await?;

        debug!(username = %credentials.username, "Submitting login credentials");

        let response = self
            .api_post()
            .header(reqwest::header::COOKIE, jar.header_value())
            .form(&[
                ("action", "login"),
                ("format", "json"),
                ("lgname", credentials.username.as_str()),
                ("lgpassword", credentials.password.as_str()),
                ("lgtoken", token.as_str()),
            ])
            .send()
            .await
            .map_err(|source| AuthError::Transport {
                step: AuthStep::Login,
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::Status {
                step: AuthStep::Login,
                status: status.as_u16(),
            });
        }

        let fresh = CookieJar::from_headers(response.headers());
        let body: LoginResponse = response.json().await.map_err(|source| AuthError::Malformed {
            step: AuthStep::Login,
            source,
        })?;

        if let Some(LoginResult {
            result: Some(result),
            reason,
        }) = body.login
            && result != "Success"
        {
            return Err(AuthError::Rejected { result, reason });
        }

        if fresh.is_empty() {
            return Err(AuthError::MissingCookie {
                step: AuthStep::Login,
            });
        }

        jar.merge_from(fresh);
        Ok(Session::new(token, jar))
    }

    async fn request_login_token(&self) -> Result<(String, CookieJar), AuthError> {
        debug!(api = %self.api_url, "Requesting login token");

        let response = self
            .api_get()
            .query(&[("action", "query"), ("meta", "tokens"), ("type", "login")])
            .send()
            .await
            .map_err(|source| AuthError::Transport {
                step: AuthStep::Token,
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::Status {
                step: AuthStep::Token,
                status: status.as_u16(),
            });
        }

        let jar = CookieJar::from_headers(response.headers());
        let body: TokenResponse = response.json().await.map_err(|source| AuthError::Malformed {
            step: AuthStep::Token,
            source,
        })?;

        let token = body
            .query
            .and_then(|q| q.tokens)
            .and_then(|t| t.logintoken)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingToken)?;

        if jar.is_empty() {
            return Err(AuthError::MissingCookie {
                step: AuthStep::Token,
            });
        }

        Ok((token, jar))
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::wiki::test_support::*;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn credentials() -> Credentials {
        Credentials {
            username: "SyncBot".to_string(),
            password: "hunter2".to_string(),
        }
    }

    #[tokio::test]
    async fn test_login_threads_cookie_from_token_step() {
        let server = MockServer::start().await;
        mount_token(&server, "tok123", Some("wikidb_session=initial; path=/")).await;

        Mock::given(method("POST"))
            .and(path(API_PATH))
            .and(header("cookie", "wikidb_session=initial"))
            .and(body_string_contains("lgname=SyncBot"))
            .and(body_string_contains("lgpassword=hunter2"))
            .and(body_string_contains("lgtoken=tok123"))
            .respond_with(
                ResponseTemplate::new(200)
                    .append_header("set-cookie", "wikidb_session=fresh; path=/; HttpOnly")
                    .append_header("set-cookie", "wikidbUserID=7; path=/")
                    .set_body_json(json!({"login": {"result": "Success"}})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let session = client_for(&server).login(&credentials()).await.unwrap();

        assert_eq!(session.token(), "tok123");
        assert_eq!(
            session.cookie_header(),
            "wikidb_session=fresh; wikidbUserID=7"
        );
    }

    #[tokio::test]
    async fn test_login_fails_on_empty_token() {
        let server = MockServer::start().await;
        mount_token(&server, "", Some("wikidb_session=initial")).await;

        Mock::given(method("POST"))
            .and(path(API_PATH))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = client_for(&server).login(&credentials()).await.unwrap_err();
        assert!(matches!(err, AuthError::MissingToken), "got {err:?}");
    }

    #[tokio::test]
    async fn test_login_fails_without_initial_cookie() {
        let server = MockServer::start().await;
        mount_token(&server, "tok123", None).await;

        let err = client_for(&server).login(&credentials()).await.unwrap_err();
        assert!(
            matches!(err, AuthError::MissingCookie { step: AuthStep::Token }),
            "got {err:?}"
        );
    }

    #[tokio::test]
    async fn test_login_fails_when_no_session_cookie_returned() {
        let server = MockServer::start().await;
        mount_token(&server, "tok123", Some("wikidb_session=initial")).await;
        mount_login(&server, &[]).await;

        let err = client_for(&server).login(&credentials()).await.unwrap_err();
        assert!(
            matches!(err, AuthError::MissingCookie { step: AuthStep::Login }),
            "got {err:?}"
        );
    }

    #[tokio::test]
    async fn test_login_rejected_result() {
        let server = MockServer::start().await;
        mount_token(&server, "tok123", Some("wikidb_session=initial")).await;

        Mock::given(method("POST"))
            .and(path(API_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .append_header("set-cookie", "wikidb_session=anon")
                    .set_body_json(json!({
                        "login": {"result": "Failed", "reason": "Incorrect username or password entered."}
                    })),
            )
            .mount(&server)
            .await;

        match client_for(&server).login(&credentials()).await {
            Err(AuthError::Rejected { result, reason }) => {
                assert_eq!(result, "Failed");
                assert_eq!(
                    reason.as_deref(),
                    Some("Incorrect username or password entered.")
                );
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_login_token_http_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(API_PATH))
            .and(query_param("meta", "tokens"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = client_for(&server).login(&credentials()).await.unwrap_err();
        assert!(
            matches!(
                err,
                AuthError::Status {
                    step: AuthStep::Token,
                    status: 503
                }
            ),
            "got {err:?}"
        );
    }

    #[tokio::test]
    async fn test_login_token_malformed_body() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(API_PATH))
            .and(query_param("meta", "tokens"))
            .respond_with(
                ResponseTemplate::new(200)
                    .append_header("set-cookie", "wikidb_session=initial")
                    .set_body_string("<html>maintenance</html>"),
            )
            .mount(&server)
            .await;

        let err = client_for(&server).login(&credentials()).await.unwrap_err();
        assert!(
            matches!(err, AuthError::Malformed { step: AuthStep::Token, .. }),
            "got {err:?}"
        );
    }
}
