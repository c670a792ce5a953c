//! Session credentials threaded through every authenticated call.

use reqwest::RequestBuilder;
use reqwest::header::{COOKIE, HeaderMap, SET_COOKIE};
use std::fmt;

/// A single `name=value` cookie pair
#[derive(Clone, PartialEq, Eq)]
pub struct Cookie {
    name: String,
    value: String,
}

impl Cookie {
    /// Parse the leading `name=value` pair of a `Set-Cookie` header value
    ///
    /// Attributes (`path`, `HttpOnly`, ...) are ignored. Returns `None` for a
    /// header without a name.
    pub fn parse(set_cookie: &str) -> Option<Self> {
        let pair = set_cookie.split(';').next()?.trim();
        let (name, value) = pair.split_once('=')?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        Some(Self {
            name: name.to_string(),
            value: value.trim().to_string(),
        })
    }

    /// Cookie name
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for Cookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}=<redacted>", self.name)
    }
}

/// Ordered cookie set used while the handshake is in progress
///
/// Setting a cookie that already exists replaces its value in place, so the
/// most recently received value always wins.
#[derive(Clone, Debug, Default)]
pub(crate) struct CookieJar {
    cookies: Vec<Cookie>,
}

impl CookieJar {
    /// Collect every `Set-Cookie` header from a response
    pub(crate) fn from_headers(headers: &HeaderMap) -> Self {
        let mut jar = Self::default();
        jar.merge(
            headers
                .get_all(SET_COOKIE)
                .iter()
                .filter_map(|value| value.to_str().ok())
                .filter_map(Cookie::parse),
        );
        jar
    }

    /// Merge newer cookies over the current set
    pub(crate) fn merge<I>(&mut self, newer: I)
    where
        I: IntoIterator<Item = Cookie>,
    {
        for cookie in newer {
            match self.cookies.iter_mut().find(|c| c.name == cookie.name) {
                Some(existing) => existing.value = cookie.value,
                None => self.cookies.push(cookie),
            }
        }
    }

    /// Merge another jar over this one
    pub(crate) fn merge_from(&mut self, newer: CookieJar) {
        self.merge(newer.cookies);
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    pub(crate) fn header_value(&self) -> String {
        self.cookies
            .iter()
            .map(|c| format!("{}={}", c.name, c.value))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Credential bundle for one sync run
///
/// Produced once by [`WikiClient::login`](super::WikiClient::login), read-only
/// afterwards, never persisted. `Debug` output hides the token and cookie values.
#[derive(Clone)]
pub struct Session {
    token: String,
    cookies: CookieJar,
}

impl Session {
    pub(crate) fn new(token: String, cookies: CookieJar) -> Self {
        Self { token, cookies }
    }

    /// The login token obtained in the first handshake step
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Names of the cookies carried by this session
    pub fn cookie_names(&self) -> Vec<&str> {
        self.cookies.cookies.iter().map(Cookie::name).collect()
    }

    /// Value for the `Cookie` request header
    pub fn cookie_header(&self) -> String {
        self.cookies.header_value()
    }

    /// Attach the session cookies to a request
    pub(crate) fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request.header(COOKIE, self.cookie_header())
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("cookies", &self.cookies.cookies)
            .finish()
    }
}
