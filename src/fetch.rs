//! Blocking HTTP fetcher for manifest endpoints
//!
//! The renderer only needs "GET this URL, give me status and body". The
//! [`HttpFetcher`] trait captures exactly that so tests (and hosts with their
//! own HTTP stack) can substitute it; [`ReqwestFetcher`] is the default.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT};

use crate::error::ManifestError;

/// Default `User-Agent` sent with manifest requests
pub const DEFAULT_USER_AGENT: &str = concat!("server-tag/", env!("CARGO_PKG_VERSION"));

/// Status and body of a completed HTTP exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Client or server error status (4xx/5xx)
    pub fn is_error(&self) -> bool {
        self.status >= 400
    }
}

/// Performs a blocking GET request
///
/// Returns `Err` only for connection-level failures; an error status is a
/// successful exchange and comes back as `Ok`.
pub trait HttpFetcher: Send + Sync {
    fn get(&self, url: &str) -> Result<HttpResponse, ManifestError>;
}

/// Configuration for [`ReqwestFetcher`]
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Overall request timeout; `None` keeps the HTTP client's default
    pub timeout: Option<Duration>,
    /// `User-Agent` header value
    pub user_agent: String,
    /// Extra headers sent with every request
    pub headers: Vec<(String, String)>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            headers: Vec::new(),
        }
    }
}

/// [`HttpFetcher`] backed by `reqwest`'s blocking client
///
/// Must not be called from inside an async runtime; the blocking client spins
/// up its own.
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    http_client: Client,
}

impl ReqwestFetcher {
    /// Creates a fetcher with default configuration
    pub fn new() -> Result<Self, ManifestError> {
        Self::with_config(&FetchConfig::default())
    }

    pub fn with_config(config: &FetchConfig) -> Result<Self, ManifestError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        for (name, value) in &config.headers {
            let (Ok(name), Ok(value)) = (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) else {
                log::warn!("Ignoring invalid header {name:?}");
                continue;
            };
            headers.insert(name, value);
        }

        let mut builder = Client::builder()
            .user_agent(config.user_agent.as_str())
            .default_headers(headers);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http_client: builder.build()?,
        })
    }
}

impl HttpFetcher for ReqwestFetcher {
    fn get(&self, url: &str) -> Result<HttpResponse, ManifestError> {
        let response = self.http_client.get(url).send()?;
        let status = response.status().as_u16();
        let body = response.bytes()?;
        Ok(HttpResponse::new(status, body.to_vec()))
    }
}
