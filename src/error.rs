//! Error types for manifest fetching and caching
//!
//! A manifest that cannot be obtained is never reported to the template that
//! asked for it. These types exist so the failure can be described in the
//! diagnostic log line and matched on in tests.

use thiserror::Error;

/// The single failure kind of the render flow: the manifest is unavailable
#[derive(Debug, Error)]
pub enum ManifestError {
    /// Connection-level failure (DNS, refused connection, timeout, invalid URL)
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The endpoint answered with a client or server error status
    #[error("HTTP error {status} from {url}")]
    Status { url: String, status: u16 },

    /// The body was not a manifest-shaped JSON document
    #[error("Failed to parse manifest: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Errors raised by cache backends when storing an entry
#[derive(Debug, Error)]
pub enum CacheError {
    /// Cache directory or file could not be written
    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Entry could not be serialized
    #[error("Cache serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}
