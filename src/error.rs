//! Error types for wallfetch
//!
//! Only hard failures are errors. Expected skip conditions (throttled, banned,
//! already downloaded, unsafe, not an image) are reported as
//! [`DownloadOutcome::Skipped`](crate::types::DownloadOutcome) instead, so callers can tell
//! "nothing to do right now" apart from "something broke".

use thiserror::Error;

/// Result type alias for wallfetch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for wallfetch
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "target_dir")
        key: Option<String>,
    },

    /// I/O error while writing the image, its temp file or its metadata sidecar
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Transport-level network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The image server answered with a non-success status
    #[error("HTTP {status} fetching {url}")]
    HttpStatus {
        /// Status code returned by the server
        status: u16,
        /// URL that was requested
        url: String,
    },

    /// Serialization error (metadata sidecar)
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The source failed to produce queue items
    #[error("queue fill failed for source {source_name}: {message}")]
    Fill {
        /// Name of the source whose fill failed
        source_name: String,
        /// Description of the upstream failure
        message: String,
    },

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Build a [`Error::Fill`] from any displayable upstream error
    pub fn fill(source_name: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Error::Fill {
            source_name: source_name.into(),
            message: err.to_string(),
        }
    }

    /// Build a [`Error::Config`] pointing at the offending key
    pub fn config(key: &str, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.to_string()),
        }
    }
}
