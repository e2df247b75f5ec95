//! Error type definitions for the catalog
//!
//! A small hierarchy: [`AppError`] wraps the layer-specific enums so callers
//! can use `?` across layers while still matching on the precise failure.

use std::time::Duration;

use thiserror::Error;

/// Top-level application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Playlist and guide source errors
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Reachability probe errors
    #[error("Probe error: {0}")]
    Probe(#[from] ProbeError),

    /// Media sink errors
    #[error("Playback error: {0}")]
    Playback(#[from] PlaybackError),

    /// Persisted state errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Generic internal errors
    #[error("Internal error: {message}")]
    Internal { message: String },

    /// HTTP client construction errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Errors raised while obtaining or decoding playlist and guide content
#[derive(Error, Debug)]
pub enum SourceError {
    /// The content could not be parsed in the expected format
    #[error("Format error: {format} - {message}")]
    Format { format: String, message: String },

    /// Network failure while fetching a source
    #[error("Fetch failed: {url} - {message}")]
    Fetch { url: String, message: String },

    /// The server answered with a non-success status
    #[error("HTTP error: {status} - {url}")]
    Http { status: u16, url: String },

    /// The file name or URL suffix maps to no known playlist format
    #[error("Unsupported format: {name}")]
    UnsupportedFormat { name: String },

    /// Invalid input rejected before any I/O happened
    #[error("Invalid source: {message}")]
    InvalidSource { message: String },

    /// Compressed content could not be expanded
    #[error("Decompression failed: {message}")]
    Decompression { message: String },
}

/// Per-channel reachability failures. Both variants classify a channel as offline.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    #[error("Probe timed out after {timeout:?}: {url}")]
    Timeout { url: String, timeout: Duration },

    #[error("Probe failed: {url} - {message}")]
    Failure { url: String, message: String },
}

/// Media sink failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlaybackError {
    /// Unrecoverable failure reported by the sink for a URL
    #[error("Fatal playback error: {url} - {message}")]
    Fatal { url: String, message: String },

    /// The sink rejected an operation
    #[error("Media error: {message}")]
    Media { message: String },
}

/// Persisted state failures
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

impl SourceError {
    /// Create a format error for the named format
    pub fn format<F: Into<String>, M: Into<String>>(format: F, message: M) -> Self {
        Self::Format {
            format: format.into(),
            message: message.into(),
        }
    }

    /// Create a fetch error
    pub fn fetch<U: Into<String>, M: Into<String>>(url: U, message: M) -> Self {
        Self::Fetch {
            url: url.into(),
            message: message.into(),
        }
    }

    pub fn unsupported_format<S: Into<String>>(name: S) -> Self {
        Self::UnsupportedFormat { name: name.into() }
    }

    pub fn invalid_source<S: Into<String>>(message: S) -> Self {
        Self::InvalidSource {
            message: message.into(),
        }
    }

    /// Whether the failure happened on the network side (as opposed to the content)
    pub fn is_fetch_error(&self) -> bool {
        matches!(self, Self::Fetch { .. } | Self::Http { .. })
    }
}

impl ProbeError {
    pub fn url(&self) -> &str {
        match self {
            Self::Timeout { url, .. } | Self::Failure { url, .. } => url,
        }
    }
}
