//! Error types for Irelia.
//!
//! Every failure the cache can hit falls into one of three recoverable
//! families (quota refusal, remote fetch failure, store failure) plus a few
//! caller-facing conditions. None of them are raised as panics.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the Irelia crates.
#[derive(Debug, Error)]
pub enum IreliaError {
    // Admission errors
    #[error("Rate limited by {service}, retry after {retry_after_secs:?} seconds")]
    RateLimited {
        service: String,
        retry_after_secs: Option<u64>,
    },

    // Remote fetch errors
    #[error("Fetch failed: {message}")]
    FetchFailed {
        message: String,
        /// HTTP status returned by the remote, when there was one.
        status: Option<u16>,
    },

    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    #[error("Request timeout after {0:?}")]
    Timeout(std::time::Duration),

    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    // Store errors
    #[error("Store error: {message}")]
    Store {
        message: String,
        #[source]
        source: Option<rusqlite::Error>,
    },

    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    // Lookup errors
    #[error("No data for {key} in {collection}")]
    NotFound { collection: String, key: String },

    // Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("{0}")]
    Other(String),
}

/// Result type alias for Irelia operations.
pub type Result<T> = std::result::Result<T, IreliaError>;

/// Coarse classification of an [`IreliaError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    RateLimited,
    FetchFailed,
    StoreFailure,
    NotFound,
    Config,
}

impl From<std::io::Error> for IreliaError {
    fn from(err: std::io::Error) -> Self {
        IreliaError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for IreliaError {
    fn from(err: serde_json::Error) -> Self {
        IreliaError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<rusqlite::Error> for IreliaError {
    fn from(err: rusqlite::Error) -> Self {
        IreliaError::Store {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<reqwest::Error> for IreliaError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            IreliaError::Timeout(crate::config::NetworkConfig::REQUEST_TIMEOUT)
        } else {
            IreliaError::Network {
                message: err.to_string(),
                source: Some(err),
            }
        }
    }
}

impl IreliaError {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        IreliaError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    /// Create a store error without an underlying SQLite cause.
    pub fn store(message: impl Into<String>) -> Self {
        IreliaError::Store {
            message: message.into(),
            source: None,
        }
    }

    /// Which failure family this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            IreliaError::RateLimited { .. } => ErrorKind::RateLimited,
            IreliaError::FetchFailed { .. }
            | IreliaError::Network { .. }
            | IreliaError::Timeout(_)
            | IreliaError::Json { .. }
            | IreliaError::Other(_) => ErrorKind::FetchFailed,
            IreliaError::Store { .. } | IreliaError::Io { .. } => ErrorKind::StoreFailure,
            IreliaError::NotFound { .. } => ErrorKind::NotFound,
            IreliaError::Config { .. } => ErrorKind::Config,
        }
    }

    /// Check if a later attempt could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            IreliaError::RateLimited { .. }
                | IreliaError::Network { .. }
                | IreliaError::Timeout(_)
        ) || matches!(self, IreliaError::FetchFailed { status: Some(s), .. } if *s >= 500)
    }
}
