//! Error types for the hfsapi library.

use reqwest::StatusCode;
use thiserror::Error;

/// Main error type for hfsapi operations.
#[derive(Error, Debug)]
pub enum HfsError {
    /// Transport failure: connection refused, timeout, truncated body.
    #[error("Network error on {path}: {source}")]
    Network {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    /// Credentials rejected (401/403) or no session issued by login.
    #[error("Authentication failed ({status}) on {path}")]
    Auth { status: StatusCode, path: String },

    /// Resource absent (404).
    #[error("Not found: {path}")]
    NotFound { path: String },

    /// Server-side failure (5xx).
    #[error("Server error {status} on {path}: {body}")]
    Server {
        status: StatusCode,
        path: String,
        body: String,
    },

    /// Any other non-success status, e.g. 409 on a name conflict.
    #[error("HTTP {status} on {path}: {body}")]
    Http {
        status: StatusCode,
        path: String,
        body: String,
    },

    /// Well-formed HTTP whose payload does not have the expected shape.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Caller supplied an unusable value.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Operation observed a cancellation request.
    #[error("Operation cancelled")]
    Cancelled,

    /// Local I/O failure.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// JSON encoding/decoding error outside the network boundary.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl HfsError {
    /// Classify a non-success HTTP status.
    pub fn from_status(status: StatusCode, path: impl Into<String>, body: impl Into<String>) -> Self {
        let path = path.into();
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => HfsError::Auth { status, path },
            StatusCode::NOT_FOUND => HfsError::NotFound { path },
            s if s.is_server_error() => HfsError::Server {
                status,
                path,
                body: body.into(),
            },
            _ => HfsError::Http {
                status,
                path,
                body: body.into(),
            },
        }
    }

    pub(crate) fn network(path: impl Into<String>, source: reqwest::Error) -> Self {
        HfsError::Network {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        HfsError::Io {
            path: path.into(),
            source,
        }
    }

    /// The HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            HfsError::Auth { status, .. }
            | HfsError::Server { status, .. }
            | HfsError::Http { status, .. } => Some(*status),
            HfsError::NotFound { .. } => Some(StatusCode::NOT_FOUND),
            HfsError::Network { source, .. } => source.status(),
            _ => None,
        }
    }

    /// The request path this error refers to, if any.
    pub fn path(&self) -> Option<&str> {
        match self {
            HfsError::Network { path, .. }
            | HfsError::Auth { path, .. }
            | HfsError::NotFound { path }
            | HfsError::Server { path, .. }
            | HfsError::Http { path, .. }
            | HfsError::Io { path, .. } => Some(path),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, HfsError::NotFound { .. })
    }
}

/// Result type alias for hfsapi operations.
pub type Result<T> = std::result::Result<T, HfsError>;
