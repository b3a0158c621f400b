//! Error types for reconciliation operations.
//!
//! Every failure carries an [`ErrorCategory`]. The reconciler's fallback
//! branches (alias lookup, create-to-update, idempotent delete) trigger on a
//! single category each; all other categories propagate unchanged.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Result type alias for reconciliation operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Categories of reconciliation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Resource or collection absent on the remote side.
    NotFound,
    /// Identity collision on create.
    Conflict,
    /// Malformed input: paths, filters, metadata, pending secret placeholders.
    Validation,
    /// Network or protocol failure.
    Transport,
    /// Other/unknown errors.
    Other,
}

impl ErrorCategory {
    /// Whether this category drives the alias-fallback branches.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }

    /// Whether this category drives the create-to-update fallback.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict)
    }

    /// Get a user-friendly description of this error category.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::NotFound => "Resource not found",
            Self::Conflict => "Resource already exists",
            Self::Validation => "Invalid input",
            Self::Transport => "Remote server unreachable or misbehaving",
            Self::Other => "Unexpected error",
        }
    }

    /// Get actionable advice for resolving this error category.
    #[must_use]
    pub fn advice(&self) -> &'static str {
        match self {
            Self::NotFound => "Check the logical path and the metadata identity attributes",
            Self::Conflict => "Set aliasFromAttribute so the existing item can be matched",
            Self::Validation => "Fix the metadata, filter expression or payload and try again",
            Self::Transport => "Check the server URL and your network connection",
            Self::Other => "Check the error details for more information",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors that can occur while resolving metadata or talking to the server.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Remote resource or collection does not exist.
    #[error("{method} {path}: not found")]
    NotFound {
        /// HTTP method of the failed request.
        method: String,
        /// Remote path of the failed request.
        path: String,
    },

    /// Remote server rejected a write because the identity is taken.
    #[error("{method} {path}: conflict with an existing resource")]
    Conflict {
        /// HTTP method of the failed request.
        method: String,
        /// Remote path of the failed request.
        path: String,
    },

    /// HTTP request failed for any other reason.
    #[error("HTTP request failed: {message}")]
    HttpError {
        /// Error message.
        message: String,
        /// HTTP status code if available.
        status: Option<u16>,
    },

    /// Logical path is not usable as a live resource address.
    #[error("invalid path {path:?}: {reason}")]
    InvalidPath {
        /// Offending path.
        path: String,
        /// Why it was rejected.
        reason: String,
    },

    /// jq expression failed to compile or run.
    #[error("invalid jq expression {expression:?}: {message}")]
    InvalidExpression {
        /// Expression text.
        expression: String,
        /// Compiler or runtime message.
        message: String,
    },

    /// Payload contains secret placeholders but no store is available.
    #[error("secret store is not configured")]
    SecretStoreNotConfigured,

    /// Secret store has no value for a placeholder.
    #[error("secret {key:?} not found for {path}")]
    SecretNotFound {
        /// Resource path the secret belongs to.
        path: String,
        /// Secret key.
        key: String,
    },

    /// A metadata fragment could not be parsed.
    #[error("invalid metadata {key}: {message}")]
    MetadataParse {
        /// Fragment key.
        key: String,
        /// Parser message.
        message: String,
    },

    /// Schema document could not be parsed.
    #[error("invalid schema document: {0}")]
    Schema(String),

    /// Invalid response body from the server.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// IO error during file operations.
    #[error("IO error at {path}: {source}")]
    Io {
        /// Path involved in the error.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },

    /// Generic error.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an IO error with path context.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create an HTTP error.
    pub fn http(message: impl Into<String>, status: Option<u16>) -> Self {
        Self::HttpError {
            message: message.into(),
            status,
        }
    }

    /// Create a not-found error for a request.
    pub fn not_found(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self::NotFound {
            method: method.into(),
            path: path.into(),
        }
    }

    /// Create a conflict error for a request.
    pub fn conflict(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self::Conflict {
            method: method.into(),
            path: path.into(),
        }
    }

    /// Create an invalid-path error.
    pub fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a jq expression error.
    pub fn expression(expression: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidExpression {
            expression: expression.into(),
            message: message.into(),
        }
    }

    /// Get the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::NotFound { .. } => ErrorCategory::NotFound,
            Error::Conflict { .. } => ErrorCategory::Conflict,
            Error::HttpError { status, .. } => match status {
                Some(404) => ErrorCategory::NotFound,
                Some(409) => ErrorCategory::Conflict,
                _ => ErrorCategory::Transport,
            },
            Error::InvalidPath { .. } => ErrorCategory::Validation,
            Error::InvalidExpression { .. } => ErrorCategory::Validation,
            Error::SecretStoreNotConfigured => ErrorCategory::Validation,
            Error::SecretNotFound { .. } => ErrorCategory::Validation,
            Error::MetadataParse { .. } => ErrorCategory::Validation,
            Error::Schema(_) => ErrorCategory::Validation,
            Error::InvalidResponse(_) => ErrorCategory::Transport,
            Error::Io { .. } => ErrorCategory::Other,
            Error::Other(_) => ErrorCategory::Other,
        }
    }

    /// Whether the remote side reported the target as absent.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.category().is_not_found()
    }

    /// Whether the remote side reported an identity collision.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        self.category().is_conflict()
    }
}

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(code) => Self::HttpError {
                message: format!("HTTP {}", code),
                status: Some(code),
            },
            other => Self::HttpError {
                message: other.to_string(),
                status: None,
            },
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Self::Io {
            path: PathBuf::new(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidResponse(err.to_string())
    }
}
