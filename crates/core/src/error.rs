//! Error types for the SPCF domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Every variant maps onto one of four error kinds, which is what callers
//! and the audit trail reason about.

use std::path::PathBuf;
use thiserror::Error;

/// The top-level error type for all factory operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A referenced user, workspace, template or artifact does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed LLM response, invalid area name, or rejected filename.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// An identifier collision that persisted after bounded retries.
    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("I/O failure while {context} ({path}): {source}")]
    Io {
        context: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The audit store rejected a read or write.
    #[error("Audit storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// The closed set of error kinds surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Validation,
    Duplicate,
    Io,
}

impl Error {
    /// Wrap a `std::io::Error` with what was being attempted and where.
    pub fn io(context: impl Into<String>, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            path: path.into(),
            source,
        }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::Validation(_) | Error::Serialization(_) => ErrorKind::Validation,
            Error::Duplicate(_) => ErrorKind::Duplicate,
            Error::Io { .. } | Error::Storage(_) => ErrorKind::Io,
        }
    }
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_displays_context_and_path() {
        let err = Error::io(
            "creating workspace",
            "/data/users/abc",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        let msg = err.to_string();
        assert!(msg.contains("creating workspace"));
        assert!(msg.contains("/data/users/abc"));
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn kinds_are_closed() {
        assert_eq!(Error::NotFound("x".into()).kind(), ErrorKind::NotFound);
        assert_eq!(Error::Validation("x".into()).kind(), ErrorKind::Validation);
        assert_eq!(Error::Duplicate("x".into()).kind(), ErrorKind::Duplicate);
        assert_eq!(Error::Storage("x".into()).kind(), ErrorKind::Io);

        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert_eq!(Error::from(json_err).kind(), ErrorKind::Validation);
    }
}
