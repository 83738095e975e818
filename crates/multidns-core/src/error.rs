//! Error types for the multi-server orchestration system
//!
//! This module defines all error types used throughout the crate, plus the
//! machine-oriented [`FailureCause`] that every per-server failure is reduced to.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for orchestration operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the orchestration system
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// The server registry snapshot could not be obtained
    #[error("Registry unavailable: {0}")]
    Registry(String),

    /// A call did not complete within the server's timeout
    #[error("Timeout: {0}")]
    Timeout(String),

    /// The server could not be reached
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Authentication errors
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Zone or record not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// The server reported a conflicting resource
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The server rejected the request as invalid
    #[error("Rejected: {0}")]
    Rejected(String),

    /// The server answered with a 5xx status
    #[error("Server error ({status}): {message}")]
    Server {
        /// HTTP status code
        status: u16,
        /// Error message
        message: String,
    },

    /// The server answered with a body that could not be understood
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Client-specific error
    #[error("Client error ({client}): {message}")]
    Client {
        /// Client name
        client: String,
        /// Error message
        message: String,
    },

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a registry error
    pub fn registry(msg: impl Into<String>) -> Self {
        Self::Registry(msg.into())
    }

    /// Create a timeout error
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// Create a connection error
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a conflict error
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Create a rejected-request error
    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::Rejected(msg.into())
    }

    /// Create an upstream server error
    pub fn server(status: u16, message: impl Into<String>) -> Self {
        Self::Server {
            status,
            message: message.into(),
        }
    }

    /// Create an invalid response error
    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Create a client-specific error
    pub fn client(client: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Client {
            client: client.into(),
            message: message.into(),
        }
    }

    /// The machine-oriented cause of this error
    pub fn cause(&self) -> FailureCause {
        match self {
            Self::Timeout(_) => FailureCause::Timeout,
            Self::Connection(_) | Self::Io(_) => FailureCause::Connectivity,
            Self::Authentication(_) => FailureCause::Authentication,
            Self::NotFound(_) => FailureCause::NotFound,
            Self::Conflict(_) => FailureCause::Conflict,
            Self::Rejected(_) => FailureCause::Rejected,
            Self::Server { .. } => FailureCause::ServerError,
            Self::InvalidResponse(_) | Self::Json(_) => FailureCause::InvalidResponse,
            Self::Config(_) | Self::Registry(_) => FailureCause::Configuration,
            Self::Client { .. } | Self::Other(_) => FailureCause::Other,
        }
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

/// Short, machine-oriented classification of a per-server failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCause {
    /// The call exceeded the server's timeout
    Timeout,
    /// The server was unreachable
    Connectivity,
    /// Credentials were rejected
    Authentication,
    /// The zone or record does not exist on that server
    NotFound,
    /// The resource already exists or is being modified
    Conflict,
    /// The server refused the payload
    Rejected,
    /// The server failed internally
    ServerError,
    /// The server answered with something unparseable
    InvalidResponse,
    /// The profile itself is unusable
    Configuration,
    /// Anything else
    Other,
}

impl FailureCause {
    /// Stable identifier used in logs and response bodies
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Connectivity => "connectivity",
            Self::Authentication => "authentication",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::Rejected => "rejected",
            Self::ServerError => "server_error",
            Self::InvalidResponse => "invalid_response",
            Self::Configuration => "configuration",
            Self::Other => "other",
        }
    }

    /// Whether the failure means the server could not be talked to at all
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::Timeout | Self::Connectivity)
    }
}

impl std::fmt::Display for FailureCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a single server failed: a cause plus a human-readable message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-oriented cause
    pub cause: FailureCause,
    /// Human-readable message
    pub message: String,
}

impl ErrorDetail {
    /// Create a new error detail
    pub fn new(cause: FailureCause, message: impl Into<String>) -> Self {
        Self {
            cause,
            message: message.into(),
        }
    }

    /// Detail for a call cut off by the dispatcher's per-server timeout
    pub fn timeout() -> Self {
        Self::new(FailureCause::Timeout, "timeout")
    }
}

impl From<&Error> for ErrorDetail {
    fn from(err: &Error) -> Self {
        let message = match err {
            Error::Timeout(_) => "timeout".to_string(),
            other => other.to_string(),
        };
        Self::new(err.cause(), message)
    }
}

impl From<Error> for ErrorDetail {
    fn from(err: Error) -> Self {
        Self::from(&err)
    }
}

impl std::fmt::Display for ErrorDetail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_causes() {
        assert_eq!(Error::timeout("5s").cause(), FailureCause::Timeout);
        assert_eq!(Error::connection("refused").cause(), FailureCause::Connectivity);
        assert_eq!(Error::auth("bad key").cause(), FailureCause::Authentication);
        assert_eq!(Error::server(503, "down").cause(), FailureCause::ServerError);
        assert_eq!(Error::client("powerdns", "boom").cause(), FailureCause::Other);
        assert_eq!(Error::registry("gone").cause(), FailureCause::Configuration);
    }

    #[test]
    fn test_connectivity_classification() {
        assert!(FailureCause::Timeout.is_connectivity());
        assert!(FailureCause::Connectivity.is_connectivity());
        assert!(!FailureCause::Authentication.is_connectivity());
        assert!(!FailureCause::Rejected.is_connectivity());
    }

    #[test]
    fn test_error_detail_from_error() {
        let detail = ErrorDetail::from(Error::timeout("after 5000ms"));
        assert_eq!(detail.cause, FailureCause::Timeout);
        assert_eq!(detail.message, "timeout");

        let detail = ErrorDetail::from(Error::rejected("RRset has no records"));
        assert_eq!(detail.cause, FailureCause::Rejected);
        assert_eq!(detail.to_string(), "Rejected: RRset has no records");
    }

    #[test]
    fn test_anyhow_conversion() {
        let err: Error = anyhow::anyhow!("wrapped").into();
        assert!(matches!(err, Error::Other(ref msg) if msg == "wrapped"));
    }

    #[test]
    fn test_cause_serializes_snake_case() {
        let json = serde_json::to_string(&FailureCause::ServerError).unwrap();
        assert_eq!(json, "\"server_error\"");
    }
}
