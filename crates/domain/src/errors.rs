//! Error types used throughout the connectivity layer

use std::time::Duration;

use serde::{Deserialize, Serialize};
use studiolink_common::error::{ErrorClassification, ErrorSeverity, FromTimeout};
use thiserror::Error;

use crate::classifier::{classify, ErrorCategory};

/// Main error type for StudioLink connectivity
///
/// Every failure a backend call, probe, or refresh can produce is expressed
/// here. The classifier turns a value into an [`ErrorCategory`].
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "details", rename_all = "snake_case")]
pub enum ConnectivityError {
    /// Transport failure: connection refused, DNS, reset, TLS
    #[error("Network error: {0}")]
    Network(String),

    /// An attempt lost its timeout race
    #[error("{operation} timed out after {timeout_ms}ms")]
    Timeout { operation: String, timeout_ms: u64 },

    /// Non-success HTTP response
    #[error("HTTP {status}: {message}")]
    Http { status: u16, code: Option<String>, message: String },

    /// Error object returned by the backend without a usable HTTP status
    #[error("Backend error ({code}): {message}")]
    Backend { code: String, message: String },

    /// Settings that failed to load or validate
    #[error("Configuration error: {0}")]
    Config(String),

    /// Caller-supplied request rejected before it reached the backend
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Broken invariant or task failure inside the connectivity layer
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for connectivity operations
pub type Result<T> = std::result::Result<T, ConnectivityError>;

impl ConnectivityError {
    /// Timeout error for `operation` after waiting `after`
    pub fn timeout(operation: impl Into<String>, after: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout_ms: u64::try_from(after.as_millis()).unwrap_or(u64::MAX),
        }
    }

    /// HTTP error without a backend error code
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http { status, code: None, message: message.into() }
    }

    /// Classify this error
    pub fn category(&self) -> ErrorCategory {
        classify(self)
    }

    /// HTTP status, when the failure came from a response
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether a session refresh is the expected remedy
    pub fn is_credential_expired(&self) -> bool {
        self.category() == ErrorCategory::CredentialExpired
    }
}

impl ErrorClassification for ConnectivityError {
    fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }

    fn severity(&self) -> ErrorSeverity {
        match (self, self.category()) {
            (Self::Internal(_), _) => ErrorSeverity::Critical,
            (_, ErrorCategory::FatalClient | ErrorCategory::Unknown) => ErrorSeverity::Error,
            _ => ErrorSeverity::Warning,
        }
    }
}

impl FromTimeout for ConnectivityError {
    fn from_timeout(operation: &str, after: Duration) -> Self {
        Self::timeout(operation, after)
    }
}
