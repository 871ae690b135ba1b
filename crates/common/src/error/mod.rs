//! Error classification shared across StudioLink crates
//!
//! Layer-specific error enums (the domain's `ConnectivityError`, adapter
//! errors) stay in their own crates. What they share is the vocabulary used
//! by generic infrastructure such as the retry executor to decide what to do
//! with a failure:
//!
//! - **`ErrorClassification`**: is this failure transient, how serious is it,
//!   is there a server-suggested delay?
//! - **`ErrorSeverity`**: a unified severity scale for logging and alerting.
//! - **`FromTimeout`**: how an error type spells "this attempt timed out".
//!
//! ## ErrorSeverity Levels
//!
//! | Level | Use Case | Examples |
//! |-------|----------|----------|
//! | **Info** | Expected conditions | Anonymous session, empty result |
//! | **Warning** | Degraded but operational | Timeouts, rate limiting, 503 |
//! | **Error** | Failure requiring attention | Validation, permission errors |
//! | **Critical** | System integrity at risk | Invariant violations |
//!
//! ## Example
//!
//! ```rust
//! use studiolink_common::error::{ErrorClassification, ErrorSeverity};
//!
//! #[derive(Debug)]
//! enum UploadError {
//!     Throttled,
//!     Rejected(String),
//! }
//!
//! impl ErrorClassification for UploadError {
//!     fn is_retryable(&self) -> bool {
//!         matches!(self, Self::Throttled)
//!     }
//!
//!     fn severity(&self) -> ErrorSeverity {
//!         match self {
//!             Self::Throttled => ErrorSeverity::Warning,
//!             Self::Rejected(_) => ErrorSeverity::Error,
//!         }
//!     }
//! }
//!
//! assert!(UploadError::Throttled.is_retryable());
//! assert!(!UploadError::Rejected("bad mime type".into()).is_retryable());
//! ```

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Standard interface for classifying errors by their characteristics
///
/// Implemented by every error type that flows through the retry executor.
pub trait ErrorClassification {
    /// Check if this error is retryable
    ///
    /// Retryable errors are transient: connectivity loss, timeouts, expired
    /// credentials that a refresh will fix, overloaded servers.
    fn is_retryable(&self) -> bool;

    /// Get the error severity level
    ///
    /// Used for monitoring, alerting, and logging decisions.
    fn severity(&self) -> ErrorSeverity;

    /// Check if this is a critical error requiring immediate attention
    fn is_critical(&self) -> bool {
        self.severity() == ErrorSeverity::Critical
    }

    /// Get the suggested retry delay if applicable
    ///
    /// Returns `Some(Duration)` when the failure carried an explicit hint
    /// (for example a `Retry-After` header).
    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

/// Constructs the error value reported when an attempt loses a timeout race
///
/// The message of the produced error must say "timed out" so callers can
/// tell a connectivity problem apart from a backend rejection.
pub trait FromTimeout {
    /// Build the timeout error for `operation` after waiting `after`
    fn from_timeout(operation: &str, after: Duration) -> Self;
}

/// Error severity levels for monitoring and alerting
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorSeverity {
    /// Informational, typically for debugging
    Info,
    /// Warning, should be monitored but not critical
    Warning,
    /// Error, requires attention and action
    Error,
    /// Critical, immediate action required
    Critical,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

impl<E: ErrorClassification + ?Sized> ErrorClassification for Box<E> {
    fn is_retryable(&self) -> bool {
        (**self).is_retryable()
    }

    fn severity(&self) -> ErrorSeverity {
        (**self).severity()
    }

    fn is_critical(&self) -> bool {
        (**self).is_critical()
    }

    fn retry_after(&self) -> Option<Duration> {
        (**self).retry_after()
    }
}
