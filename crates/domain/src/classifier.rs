//! Error classification
//!
//! Maps a [`ConnectivityError`] to one of six categories. The first four are
//! transient and worth retrying; the last two surface immediately.
//! Unrecognised failures fail closed.
//!
//! | Category | Retried | Source |
//! |---|---|---|
//! | `TransientNetwork` | yes | transport failure, "network"/"fetch" messages |
//! | `Timeout` | yes | local timeout race, HTTP 408/504 |
//! | `CredentialExpired` | yes | HTTP 401, JWT expiry codes or messages |
//! | `TransientServer` | yes | HTTP 429/500/502/503 |
//! | `FatalClient` | no | other 4xx, invalid input, configuration |
//! | `Unknown` | no | everything else |

use std::fmt;
use std::str::FromStr;

use crate::constants::{CREDENTIAL_EXPIRED_CODES, CREDENTIAL_EXPIRED_MESSAGES};
use crate::errors::ConnectivityError;

/// Coarse failure taxonomy used for retry decisions and log labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Transport failure before a response arrived
    TransientNetwork,
    /// Attempt exceeded its deadline, locally or at the gateway
    Timeout,
    /// Access token rejected as expired; a refresh may fix it
    CredentialExpired,
    /// Overloaded or temporarily failing backend
    TransientServer,
    /// Request the backend will keep rejecting
    FatalClient,
    /// Anything unrecognised; never retried
    Unknown,
}

impl ErrorCategory {
    /// Every category, in taxonomy order
    pub const ALL: [Self; 6] = [
        Self::TransientNetwork,
        Self::Timeout,
        Self::CredentialExpired,
        Self::TransientServer,
        Self::FatalClient,
        Self::Unknown,
    ];

    /// Whether failures in this category are worth another attempt
    pub const fn is_retryable(self) -> bool {
        matches!(
            self,
            Self::TransientNetwork | Self::Timeout | Self::CredentialExpired | Self::TransientServer
        )
    }

    /// Stable snake_case label for structured logs, `Display` and `FromStr`
    pub const fn label(self) -> &'static str {
        match self {
            Self::TransientNetwork => "transient_network",
            Self::Timeout => "timeout",
            Self::CredentialExpired => "credential_expired",
            Self::TransientServer => "transient_server",
            Self::FatalClient => "fatal_client",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ErrorCategory {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|category| category.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Invalid ErrorCategory: {s}"))
    }
}

/// Classify an error
pub fn classify(error: &ConnectivityError) -> ErrorCategory {
    match error {
        ConnectivityError::Network(_) => ErrorCategory::TransientNetwork,
        ConnectivityError::Timeout { .. } => ErrorCategory::Timeout,
        ConnectivityError::Http { status, code, message } => {
            if *status == 401 || signals_credential_expiry(code.as_deref(), message) {
                return ErrorCategory::CredentialExpired;
            }
            match status {
                408 | 504 => ErrorCategory::Timeout,
                429 | 500 | 502 | 503 => ErrorCategory::TransientServer,
                400..=499 => ErrorCategory::FatalClient,
                _ => ErrorCategory::Unknown,
            }
        }
        ConnectivityError::Backend { code, message } => {
            if signals_credential_expiry(Some(code), message) {
                ErrorCategory::CredentialExpired
            } else {
                classify_message(message).unwrap_or(ErrorCategory::Unknown)
            }
        }
        ConnectivityError::Config(_) | ConnectivityError::InvalidInput(_) => {
            ErrorCategory::FatalClient
        }
        ConnectivityError::Internal(message) => {
            classify_message(message).unwrap_or(ErrorCategory::Unknown)
        }
    }
}

/// Whether an error is worth retrying
pub fn is_retryable(error: &ConnectivityError) -> bool {
    classify(error).is_retryable()
}

fn signals_credential_expiry(code: Option<&str>, message: &str) -> bool {
    if code.is_some_and(|code| CREDENTIAL_EXPIRED_CODES.contains(&code)) {
        return true;
    }
    let message = message.to_lowercase();
    CREDENTIAL_EXPIRED_MESSAGES.iter().any(|needle| message.contains(needle))
}

fn classify_message(message: &str) -> Option<ErrorCategory> {
    let message = message.to_lowercase();
    if message.contains("timed out") || message.contains("timeout") {
        Some(ErrorCategory::Timeout)
    } else if message.contains("network")
        || message.contains("fetch")
        || message.contains("connection")
    {
        Some(ErrorCategory::TransientNetwork)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn http(status: u16) -> ConnectivityError {
        ConnectivityError::http(status, "response")
    }

    #[test]
    fn test_transport_and_timeout_are_retryable() {
        assert_eq!(
            classify(&ConnectivityError::Network("connection refused".into())),
            ErrorCategory::TransientNetwork
        );
        assert_eq!(
            classify(&ConnectivityError::timeout("select:images", Duration::from_secs(15))),
            ErrorCategory::Timeout
        );
        assert_eq!(classify(&http(408)), ErrorCategory::Timeout);
        assert_eq!(classify(&http(504)), ErrorCategory::Timeout);
    }

    #[test]
    fn test_server_statuses() {
        for status in [429, 500, 502, 503] {
            assert_eq!(classify(&http(status)), ErrorCategory::TransientServer, "status {status}");
            assert!(is_retryable(&http(status)));
        }
        assert_eq!(classify(&http(501)), ErrorCategory::Unknown);
        assert!(!is_retryable(&http(501)));
    }

    #[test]
    fn test_client_statuses_are_fatal() {
        for status in [400, 403, 404, 409, 422] {
            assert_eq!(classify(&http(status)), ErrorCategory::FatalClient, "status {status}");
            assert!(!is_retryable(&http(status)));
        }
    }

    /// 401 is retryable even though it is a 4xx: a refresh fixes it.
    #[test]
    fn test_credential_expiry_signals() {
        assert_eq!(classify(&http(401)), ErrorCategory::CredentialExpired);

        let by_code = ConnectivityError::Http {
            status: 400,
            code: Some("PGRST303".into()),
            message: "bad request".into(),
        };
        assert_eq!(classify(&by_code), ErrorCategory::CredentialExpired);

        let by_message = ConnectivityError::Backend {
            code: "unknown".into(),
            message: "JWT expired".into(),
        };
        assert_eq!(classify(&by_message), ErrorCategory::CredentialExpired);
        assert!(is_retryable(&by_message));
    }

    #[test]
    fn test_backend_message_heuristics() {
        let fetch = ConnectivityError::Backend {
            code: "".into(),
            message: "TypeError: Failed to fetch".into(),
        };
        assert_eq!(classify(&fetch), ErrorCategory::TransientNetwork);

        let opaque = ConnectivityError::Backend {
            code: "23505".into(),
            message: "duplicate key value violates unique constraint".into(),
        };
        assert_eq!(classify(&opaque), ErrorCategory::Unknown);
        assert!(!is_retryable(&opaque));
    }

    #[test]
    fn test_local_errors_fail_closed() {
        let invalid = ConnectivityError::InvalidInput("empty table name".into());
        let config = ConnectivityError::Config("missing url".into());
        let internal = ConnectivityError::Internal("poisoned".into());

        assert_eq!(classify(&invalid), ErrorCategory::FatalClient);
        assert_eq!(classify(&config), ErrorCategory::FatalClient);
        assert_eq!(classify(&internal), ErrorCategory::Unknown);
    }

    #[test]
    fn test_labels_match_display_and_parse() {
        for category in ErrorCategory::ALL {
            assert_eq!(category.label(), category.to_string());
            assert_eq!(category.label().parse::<ErrorCategory>(), Ok(category));
            assert_eq!(
                category.label().to_uppercase().parse::<ErrorCategory>(),
                Ok(category)
            );
        }
        assert_eq!(
            "retry_later".parse::<ErrorCategory>(),
            Err("Invalid ErrorCategory: retry_later".to_string())
        );
    }
}
