//! Conversions from external infrastructure errors into domain errors.

use reqwest::{Error as HttpError, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use studiolink_domain::ConnectivityError;
use url::ParseError as UrlError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub ConnectivityError);

impl From<InfraError> for ConnectivityError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<ConnectivityError> for InfraError {
    fn from(value: ConnectivityError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoConnectivityError {
    fn into_connectivity(self) -> ConnectivityError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → ConnectivityError */
/* -------------------------------------------------------------------------- */

impl IntoConnectivityError for HttpError {
    fn into_connectivity(self) -> ConnectivityError {
        if self.is_timeout() {
            return ConnectivityError::Network("HTTP request timed out".into());
        }

        #[cfg(not(target_arch = "wasm32"))]
        if self.is_connect() {
            return ConnectivityError::Network(format!("HTTP connection failure: {self}"));
        }

        if let Some(status) = self.status() {
            return ConnectivityError::http(
                status.as_u16(),
                status.canonical_reason().unwrap_or("unknown status"),
            );
        }

        if self.is_decode() {
            return ConnectivityError::Internal(format!("Failed to decode response body: {self}"));
        }

        if self.is_builder() {
            return ConnectivityError::InvalidInput(format!("Invalid HTTP request: {self}"));
        }

        ConnectivityError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_connectivity())
    }
}

/* -------------------------------------------------------------------------- */
/* url::ParseError → ConnectivityError */
/* -------------------------------------------------------------------------- */

impl IntoConnectivityError for UrlError {
    fn into_connectivity(self) -> ConnectivityError {
        ConnectivityError::Config(format!("backend.url is not a valid URL: {self}"))
    }
}

impl From<UrlError> for InfraError {
    fn from(value: UrlError) -> Self {
        InfraError(value.into_connectivity())
    }
}

/* -------------------------------------------------------------------------- */
/* Backend error payloads → ConnectivityError */
/* -------------------------------------------------------------------------- */

/// Error object shapes returned by the REST and auth endpoints
///
/// REST errors carry `{code, message, details, hint}`; auth errors use
/// `{error, error_description}` or `{code, msg}` with a numeric code.
#[derive(Debug, Default, Deserialize)]
struct BackendErrorBody {
    #[serde(default)]
    code: Option<Value>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    details: Option<String>,
    #[serde(default)]
    hint: Option<String>,
}

/// Build the domain error for a non-success response body
pub fn error_from_body(status: StatusCode, body: &str) -> ConnectivityError {
    let parsed: BackendErrorBody = serde_json::from_str(body).unwrap_or_default();

    let code = match parsed.code {
        Some(Value::String(code)) => Some(code),
        Some(Value::Number(code)) => Some(code.to_string()),
        _ => parsed.error.clone(),
    };

    let mut message = parsed
        .message
        .or(parsed.msg)
        .or(parsed.error_description)
        .or(parsed.error)
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| fallback_message(status, body));

    if let Some(details) = parsed.details.filter(|d| !d.is_empty()) {
        message = format!("{message} ({details})");
    }
    if let Some(hint) = parsed.hint.filter(|h| !h.is_empty()) {
        message = format!("{message}; hint: {hint}");
    }

    ConnectivityError::Http { status: status.as_u16(), code, message }
}

/// Consume a non-success response and convert it
pub async fn error_from_response(response: Response) -> ConnectivityError {
    let status = response.status();
    match response.text().await {
        Ok(body) => error_from_body(status, &body),
        Err(err) => {
            tracing::debug!(error = %err, %status, "Failed to read error response body");
            error_from_body(status, "")
        }
    }
}

fn fallback_message(status: StatusCode, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() || body.starts_with('{') {
        return status.canonical_reason().unwrap_or("unknown status").to_string();
    }
    body.chars().take(200).collect()
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
