//! Authenticated session

use std::fmt;

use serde::{Deserialize, Serialize};

/// Bearer credential plus its expiry
///
/// Owned by the session provider; the connectivity layer only reads the
/// expiry and asks for a refresh. `Debug` output never includes tokens.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Expiry as seconds since the UNIX epoch
    pub expires_at_epoch_seconds: i64,
}

impl Session {
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: Option<String>,
        expires_at_epoch_seconds: i64,
    ) -> Self {
        Self { access_token: access_token.into(), refresh_token, expires_at_epoch_seconds }
    }

    /// Milliseconds until expiry as seen at `now_ms`; negative once expired
    pub fn expires_in_ms(&self, now_ms: u64) -> i64 {
        let now_ms = i64::try_from(now_ms).unwrap_or(i64::MAX);
        self.expires_at_epoch_seconds.saturating_mul(1000).saturating_sub(now_ms)
    }

    pub fn is_expired(&self, now_ms: u64) -> bool {
        self.expires_in_ms(now_ms) <= 0
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("expires_at_epoch_seconds", &self.expires_at_epoch_seconds)
            .finish()
    }
}
