//! Configuration management
//!
//! Every section carries `#[serde(default)]`, so a file only needs the keys
//! it overrides:
//!
//! ```toml
//! [backend]
//! url = "https://project.example.co"
//! api_key = "anon-key"
//!
//! [retry]
//! max_attempts = 5
//! ```

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_BACKEND_URL, DEFAULT_HEALTH_PATH, DEFAULT_LOG_LEVEL, FORCE_REFRESH_INTERVAL_SECS,
    HEALTH_CHECK_INTERVAL_SECS, MAX_CONSECUTIVE_FAILURES, MIN_PROBE_GAP_SECS, PROBE_TIMEOUT_MS,
    RETRY_BASE_DELAY_MS, RETRY_MAX_ATTEMPTS, RETRY_TIMEOUT_MS, SESSION_CHECK_INTERVAL_SECS,
    SESSION_REFRESH_THRESHOLD_SECS,
};
use crate::errors::{ConnectivityError, Result};
use crate::impl_domain_label_conversions;

/// Connectivity layer configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectivityConfig {
    pub backend: BackendConfig,
    pub health: HealthConfig,
    pub session: SessionConfig,
    pub retry: RetrySettings,
    pub logging: LoggingConfig,
}

/// Backend endpoint configuration
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub url: String,
    #[serde(skip_serializing)]
    pub api_key: String,
    /// Path read by the health probe
    pub health_path: String,
}

/// Health monitor configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    pub check_interval_secs: u64,
    pub min_probe_gap_secs: u64,
    pub probe_timeout_ms: u64,
    pub max_consecutive_failures: u32,
    pub session_check_interval_secs: u64,
}

/// Session freshness configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub refresh_threshold_secs: u64,
    pub force_refresh_interval_secs: u64,
}

/// Retry policy for backend calls
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub timeout_ms: u64,
    pub base_delay_ms: u64,
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl_domain_label_conversions!(LogFormat {
    Pretty => "pretty",
    Json => "json",
});

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,
    pub format: LogFormat,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_BACKEND_URL.to_string(),
            api_key: String::new(),
            health_path: DEFAULT_HEALTH_PATH.to_string(),
        }
    }
}

impl fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendConfig")
            .field("url", &self.url)
            .field("api_key", &if self.api_key.is_empty() { "<unset>" } else { "<redacted>" })
            .field("health_path", &self.health_path)
            .finish()
    }
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            check_interval_secs: HEALTH_CHECK_INTERVAL_SECS,
            min_probe_gap_secs: MIN_PROBE_GAP_SECS,
            probe_timeout_ms: PROBE_TIMEOUT_MS,
            max_consecutive_failures: MAX_CONSECUTIVE_FAILURES,
            session_check_interval_secs: SESSION_CHECK_INTERVAL_SECS,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            refresh_threshold_secs: SESSION_REFRESH_THRESHOLD_SECS,
            force_refresh_interval_secs: FORCE_REFRESH_INTERVAL_SECS,
        }
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: RETRY_MAX_ATTEMPTS,
            timeout_ms: RETRY_TIMEOUT_MS,
            base_delay_ms: RETRY_BASE_DELAY_MS,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: DEFAULT_LOG_LEVEL.to_string(), format: LogFormat::default() }
    }
}

impl HealthConfig {
    pub const fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }

    pub const fn min_probe_gap(&self) -> Duration {
        Duration::from_secs(self.min_probe_gap_secs)
    }

    pub const fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub const fn session_check_interval(&self) -> Duration {
        Duration::from_secs(self.session_check_interval_secs)
    }
}

impl SessionConfig {
    pub const fn refresh_threshold(&self) -> Duration {
        Duration::from_secs(self.refresh_threshold_secs)
    }

    pub const fn force_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.force_refresh_interval_secs)
    }
}

impl RetrySettings {
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub const fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }
}

impl ConnectivityConfig {
    /// Check ranges that would otherwise produce a silently broken runtime
    ///
    /// # Errors
    /// Returns `ConnectivityError::Config` naming the first offending key.
    pub fn validate(&self) -> Result<()> {
        let url = self.backend.url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(invalid("backend.url", "must be an http(s) URL"));
        }
        if !self.backend.health_path.starts_with('/') {
            return Err(invalid("backend.health_path", "must start with '/'"));
        }

        let positive: [(&str, u64); 8] = [
            ("health.check_interval_secs", self.health.check_interval_secs),
            ("health.probe_timeout_ms", self.health.probe_timeout_ms),
            ("health.max_consecutive_failures", u64::from(self.health.max_consecutive_failures)),
            ("health.session_check_interval_secs", self.health.session_check_interval_secs),
            ("session.refresh_threshold_secs", self.session.refresh_threshold_secs),
            ("session.force_refresh_interval_secs", self.session.force_refresh_interval_secs),
            ("retry.max_attempts", u64::from(self.retry.max_attempts)),
            ("retry.timeout_ms", self.retry.timeout_ms),
        ];
        if let Some((key, _)) = positive.iter().find(|(_, value)| *value == 0) {
            return Err(invalid(key, "must be greater than 0"));
        }

        if self.health.min_probe_gap_secs > self.health.check_interval_secs {
            return Err(invalid(
                "health.min_probe_gap_secs",
                "must not exceed health.check_interval_secs",
            ));
        }

        Ok(())
    }
}

fn invalid(key: &str, reason: &str) -> ConnectivityError {
    ConnectivityError::Config(format!("{key} {reason}"))
}
