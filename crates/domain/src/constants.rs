//! Application constants
//!
//! Centralized location for the connectivity layer's named defaults. The
//! configuration types in [`crate::config`] fall back to these values.

// Health monitoring
pub const HEALTH_CHECK_INTERVAL_SECS: u64 = 60;
pub const MIN_PROBE_GAP_SECS: u64 = 10;
pub const PROBE_TIMEOUT_MS: u64 = 10_000;
pub const MAX_CONSECUTIVE_FAILURES: u32 = 3;
pub const SESSION_CHECK_INTERVAL_SECS: u64 = 60;
pub const MONITOR_STOP_TIMEOUT_SECS: u64 = 5;

// Session freshness
pub const SESSION_REFRESH_THRESHOLD_SECS: u64 = 300;
pub const FORCE_REFRESH_INTERVAL_SECS: u64 = 900;

// Retry policy
pub const RETRY_MAX_ATTEMPTS: u32 = 3;
pub const RETRY_TIMEOUT_MS: u64 = 15_000;
pub const RETRY_BASE_DELAY_MS: u64 = 1_000;

// Backend
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:54321";
pub const DEFAULT_HEALTH_PATH: &str = "/rest/v1/";
pub const REST_PATH_PREFIX: &str = "/rest/v1";
pub const AUTH_PATH_PREFIX: &str = "/auth/v1";

/// PostgREST codes for a rejected or expired JWT
pub const CREDENTIAL_EXPIRED_CODES: &[&str] = &["PGRST301", "PGRST303"];
/// Lowercase message fragments that mean the bearer credential is stale
pub const CREDENTIAL_EXPIRED_MESSAGES: &[&str] =
    &["jwt expired", "invalid jwt", "token expired", "token has expired"];

// Configuration
pub const ENV_PREFIX: &str = "STUDIOLINK_";
pub const DEFAULT_LOG_LEVEL: &str = "info";
