//! Configuration loader
//!
//! Loads [`ConnectivityConfig`] from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If `STUDIOLINK_BACKEND_URL` is not set, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//! 5. Validates the result either way
//!
//! Every section is optional in files; omitted keys keep their defaults.
//!
//! ## Environment Variables
//! - `STUDIOLINK_BACKEND_URL`: Backend base URL (required for env loading)
//! - `STUDIOLINK_BACKEND_API_KEY`: Project API key
//! - `STUDIOLINK_BACKEND_HEALTH_PATH`: Path probed for reachability
//! - `STUDIOLINK_HEALTH_CHECK_INTERVAL_SECS`: Probe cadence
//! - `STUDIOLINK_HEALTH_MIN_PROBE_GAP_SECS`: Minimum gap between probes
//! - `STUDIOLINK_HEALTH_PROBE_TIMEOUT_MS`: Probe deadline
//! - `STUDIOLINK_HEALTH_MAX_CONSECUTIVE_FAILURES`: Failures before unhealthy
//! - `STUDIOLINK_HEALTH_SESSION_CHECK_INTERVAL_SECS`: Session check cadence
//! - `STUDIOLINK_SESSION_REFRESH_THRESHOLD_SECS`: Refresh when expiring sooner
//! - `STUDIOLINK_SESSION_FORCE_REFRESH_INTERVAL_SECS`: Periodic refresh
//! - `STUDIOLINK_RETRY_MAX_ATTEMPTS`: Attempts per call
//! - `STUDIOLINK_RETRY_TIMEOUT_MS`: Per-attempt deadline
//! - `STUDIOLINK_RETRY_BASE_DELAY_MS`: Linear backoff base
//! - `STUDIOLINK_LOG_LEVEL`: Default log filter (`RUST_LOG` wins)
//! - `STUDIOLINK_LOG_FORMAT`: `pretty` or `json`
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./config.json` or `./config.toml` (current working directory)
//! 2. `./studiolink.json` or `./studiolink.toml` (current working directory)
//! 3. `../config.json` or `../config.toml` (parent directory)
//! 4. `../../config.json` or `../../config.toml` (grandparent directory)
//! 5. Relative to executable location

use std::path::{Path, PathBuf};
use std::str::FromStr;

use studiolink_domain::constants::ENV_PREFIX;
use studiolink_domain::{ConnectivityConfig, ConnectivityError, Result};

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If the backend URL is
/// not set there, falls back to a config file.
///
/// # Errors
/// Returns `ConnectivityError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - A value is out of range
pub fn load() -> Result<ConnectivityConfig> {
    let config = match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            config
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)?
        }
    };

    config.validate()?;
    Ok(config)
}

/// Load configuration from environment variables
///
/// `STUDIOLINK_BACKEND_URL` must be present; every other variable is
/// optional and overrides the default when set.
///
/// # Errors
/// Returns `ConnectivityError::Config` if the backend URL is missing or a
/// variable has an invalid value.
pub fn load_from_env() -> Result<ConnectivityConfig> {
    let mut config = ConnectivityConfig::default();

    config.backend.url = env_var("BACKEND_URL")?;
    env_override("BACKEND_API_KEY", &mut config.backend.api_key)?;
    env_override("BACKEND_HEALTH_PATH", &mut config.backend.health_path)?;

    let health = &mut config.health;
    env_override("HEALTH_CHECK_INTERVAL_SECS", &mut health.check_interval_secs)?;
    env_override("HEALTH_MIN_PROBE_GAP_SECS", &mut health.min_probe_gap_secs)?;
    env_override("HEALTH_PROBE_TIMEOUT_MS", &mut health.probe_timeout_ms)?;
    env_override("HEALTH_MAX_CONSECUTIVE_FAILURES", &mut health.max_consecutive_failures)?;
    env_override("HEALTH_SESSION_CHECK_INTERVAL_SECS", &mut health.session_check_interval_secs)?;

    let session = &mut config.session;
    env_override("SESSION_REFRESH_THRESHOLD_SECS", &mut session.refresh_threshold_secs)?;
    env_override("SESSION_FORCE_REFRESH_INTERVAL_SECS", &mut session.force_refresh_interval_secs)?;

    let retry = &mut config.retry;
    env_override("RETRY_MAX_ATTEMPTS", &mut retry.max_attempts)?;
    env_override("RETRY_TIMEOUT_MS", &mut retry.timeout_ms)?;
    env_override("RETRY_BASE_DELAY_MS", &mut retry.base_delay_ms)?;

    env_override("LOG_LEVEL", &mut config.logging.level)?;
    env_override("LOG_FORMAT", &mut config.logging.format)?;

    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `ConnectivityError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<ConnectivityConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(ConnectivityError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            ConnectivityError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| ConnectivityError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
///
/// # Errors
/// Returns `ConnectivityError::Config` if format is invalid or parsing fails.
pub fn parse_config(contents: &str, path: &Path) -> Result<ConnectivityConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| ConnectivityError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| ConnectivityError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(ConnectivityError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(candidates_in(&cwd));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(candidates_in(exe_dir));
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

fn candidates_in(dir: &Path) -> Vec<PathBuf> {
    vec![
        dir.join("config.json"),
        dir.join("config.toml"),
        dir.join("studiolink.json"),
        dir.join("studiolink.toml"),
        dir.join("../config.json"),
        dir.join("../config.toml"),
        dir.join("../../config.json"),
        dir.join("../../config.toml"),
    ]
}

fn env_key(suffix: &str) -> String {
    format!("{ENV_PREFIX}{suffix}")
}

/// Get required environment variable
///
/// # Errors
/// Returns `ConnectivityError::Config` if the variable is not set.
fn env_var(suffix: &str) -> Result<String> {
    let key = env_key(suffix);
    std::env::var(&key).map_err(|_| {
        ConnectivityError::Config(format!("Missing required environment variable: {key}"))
    })
}

/// Overwrite `target` with the parsed variable when it is set
fn env_override<T>(suffix: &str, target: &mut T) -> Result<()>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let key = env_key(suffix);
    let Ok(raw) = std::env::var(&key) else {
        return Ok(());
    };

    *target = raw
        .trim()
        .parse::<T>()
        .map_err(|e| ConnectivityError::Config(format!("Invalid value for {key}: {e}")))?;
    Ok(())
}
