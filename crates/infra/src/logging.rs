//! Tracing subscriber setup
//!
//! `RUST_LOG` wins when set; otherwise the configured level applies to this
//! workspace's crates and `warn` to everything else so HTTP internals stay
//! quiet.

use studiolink_domain::{ConnectivityError, LogFormat, LoggingConfig, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

const WORKSPACE_TARGETS: &[&str] =
    &["studiolink_common", "studiolink_domain", "studiolink_core", "studiolink_infra"];

/// Default filter directive for `level`
pub fn default_directive(level: &str) -> String {
    let level = level.trim();
    let mut directive = String::from("warn");
    for target in WORKSPACE_TARGETS {
        directive.push_str(&format!(",{target}={level}"));
    }
    directive
}

/// Install the global subscriber
///
/// # Errors
/// Returns `ConnectivityError::Config` when the level is not a valid filter
/// directive, and `ConnectivityError::Internal` when a global subscriber is
/// already installed.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_directive(&config.level)).map_err(|e| {
            ConnectivityError::Config(format!("logging.level is not a valid filter: {e}"))
        })?,
    };

    let registry = tracing_subscriber::registry().with(filter);
    let installed = match config.format {
        LogFormat::Pretty => registry
            .with(fmt::layer().with_target(true).with_level(true).compact())
            .try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_current_span(true).with_span_list(false))
            .try_init(),
    };

    installed.map_err(|e| ConnectivityError::Internal(format!("Tracing already initialised: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive_scopes_level_to_workspace() {
        let directive = default_directive(" debug ");

        assert!(directive.starts_with("warn,"));
        assert!(directive.contains("studiolink_core=debug"));
        assert!(directive.contains("studiolink_infra=debug"));
    }

    #[test]
    fn test_second_init_is_rejected() {
        let config = LoggingConfig { level: "info".into(), format: LogFormat::Json };

        let first = init_tracing(&config);
        let second = init_tracing(&config);

        // Another test binary thread may have won the first install.
        assert!(first.is_ok() || matches!(first, Err(ConnectivityError::Internal(_))));
        assert!(matches!(second, Err(ConnectivityError::Internal(_))));
    }
}
