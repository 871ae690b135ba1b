//! Connection health snapshot

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Observable connectivity state
///
/// `consecutive_failures` resets on any success. `is_healthy` goes false
/// only once the failure threshold is reached and back to true on the next
/// success. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionState {
    pub is_healthy: bool,
    pub last_health_check_at: Option<DateTime<Utc>>,
    pub consecutive_failures: u32,
    pub refresh_in_progress: bool,
}

impl Default for ConnectionState {
    fn default() -> Self {
        Self {
            is_healthy: true,
            last_health_check_at: None,
            consecutive_failures: 0,
            refresh_in_progress: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_healthy() {
        let state = ConnectionState::default();
        assert!(state.is_healthy);
        assert_eq!(state.consecutive_failures, 0);
        assert!(state.last_health_check_at.is_none());
        assert!(!state.refresh_in_progress);
    }
}
