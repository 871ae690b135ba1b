//! Clock abstraction
//!
//! Components that compare timestamps (session expiry, probe throttling)
//! read time through [`Clock`] so tests can drive it with
//! [`MockClock`](crate::testing::MockClock) instead of sleeping.

use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// Trait for time operations to enable testing
pub trait Clock: Send + Sync {
    /// Get current instant (monotonic time)
    fn now(&self) -> Instant;

    /// Get current system time (wall clock)
    fn system_time(&self) -> SystemTime;

    /// Get milliseconds since UNIX epoch
    fn millis_since_epoch(&self) -> u64 {
        let millis = self.system_time().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        u64::try_from(millis).unwrap_or(u64::MAX)
    }

    /// Get whole seconds since UNIX epoch
    ///
    /// Session expiry timestamps are expressed in this unit.
    fn unix_seconds(&self) -> i64 {
        let secs = self.system_time().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs();
        i64::try_from(secs).unwrap_or(i64::MAX)
    }
}

/// Real system clock implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn system_time(&self) -> SystemTime {
        SystemTime::now()
    }
}
