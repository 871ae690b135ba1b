//! Mock clock for deterministic testing
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//!
//! use studiolink_common::testing::MockClock;
//! use studiolink_common::time::Clock;
//!
//! let mock = MockClock::new();
//! let start = mock.now();
//! let epoch = mock.unix_seconds();
//! mock.advance(Duration::from_secs(5));
//! assert_eq!(mock.now().duration_since(start), Duration::from_secs(5));
//! assert_eq!(mock.unix_seconds(), epoch + 5);
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;

use crate::time::Clock;

/// Mock clock for deterministic testing
///
/// Clones share the same elapsed time, so a clock handed to a component can
/// be advanced from the test body.
#[derive(Debug, Clone)]
pub struct MockClock {
    start: Instant,
    elapsed: Arc<Mutex<Duration>>,
    base_system_time: SystemTime,
}

impl MockClock {
    /// Create a new mock clock
    ///
    /// The clock starts at the current real time but can be advanced
    /// manually without real time passing.
    pub fn new() -> Self {
        Self::at_system_time(SystemTime::now())
    }

    /// Create a mock clock whose wall clock starts at `unix_seconds`
    ///
    /// Useful when asserting against fixed session expiry timestamps.
    pub fn at_unix_seconds(unix_seconds: u64) -> Self {
        Self::at_system_time(UNIX_EPOCH + Duration::from_secs(unix_seconds))
    }

    fn at_system_time(base_system_time: SystemTime) -> Self {
        Self {
            start: Instant::now(),
            elapsed: Arc::new(Mutex::new(Duration::ZERO)),
            base_system_time,
        }
    }

    /// Advance the mock clock by a duration
    pub fn advance(&self, duration: Duration) {
        *self.elapsed.lock() += duration;
    }

    /// Set the mock clock to a specific elapsed time
    pub fn set_elapsed(&self, duration: Duration) {
        *self.elapsed.lock() = duration;
    }

    /// Get the current elapsed time
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        *self.elapsed.lock()
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MockClock {
    fn now(&self) -> Instant {
        self.start + self.elapsed()
    }

    fn system_time(&self) -> SystemTime {
        self.base_system_time + self.elapsed()
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for testing::time.
    use super::*;

    /// Validates `MockClock::advance` moves both clocks together.
    ///
    /// Assertions:
    /// - Confirms monotonic and wall clock advance by the same amount.
    #[test]
    fn test_mock_clock_advance() {
        let clock = MockClock::at_unix_seconds(1_700_000_000);
        let start = clock.now();

        clock.advance(Duration::from_secs(90));

        assert_eq!(clock.now().duration_since(start), Duration::from_secs(90));
        assert_eq!(clock.unix_seconds(), 1_700_000_090);
        assert_eq!(clock.millis_since_epoch(), 1_700_000_090_000);
    }

    /// Validates clones share elapsed time and `set_elapsed` replaces it.
    ///
    /// Assertions:
    /// - Confirms `clone.elapsed()` equals `Duration::from_secs(10)`.
    /// - Confirms `clock.elapsed()` equals `Duration::from_secs(3)` after reset.
    #[test]
    fn test_mock_clock_shared_and_set_elapsed() {
        let clock = MockClock::new();
        let clone = clock.clone();

        clock.advance(Duration::from_secs(10));
        assert_eq!(clone.elapsed(), Duration::from_secs(10));

        clone.set_elapsed(Duration::from_secs(3));
        assert_eq!(clock.elapsed(), Duration::from_secs(3));
    }
}
