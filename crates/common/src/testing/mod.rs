//! Testing utilities and helpers
//!
//! - **[`assertions`]**: assertion macros for error messages and attempt counts
//! - **[`async_utils`]**: polling helpers for background tasks
//! - **[`scheduler`]**: [`ManualScheduler`] for firing timers on demand
//! - **[`time`]**: [`MockClock`] for controlled wall and monotonic time
//!
//! ## Usage
//!
//! ```rust
//! use std::time::Duration;
//!
//! use studiolink_common::testing::{ManualScheduler, MockClock};
//!
//! let clock = MockClock::new();
//! clock.advance(Duration::from_secs(5));
//! let scheduler = ManualScheduler::new();
//! assert_eq!(scheduler.active_count(), 0);
//! ```

pub mod assertions;
pub mod async_utils;
pub mod scheduler;
pub mod time;

pub use async_utils::poll_until;
pub use scheduler::ManualScheduler;
pub use time::MockClock;
