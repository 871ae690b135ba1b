//! Time utilities and abstractions
//!
//! - **[`clock`]**: wall-clock and monotonic time behind a trait
//! - **[`timer`]**: cancellable repeating timers and the [`Scheduler`] seam
//!
//! ## Usage
//!
//! ```rust
//! use std::time::Duration;
//!
//! use studiolink_common::time::{Clock, MockClock};
//!
//! let clock = MockClock::new();
//! let start = clock.now();
//! clock.advance(Duration::from_secs(5));
//! assert_eq!(clock.now().duration_since(start), Duration::from_secs(5));
//! ```

pub mod clock;
pub mod timer;

pub use clock::{Clock, SystemClock};
pub use timer::{ScheduledTask, Scheduler, TimerHandle, TokioScheduler};

pub use crate::testing::time::MockClock;
