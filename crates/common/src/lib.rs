//! Shared building blocks for StudioLink crates.
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - `foundation`: error classification vocabulary
//! - `observability`: tracing for everything that logs
//! - `runtime`: async infrastructure (clock, timers, retry executor)
//! - `test-utils`: mock clock, manual scheduler, assertion macros

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Foundation tier
// -----------------------------------------------------------------
#[cfg(feature = "foundation")]
pub mod error;

// Runtime tier
// --------------------------------------------------------------------
#[cfg(feature = "runtime")]
pub mod resilience;
#[cfg(feature = "runtime")]
pub mod time;

// Testing utilities
// ---------------------------------------------------------------
#[cfg(any(feature = "runtime", feature = "test-utils", test))]
pub mod testing;

// Re-export commonly used types and traits for convenience
// ------------------------
#[cfg(feature = "foundation")]
pub use error::{ErrorClassification, ErrorSeverity, FromTimeout};
#[cfg(feature = "runtime")]
pub use resilience::{
    retry, BackoffStrategy, RetryConfig, RetryConfigBuilder, RetryDecision,
    RetryExecutor, RetryOutcome, RetryPolicy,
};
#[cfg(feature = "runtime")]
pub use time::{Clock, ScheduledTask, Scheduler, SystemClock, TimerHandle, TokioScheduler};
