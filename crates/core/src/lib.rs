//! # StudioLink Core
//!
//! Connectivity policy with no I/O of its own.
//!
//! This crate contains:
//! - Port interfaces (traits) for sessions, probes, signals, and the backend
//! - The connection health state machine and its background monitor
//! - Single-flight session refreshing
//! - Credential-aware retrying and the query helpers built on it
//!
//! ## Architecture Principles
//! - Depends only on `studiolink-common` and `studiolink-domain`
//! - No HTTP or platform code; adapters live in `studiolink-infra`
//! - Time and timers are injected (`Clock`, `Scheduler`)

pub mod backend;
pub mod health;
pub mod session;

// Re-export specific items to avoid ambiguity
pub use backend::ports::BackendGateway;
pub use backend::{QueryHelpers, ResilientExecutor};
pub use health::ports::{HealthProbe, SignalSource};
pub use health::{ConnectionHealth, ConnectionHealthMonitor, HealthListener, Subscription};
pub use session::ports::SessionProvider;
pub use session::SessionRefresher;
