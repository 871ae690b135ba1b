//! Connection health tracking

pub mod monitor;
pub mod ports;
pub mod state;

pub use monitor::{ConnectionHealthMonitor, MonitorBuilder};
pub use state::{ConnectionHealth, HealthListener, Subscription};
