//! Session freshness

pub mod ports;
pub mod refresher;

pub use refresher::SessionRefresher;
