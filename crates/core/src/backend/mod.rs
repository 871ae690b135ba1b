//! Backend access with retry and session freshness

pub mod executor;
pub mod ports;
pub mod query;

pub use executor::ResilientExecutor;
pub use query::QueryHelpers;
