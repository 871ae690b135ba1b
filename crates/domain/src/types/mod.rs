//! Domain types and models

pub mod connection;
pub mod request;
pub mod session;
pub mod signal;

pub use connection::ConnectionState;
pub use request::{BackendOperation, BackendRequest, Filter, FilterOp};
pub use session::Session;
pub use signal::EnvironmentSignal;
