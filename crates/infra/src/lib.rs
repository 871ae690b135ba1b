//! # StudioLink Infrastructure
//!
//! Infrastructure implementations of core connectivity ports.
//!
//! This crate contains:
//! - HTTP client and the REST backend adapter (gateway and health probe)
//! - Session storage and refresh against the auth endpoint
//! - Broadcast-backed environment signal source
//! - Configuration loading and tracing setup
//! - [`ConnectivityStack`], which wires everything together
//!
//! ## Architecture
//! - Implements traits defined in `studiolink-core`
//! - Depends on `studiolink-domain` and `studiolink-core`
//! - Contains all "impure" code (network, environment, files)

pub mod auth;
pub mod config;
pub mod errors;
pub mod http;
pub mod logging;
pub mod signals;
pub mod stack;

// Re-export commonly used items
pub use auth::HttpSessionProvider;
pub use errors::InfraError;
pub use http::{HttpClient, HttpClientBuilder, RestBackendClient};
pub use logging::init_tracing;
pub use signals::ChannelSignalSource;
pub use stack::ConnectivityStack;
