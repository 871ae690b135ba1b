//! # StudioLink Domain
//!
//! Data types and rules for the StudioLink connectivity layer.
//!
//! This crate contains:
//! - Session, connection-state, signal, and backend-request types
//! - `ConnectivityError` and the error classifier
//! - Configuration structures and their defaults
//! - Domain constants
//!
//! ## Architecture
//! - Depends only on the `foundation` tier of `studiolink-common`
//! - No I/O, no async runtime

pub mod classifier;
pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use classifier::{classify, is_retryable, ErrorCategory};
pub use config::*;
pub use errors::*;
pub use types::*;
