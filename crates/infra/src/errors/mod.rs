//! Infrastructure error handling
//!
//! All conversions from transport errors and backend error payloads into
//! [`ConnectivityError`](studiolink_domain::ConnectivityError) live here.

pub mod conversions;

pub use conversions::{error_from_body, error_from_response, InfraError};
