//! Session storage and credential refresh against the auth endpoint

pub mod session_provider;

pub use session_provider::HttpSessionProvider;
