//! HTTP transport and the REST adapter

pub mod client;
pub mod rest;

pub use client::{HttpClient, HttpClientBuilder};
pub use rest::RestBackendClient;
