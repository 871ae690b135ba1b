//! Shared helpers for infra integration tests
//!
//! Every helper points the adapters at a `wiremock` server and keeps retry
//! and probe timing short so tests run on the real clock.

use std::sync::Arc;

use serde_json::json;
use studiolink_common::time::SystemClock;
use studiolink_domain::{BackendConfig, ConnectivityConfig, Session};
use studiolink_infra::{HttpClient, HttpSessionProvider, RestBackendClient};
use wiremock::MockServer;

pub const API_KEY: &str = "anon-test-key";

/// Backend settings targeting `server`
pub fn backend_config(server: &MockServer) -> BackendConfig {
    BackendConfig {
        url: server.uri(),
        api_key: API_KEY.to_string(),
        health_path: "/rest/v1/".to_string(),
    }
}

/// Full configuration targeting `server` with millisecond-scale retries and
/// no probe throttle
pub fn fast_config(server: &MockServer) -> ConnectivityConfig {
    let mut config = ConnectivityConfig::default();
    config.backend = backend_config(server);
    config.health.min_probe_gap_secs = 0;
    config.health.probe_timeout_ms = 2_000;
    config.retry.max_attempts = 3;
    config.retry.timeout_ms = 2_000;
    config.retry.base_delay_ms = 10;
    config
}

pub fn unix_now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Signed-in session expiring `secs` from now
pub fn session_expiring_in(secs: i64) -> Session {
    Session::new("user-access-token", Some("user-refresh-token".into()), unix_now() + secs)
}

/// Body the auth endpoint returns for a successful refresh
pub fn token_body(access_token: &str) -> serde_json::Value {
    json!({
        "access_token": access_token,
        "refresh_token": "rotated-refresh-token",
        "expires_in": 3600,
        "token_type": "bearer"
    })
}

/// Session provider and REST client sharing one HTTP client
pub fn adapters(server: &MockServer) -> (Arc<HttpSessionProvider>, RestBackendClient) {
    let config = backend_config(server);
    let http = HttpClient::new().expect("http client should build");
    let sessions = Arc::new(
        HttpSessionProvider::new(&config, http.clone(), Arc::new(SystemClock))
            .expect("session provider should build"),
    );
    let rest = RestBackendClient::new(&config, http, sessions.clone())
        .expect("rest client should build");
    (sessions, rest)
}
