//! Integration tests for the REST adapter and the session provider
//!
//! **Coverage:**
//! - Request shape: method, path, filters, `apikey` and bearer headers
//! - Error bodies: PostgREST codes survive into `ConnectivityError::Http`
//! - Health probe: reachable below 500, unreachable at 5xx or refused
//! - Refresh-token exchange against the auth endpoint
//!
//! **Infrastructure:**
//! - WireMock HTTP server standing in for the backend

#![allow(dead_code)]

#[path = "support.rs"]
mod support;

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use studiolink_common::testing::poll_until;
use studiolink_common::time::SystemClock;
use studiolink_core::{BackendGateway, HealthProbe, SessionProvider};
use studiolink_domain::{
    BackendConfig, BackendRequest, ConnectivityError, ErrorCategory, FilterOp,
};
use studiolink_infra::{HttpClient, HttpSessionProvider, RestBackendClient};
use support::{adapters, session_expiring_in, token_body, API_KEY};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// Request shape
// ============================================================================

#[tokio::test]
async fn test_anonymous_select_sends_project_key_as_bearer() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/generations"))
        .and(query_param("select", "id,status"))
        .and(query_param("status", "neq.failed"))
        .and(query_param("limit", "20"))
        .and(header("apikey", API_KEY))
        .and(header("authorization", format!("Bearer {API_KEY}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": "g-1" }])))
        .expect(1)
        .mount(&server)
        .await;

    let (_sessions, rest) = adapters(&server);
    let request = BackendRequest::select("generations")
        .columns("id,status")
        .filter("status", FilterOp::Neq, "failed")
        .limit(20);

    let rows = rest.execute(&request).await.expect("select should succeed");

    assert_eq!(rows, json!([{ "id": "g-1" }]));
}

#[tokio::test]
async fn test_signed_in_insert_uses_session_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/projects"))
        .and(header("authorization", "Bearer user-access-token"))
        .and(header("prefer", "return=representation"))
        .and(body_json(json!({ "name": "Poster" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([{ "id": "p-1" }])))
        .expect(1)
        .mount(&server)
        .await;

    let (sessions, rest) = adapters(&server);
    sessions.set_session(session_expiring_in(3600));

    let created = rest
        .execute(&BackendRequest::insert("projects", json!({ "name": "Poster" })))
        .await
        .expect("insert should succeed");

    assert_eq!(created[0]["id"], "p-1");
}

#[tokio::test]
async fn test_rpc_and_empty_delete_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/consume_credits"))
        .and(body_json(json!({ "amount": 2 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "remaining": 48 })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/drafts"))
        .and(query_param("id", "eq.d-9"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let (_sessions, rest) = adapters(&server);

    let remaining = rest
        .execute(&BackendRequest::rpc("consume_credits", json!({ "amount": 2 })))
        .await
        .unwrap();
    let deleted = rest.execute(&BackendRequest::delete("drafts").eq("id", "d-9")).await.unwrap();

    assert_eq!(remaining["remaining"], 48);
    assert_eq!(deleted, serde_json::Value::Null);
}

// ============================================================================
// Error bodies
// ============================================================================

#[tokio::test]
async fn test_expired_jwt_body_classifies_as_credential_expired() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/assets"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "code": "PGRST301",
            "message": "JWT expired"
        })))
        .mount(&server)
        .await;

    let (_sessions, rest) = adapters(&server);

    let error = rest.execute(&BackendRequest::select("assets")).await.unwrap_err();

    assert!(matches!(
        error,
        ConnectivityError::Http { status: 401, code: Some(ref code), .. } if code == "PGRST301"
    ));
    assert_eq!(error.category(), ErrorCategory::CredentialExpired);
}

#[tokio::test]
async fn test_server_and_client_errors_classify_differently() {
    let server = MockServer::start().await;
    Mock::given(path("/rest/v1/busy"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
        .mount(&server)
        .await;
    Mock::given(path("/rest/v1/locked"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "code": "42501",
            "message": "permission denied for table locked"
        })))
        .mount(&server)
        .await;

    let (_sessions, rest) = adapters(&server);

    let busy = rest.execute(&BackendRequest::select("busy")).await.unwrap_err();
    let locked = rest.execute(&BackendRequest::select("locked")).await.unwrap_err();

    assert_eq!(busy.category(), ErrorCategory::TransientServer);
    assert_eq!(locked.category(), ErrorCategory::FatalClient);
    assert!(locked.to_string().contains("permission denied"));
}

// ============================================================================
// Health probe
// ============================================================================

#[tokio::test]
async fn test_probe_treats_client_errors_as_reachable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let (_sessions, rest) = adapters(&server);

    assert!(rest.probe().await.is_ok());
}

#[tokio::test]
async fn test_probe_fails_on_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let (_sessions, rest) = adapters(&server);

    let error = rest.probe().await.unwrap_err();
    assert_eq!(error.status(), Some(502));
}

#[tokio::test]
async fn test_probe_fails_when_backend_is_down() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let config = BackendConfig { url: format!("http://127.0.0.1:{port}"), ..Default::default() };
    let http = HttpClient::new().unwrap();
    let sessions =
        Arc::new(HttpSessionProvider::new(&config, http.clone(), Arc::new(SystemClock)).unwrap());
    let rest = RestBackendClient::new(&config, http, sessions).unwrap();

    let error = rest.probe().await.unwrap_err();

    assert_eq!(error.category(), ErrorCategory::TransientNetwork);
}

// ============================================================================
// Session provider
// ============================================================================

#[tokio::test]
async fn test_refresh_exchanges_token_and_stores_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "refresh_token"))
        .and(header("apikey", API_KEY))
        .and(body_json(json!({ "refresh_token": "user-refresh-token" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("renewed-token")))
        .expect(1)
        .mount(&server)
        .await;

    let (sessions, _rest) = adapters(&server);
    sessions.set_session(session_expiring_in(30));

    let refreshed = sessions.refresh_session().await.expect("refresh should succeed");
    let current = sessions.current_session().await.unwrap().expect("session stored");

    assert_eq!(refreshed.access_token, "renewed-token");
    assert_eq!(current.refresh_token.as_deref(), Some("rotated-refresh-token"));
    assert!(current.expires_at_epoch_seconds >= support::unix_now() + 3500);
}

#[tokio::test]
async fn test_rejected_refresh_keeps_previous_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Invalid Refresh Token: Already Used"
        })))
        .mount(&server)
        .await;

    let (sessions, _rest) = adapters(&server);
    sessions.set_session(session_expiring_in(30));

    let error = sessions.refresh_session().await.unwrap_err();
    let current = sessions.current_session().await.unwrap().unwrap();

    assert_eq!(error.status(), Some(400));
    assert_eq!(current.access_token, "user-access-token");
}

#[tokio::test]
async fn test_sign_out_during_refresh_is_not_undone() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(token_body("renewed-token"))
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (sessions, _rest) = adapters(&server);
    sessions.set_session(session_expiring_in(30));

    let refresh = tokio::spawn({
        let sessions = Arc::clone(&sessions);
        async move { sessions.refresh_session().await }
    });
    let requests = poll_until(Duration::from_secs(2), Duration::from_millis(10), || {
        let server = &server;
        async move { !server.received_requests().await.unwrap_or_default().is_empty() }
    })
    .await;
    assert!(requests, "refresh request should reach the auth endpoint");
    sessions.sign_out();

    let outcome = refresh.await.expect("refresh task should not panic");

    assert!(matches!(outcome, Err(ConnectivityError::InvalidInput(_))));
    assert!(sessions.current_session().await.unwrap().is_none());
    assert!(!sessions.is_signed_in());
}

#[tokio::test]
async fn test_refresh_without_session_is_invalid_input() {
    let server = MockServer::start().await;
    let (sessions, _rest) = adapters(&server);

    let error = sessions.refresh_session().await.unwrap_err();

    assert!(matches!(error, ConnectivityError::InvalidInput(_)));
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}
