//! HTTP session provider
//!
//! Holds the signed-in session in memory and exchanges its refresh token at
//! `/auth/v1/token?grant_type=refresh_token`. The provider performs one
//! exchange per call; deduplicating concurrent refreshes is the
//! `SessionRefresher`'s job.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;
use studiolink_common::time::Clock;
use studiolink_core::SessionProvider;
use studiolink_domain::constants::AUTH_PATH_PREFIX;
use studiolink_domain::{BackendConfig, ConnectivityError, Result, Session};
use tracing::{debug, info};
use url::Url;

use crate::errors::InfraError;
use crate::http::HttpClient;

/// Token endpoint response
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_at: Option<i64>,
    #[serde(default)]
    expires_in: Option<i64>,
}

/// [`SessionProvider`] backed by the backend's auth endpoint
pub struct HttpSessionProvider {
    http: HttpClient,
    token_url: Url,
    api_key: String,
    clock: Arc<dyn Clock>,
    session: RwLock<Option<Session>>,
}

impl std::fmt::Debug for HttpSessionProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSessionProvider")
            .field("token_url", &self.token_url.as_str())
            .field("session", &*self.session.read())
            .finish_non_exhaustive()
    }
}

impl HttpSessionProvider {
    /// Create a signed-out provider
    ///
    /// # Errors
    /// Returns `ConnectivityError::Config` when `config.url` does not parse.
    pub fn new(config: &BackendConfig, http: HttpClient, clock: Arc<dyn Clock>) -> Result<Self> {
        let base = config.url.trim().trim_end_matches('/');
        let mut token_url = Url::parse(&format!("{base}{AUTH_PATH_PREFIX}/token"))
            .map_err(|e| ConnectivityError::from(InfraError::from(e)))?;
        token_url.query_pairs_mut().append_pair("grant_type", "refresh_token");

        Ok(Self {
            http,
            token_url,
            api_key: config.api_key.clone(),
            clock,
            session: RwLock::new(None),
        })
    }

    /// Replace the stored session, e.g. after sign-in
    pub fn set_session(&self, session: Session) {
        *self.session.write() = Some(session);
    }

    /// Forget the stored session; later calls run anonymously
    pub fn sign_out(&self) {
        *self.session.write() = None;
        info!("Session cleared");
    }

    pub fn is_signed_in(&self) -> bool {
        self.session.read().is_some()
    }

    fn session_from(&self, token: TokenResponse, previous_refresh: String) -> Result<Session> {
        let expires_at = match (token.expires_at, token.expires_in) {
            (Some(at), _) => at,
            (None, Some(seconds)) => {
                i64::try_from(self.clock.unix_seconds()).unwrap_or(i64::MAX).saturating_add(seconds)
            }
            (None, None) => {
                return Err(ConnectivityError::Internal(
                    "Token response carried no expiry".into(),
                ))
            }
        };

        Ok(Session::new(
            token.access_token,
            Some(token.refresh_token.unwrap_or(previous_refresh)),
            expires_at,
        ))
    }
}

#[async_trait]
impl SessionProvider for HttpSessionProvider {
    async fn current_session(&self) -> Result<Option<Session>> {
        Ok(self.session.read().clone())
    }

    async fn refresh_session(&self) -> Result<Session> {
        let refresh_token = self
            .session
            .read()
            .as_ref()
            .ok_or_else(|| ConnectivityError::InvalidInput("No session to refresh".into()))?
            .refresh_token
            .clone()
            .ok_or_else(|| ConnectivityError::InvalidInput("Session has no refresh token".into()))?;

        debug!("Exchanging refresh token");
        let builder = self
            .http
            .request(Method::POST, self.token_url.clone())
            .header("apikey", &self.api_key)
            .json(&json!({ "refresh_token": refresh_token }));

        let response = self.http.send(builder).await?;
        let token: TokenResponse =
            response.json().await.map_err(|e| ConnectivityError::from(InfraError::from(e)))?;

        let session = self.session_from(token, refresh_token.clone())?;
        let mut stored = self.session.write();
        let unchanged = stored.as_ref().and_then(|current| current.refresh_token.as_deref())
            == Some(refresh_token.as_str());
        if !unchanged {
            debug!("Session replaced or cleared during refresh, discarding result");
            return Err(ConnectivityError::InvalidInput("Session changed during refresh".into()));
        }
        *stored = Some(session.clone());
        Ok(session)
    }
}
