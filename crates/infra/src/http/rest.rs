//! REST adapter for the backend's PostgREST-style API
//!
//! Implements [`BackendGateway`] and [`HealthProbe`] over [`HttpClient`].
//! Every request carries the project key in `apikey` and the caller's bearer
//! credential in `Authorization`; anonymous callers present the project key
//! as the bearer.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder};
use serde_json::Value;
use studiolink_core::{BackendGateway, HealthProbe, SessionProvider};
use studiolink_domain::constants::REST_PATH_PREFIX;
use studiolink_domain::{BackendConfig, BackendOperation, BackendRequest, ConnectivityError, Result};
use tracing::{debug, instrument};
use url::Url;

use super::client::HttpClient;
use crate::errors::{error_from_response, InfraError};

const API_KEY_HEADER: &str = "apikey";
const PREFER_HEADER: &str = "Prefer";
const RETURN_REPRESENTATION: &str = "return=representation";

/// Backend gateway and reachability probe over HTTP
pub struct RestBackendClient {
    http: HttpClient,
    base_url: Url,
    api_key: String,
    health_path: String,
    sessions: Arc<dyn SessionProvider>,
}

impl std::fmt::Debug for RestBackendClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestBackendClient")
            .field("base_url", &self.base_url.as_str())
            .field("health_path", &self.health_path)
            .finish_non_exhaustive()
    }
}

impl RestBackendClient {
    /// Create a client for the backend described by `config`
    ///
    /// # Errors
    /// Returns `ConnectivityError::Config` when `config.url` does not parse.
    pub fn new(
        config: &BackendConfig,
        http: HttpClient,
        sessions: Arc<dyn SessionProvider>,
    ) -> Result<Self> {
        let base_url = Url::parse(config.url.trim())
            .map_err(|e| ConnectivityError::from(InfraError::from(e)))?;

        Ok(Self {
            http,
            base_url,
            api_key: config.api_key.clone(),
            health_path: config.health_path.clone(),
            sessions,
        })
    }

    /// Resolve `path` (absolute, e.g. `/rest/v1/items`) against the base URL
    /// while keeping any path prefix the base URL carries
    fn url(&self, path: &str) -> Result<Url> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Url::parse(&format!("{base}{path}")).map_err(|e| InfraError::from(e).into())
    }

    fn endpoint(&self, request: &BackendRequest) -> Result<Url> {
        let path = match request.operation {
            BackendOperation::Rpc => format!("{REST_PATH_PREFIX}/rpc/{}", request.target),
            _ => format!("{REST_PATH_PREFIX}/{}", request.target),
        };
        let mut url = self.url(&path)?;

        {
            let mut query = url.query_pairs_mut();
            if let Some(columns) = &request.columns {
                query.append_pair("select", columns);
            }
            for filter in &request.filters {
                query.append_pair(&filter.column, &format!("{}.{}", filter.op, filter.value));
            }
            if let Some(limit) = request.limit {
                query.append_pair("limit", &limit.to_string());
            }
        }
        if url.query() == Some("") {
            url.set_query(None);
        }

        Ok(url)
    }

    async fn authorize(&self, builder: RequestBuilder) -> Result<RequestBuilder> {
        let bearer = match self.sessions.current_session().await? {
            Some(session) => session.access_token,
            None => self.api_key.clone(),
        };

        let mut builder = builder.header(API_KEY_HEADER, &self.api_key);
        if !bearer.is_empty() {
            let value = HeaderValue::from_str(&format!("Bearer {bearer}")).map_err(|_| {
                ConnectivityError::InvalidInput("bearer credential is not a valid header".into())
            })?;
            builder = builder.header(AUTHORIZATION, value);
        }
        Ok(builder)
    }
}

#[async_trait]
impl BackendGateway for RestBackendClient {
    #[instrument(skip(self, request), fields(op = %request.label()))]
    async fn execute(&self, request: &BackendRequest) -> Result<Value> {
        let url = self.endpoint(request)?;
        let method = match request.operation {
            BackendOperation::Select => Method::GET,
            BackendOperation::Insert | BackendOperation::Rpc => Method::POST,
            BackendOperation::Update => Method::PATCH,
            BackendOperation::Delete => Method::DELETE,
        };

        let mut builder = self.http.request(method, url);
        if let Some(body) = &request.body {
            builder = builder.header(CONTENT_TYPE, "application/json").json(body);
        }
        if matches!(
            request.operation,
            BackendOperation::Insert | BackendOperation::Update | BackendOperation::Delete
        ) {
            builder = builder.header(PREFER_HEADER, RETURN_REPRESENTATION);
        }

        let response = self.http.send(self.authorize(builder).await?).await?;
        let body =
            response.text().await.map_err(|e| ConnectivityError::from(InfraError::from(e)))?;
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&body).map_err(|e| {
            ConnectivityError::Internal(format!("Invalid JSON from {}: {e}", request.label()))
        })
    }
}

#[async_trait]
impl HealthProbe for RestBackendClient {
    /// Reachable means any response below 500
    async fn probe(&self) -> Result<()> {
        let url = self.url(&self.health_path)?;
        let builder = self.authorize(self.http.request(Method::GET, url)).await?;
        let response = self.http.send_raw(builder).await?;

        let status = response.status();
        if status.is_server_error() {
            return Err(error_from_response(response).await);
        }

        debug!(%status, "Backend reachable");
        Ok(())
    }
}
