//! Wires the connectivity components into one running unit
//!
//! One [`HttpClient`] is shared by the session provider and the REST client.
//! The refresher, the monitor, and the query helpers all observe the same
//! [`ConnectionHealth`].

use std::sync::Arc;

use studiolink_common::time::{Clock, SystemClock};
use studiolink_core::{
    ConnectionHealth, ConnectionHealthMonitor, QueryHelpers, ResilientExecutor, SessionRefresher,
    SignalSource,
};
use studiolink_domain::{ConnectivityConfig, Result};
use tracing::info;

use crate::auth::HttpSessionProvider;
use crate::http::{HttpClient, RestBackendClient};

/// Fully wired connectivity layer
#[derive(Debug, Clone)]
pub struct ConnectivityStack {
    sessions: Arc<HttpSessionProvider>,
    backend: Arc<RestBackendClient>,
    health: ConnectionHealth,
    refresher: SessionRefresher,
    monitor: ConnectionHealthMonitor,
    queries: QueryHelpers,
}

impl ConnectivityStack {
    /// Build the stack from a validated configuration
    ///
    /// Pass a signal source to let the monitor react to online, offline,
    /// and visibility changes.
    ///
    /// # Errors
    /// Returns `ConnectivityError::Config` when the configuration is invalid
    /// or the HTTP client cannot be built.
    pub fn new(
        config: &ConnectivityConfig,
        signals: Option<Arc<dyn SignalSource>>,
    ) -> Result<Self> {
        Self::with_clock(config, signals, Arc::new(SystemClock))
    }

    /// Like [`new`](Self::new) with an explicit clock
    pub fn with_clock(
        config: &ConnectivityConfig,
        signals: Option<Arc<dyn SignalSource>>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        config.validate()?;

        let http = HttpClient::new()?;
        let sessions =
            Arc::new(HttpSessionProvider::new(&config.backend, http.clone(), Arc::clone(&clock))?);
        let backend = Arc::new(RestBackendClient::new(&config.backend, http, sessions.clone())?);

        let health = ConnectionHealth::new(config.health.max_consecutive_failures);
        let refresher = SessionRefresher::new(
            sessions.clone(),
            health.clone(),
            &config.session,
            Arc::clone(&clock),
        );

        let mut monitor = ConnectionHealthMonitor::builder(
            health.clone(),
            backend.clone(),
            refresher.clone(),
        )
        .config(config.health.clone())
        .clock(clock);
        if let Some(signals) = signals {
            monitor = monitor.signals(signals);
        }
        let monitor = monitor.build();

        let executor = ResilientExecutor::from_settings(refresher.clone(), &config.retry);
        let queries = QueryHelpers::new(backend.clone(), Arc::new(executor));

        info!(backend = %config.backend.url, "Connectivity stack ready");
        Ok(Self { sessions, backend, health, refresher, monitor, queries })
    }

    /// Start background health monitoring
    pub fn start(&self) {
        self.monitor.start();
    }

    /// Stop background monitoring and wait for its tasks
    ///
    /// # Errors
    /// Returns `ConnectivityError::Internal` when a background task does not
    /// finish in time.
    pub async fn shutdown(&self) -> Result<()> {
        self.monitor.stop().await
    }

    pub fn sessions(&self) -> &Arc<HttpSessionProvider> {
        &self.sessions
    }

    pub fn backend(&self) -> &Arc<RestBackendClient> {
        &self.backend
    }

    pub fn health(&self) -> &ConnectionHealth {
        &self.health
    }

    pub fn refresher(&self) -> &SessionRefresher {
        &self.refresher
    }

    pub fn monitor(&self) -> &ConnectionHealthMonitor {
        &self.monitor
    }

    pub fn queries(&self) -> &QueryHelpers {
        &self.queries
    }
}
