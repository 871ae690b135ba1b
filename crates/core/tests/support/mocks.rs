//! Scripted port implementations
//!
//! Each mock records how it was called and replays a script of results, so
//! tests assert on call counts instead of timing.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use studiolink_core::{BackendGateway, HealthProbe, SessionProvider, SignalSource};
use studiolink_domain::{BackendRequest, ConnectivityError, EnvironmentSignal, Result, Session};

/// In-memory session store with a counting refresh endpoint.
#[derive(Default)]
pub struct MockSessionProvider {
    session: Mutex<Option<Session>>,
    refreshed: Mutex<Option<Session>>,
    refresh_delay: Option<Duration>,
    fail_refresh: bool,
    refresh_calls: AtomicU32,
}

impl MockSessionProvider {
    /// Provider with no session (anonymous access).
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_session(session: Session) -> Self {
        Self { session: Mutex::new(Some(session)), ..Self::default() }
    }

    /// Session handed out by successful refreshes.
    pub fn refreshing_to(mut self, session: Session) -> Self {
        self.refreshed = Mutex::new(Some(session));
        self
    }

    /// Make every refresh take `delay` before completing.
    pub fn with_refresh_delay(mut self, delay: Duration) -> Self {
        self.refresh_delay = Some(delay);
        self
    }

    pub fn failing_refresh(mut self) -> Self {
        self.fail_refresh = true;
        self
    }

    pub fn refresh_calls(&self) -> u32 {
        self.refresh_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionProvider for MockSessionProvider {
    async fn current_session(&self) -> Result<Option<Session>> {
        Ok(self.session.lock().clone())
    }

    async fn refresh_session(&self) -> Result<Session> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.refresh_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_refresh {
            return Err(ConnectivityError::http(400, "Invalid Refresh Token"));
        }

        let current = self.session.lock().clone();
        let next = self
            .refreshed
            .lock()
            .clone()
            .or(current)
            .ok_or_else(|| ConnectivityError::Internal("no session to refresh".into()))?;
        *self.session.lock() = Some(next.clone());
        Ok(next)
    }
}

/// Health probe that replays scripted outcomes, then repeats the fallback.
pub struct MockProbe {
    script: Mutex<VecDeque<Result<()>>>,
    fallback_healthy: bool,
    delay: Option<Duration>,
    calls: AtomicU32,
}

impl MockProbe {
    pub fn healthy() -> Self {
        Self {
            script: Mutex::default(),
            fallback_healthy: true,
            delay: None,
            calls: AtomicU32::new(0),
        }
    }

    pub fn unreachable() -> Self {
        Self { fallback_healthy: false, ..Self::healthy() }
    }

    /// Probe that never answers within `delay`.
    pub fn hanging(delay: Duration) -> Self {
        Self { delay: Some(delay), ..Self::healthy() }
    }

    /// Queue outcomes returned before the fallback applies.
    pub fn then(self, outcome: Result<()>) -> Self {
        self.script.lock().push_back(outcome);
        self
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HealthProbe for MockProbe {
    async fn probe(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(outcome) = self.script.lock().pop_front() {
            return outcome;
        }
        if self.fallback_healthy {
            Ok(())
        } else {
            Err(ConnectivityError::Network("connection refused".into()))
        }
    }
}

/// Gateway that replays scripted responses and records every request.
#[derive(Default)]
pub struct MockGateway {
    responses: Mutex<VecDeque<Result<Value>>>,
    requests: Mutex<Vec<BackendRequest>>,
}

impl MockGateway {
    pub fn new(responses: impl IntoIterator<Item = Result<Value>>) -> Self {
        Self { responses: Mutex::new(responses.into_iter().collect()), ..Self::default() }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn requests(&self) -> Vec<BackendRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl BackendGateway for MockGateway {
    async fn execute(&self, request: &BackendRequest) -> Result<Value> {
        self.requests.lock().push(request.clone());
        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(ConnectivityError::Internal("no scripted response".into())))
    }
}

/// Health listener that records every notification it receives.
#[derive(Clone, Default)]
pub struct RecordingListener {
    seen: Arc<Mutex<Vec<bool>>>,
}

impl RecordingListener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Callback to hand to `add_listener`.
    pub fn callback(&self) -> impl Fn(bool) + Send + Sync + 'static {
        let seen = Arc::clone(&self.seen);
        move |healthy| seen.lock().push(healthy)
    }

    pub fn seen(&self) -> Vec<bool> {
        self.seen.lock().clone()
    }
}

/// Signal source backed by a broadcast channel the test sends into.
pub struct MockSignals {
    sender: tokio::sync::broadcast::Sender<EnvironmentSignal>,
}

impl Default for MockSignals {
    fn default() -> Self {
        let (sender, _) = tokio::sync::broadcast::channel(16);
        Self { sender }
    }
}

impl MockSignals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `signal` to every subscriber; returns how many received it.
    pub fn emit(&self, signal: EnvironmentSignal) -> usize {
        self.sender.send(signal).unwrap_or(0)
    }
}

impl SignalSource for MockSignals {
    fn subscribe(&self) -> tokio::sync::broadcast::Receiver<EnvironmentSignal> {
        self.sender.subscribe()
    }
}
