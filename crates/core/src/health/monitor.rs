//! Connection health monitoring with explicit lifecycle
//!
//! The monitor drives [`ConnectionHealth`] from three inputs:
//! - a periodic reachability probe, throttled so two probes never run closer
//!   together than the minimum gap, and raced against the probe timeout
//! - a periodic non-forced session freshness check
//! - platform signals (online, offline, visible, hidden)
//!
//! # Architecture
//!
//! - `ConnectionHealthMonitor`: lifecycle coordinator (owns timers and the
//!   signal task)
//! - `MonitorInner::check_now` / `handle_signal`: the work itself, reachable
//!   directly for tests and for callers that want an on-demand probe
//! - Timers come from an injected [`Scheduler`] and hold only a weak
//!   reference back to the monitor
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use studiolink_common::time::SystemClock;
//! use studiolink_core::{
//!     ConnectionHealth, ConnectionHealthMonitor, HealthProbe, SessionProvider, SessionRefresher,
//! };
//! use studiolink_domain::{ConnectivityConfig, Result};
//!
//! # async fn example(
//! #     probe: Arc<dyn HealthProbe>,
//! #     provider: Arc<dyn SessionProvider>,
//! # ) -> Result<()> {
//! let config = ConnectivityConfig::default();
//! let health = ConnectionHealth::new(config.health.max_consecutive_failures);
//! let refresher =
//!     SessionRefresher::new(provider, health.clone(), &config.session, Arc::new(SystemClock));
//! let monitor = ConnectionHealthMonitor::builder(health, probe, refresher)
//!     .config(config.health.clone())
//!     .build();
//!
//! monitor.start();
//! let _subscription = monitor.add_listener(|healthy| tracing::info!(healthy, "health changed"));
//!
//! // ... do work ...
//!
//! monitor.stop().await?;
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use futures::FutureExt;
use parking_lot::Mutex;
use studiolink_common::time::{
    Clock, ScheduledTask, Scheduler, SystemClock, TimerHandle, TokioScheduler,
};
use studiolink_domain::constants::MONITOR_STOP_TIMEOUT_SECS;
use studiolink_domain::{
    ConnectionState, ConnectivityError, EnvironmentSignal, HealthConfig, Result,
};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use super::ports::{HealthProbe, SignalSource};
use super::state::{ConnectionHealth, Subscription};
use crate::session::SessionRefresher;

struct Running {
    timers: Vec<TimerHandle>,
    cancellation: CancellationToken,
    signal_task: Option<JoinHandle<()>>,
}

struct MonitorInner {
    health: ConnectionHealth,
    probe: Arc<dyn HealthProbe>,
    refresher: SessionRefresher,
    signals: Option<Arc<dyn SignalSource>>,
    scheduler: Arc<dyn Scheduler>,
    clock: Arc<dyn Clock>,
    config: HealthConfig,
    last_probe: Mutex<Option<Instant>>,
    running: Mutex<Option<Running>>,
}

/// Background connection health monitor
///
/// Owned by the composition root: construct once, `start()` it, and
/// `stop()` it on shutdown. Cloning shares the same monitor.
#[derive(Clone)]
pub struct ConnectionHealthMonitor {
    inner: Arc<MonitorInner>,
}

impl fmt::Debug for ConnectionHealthMonitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionHealthMonitor")
            .field("running", &self.is_running())
            .field("state", &self.snapshot())
            .field("config", &self.inner.config)
            .finish()
    }
}

/// Builder for [`ConnectionHealthMonitor`]
pub struct MonitorBuilder {
    health: ConnectionHealth,
    probe: Arc<dyn HealthProbe>,
    refresher: SessionRefresher,
    signals: Option<Arc<dyn SignalSource>>,
    scheduler: Arc<dyn Scheduler>,
    clock: Arc<dyn Clock>,
    config: HealthConfig,
}

impl MonitorBuilder {
    #[must_use]
    pub fn config(mut self, config: HealthConfig) -> Self {
        self.config = config;
        self
    }

    /// Listen to platform signals while running
    #[must_use]
    pub fn signals(mut self, signals: Arc<dyn SignalSource>) -> Self {
        self.signals = Some(signals);
        self
    }

    #[must_use]
    pub fn scheduler(mut self, scheduler: Arc<dyn Scheduler>) -> Self {
        self.scheduler = scheduler;
        self
    }

    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn build(self) -> ConnectionHealthMonitor {
        ConnectionHealthMonitor {
            inner: Arc::new(MonitorInner {
                health: self.health,
                probe: self.probe,
                refresher: self.refresher,
                signals: self.signals,
                scheduler: self.scheduler,
                clock: self.clock,
                config: self.config,
                last_probe: Mutex::new(None),
                running: Mutex::new(None),
            }),
        }
    }
}

impl ConnectionHealthMonitor {
    /// Start building a monitor with default timing, the Tokio scheduler,
    /// the system clock, and no signal source
    pub fn builder(
        health: ConnectionHealth,
        probe: Arc<dyn HealthProbe>,
        refresher: SessionRefresher,
    ) -> MonitorBuilder {
        MonitorBuilder {
            health,
            probe,
            refresher,
            signals: None,
            scheduler: Arc::new(TokioScheduler),
            clock: Arc::new(SystemClock),
            config: HealthConfig::default(),
        }
    }

    /// Start background monitoring
    ///
    /// Schedules the periodic probe and session check and, when a signal
    /// source is configured, spawns the signal listener. Calling `start` on
    /// a running monitor does nothing. Must be called within a Tokio runtime.
    pub fn start(&self) {
        let mut running = self.inner.running.lock();
        if running.is_some() {
            debug!("Connection health monitor already running");
            return;
        }

        let config = &self.inner.config;
        info!(
            check_interval_secs = config.check_interval_secs,
            session_check_interval_secs = config.session_check_interval_secs,
            signals = self.inner.signals.is_some(),
            "Starting connection health monitor"
        );

        let weak = Arc::downgrade(&self.inner);
        let probe_timer = self.inner.scheduler.schedule_repeating(
            config.check_interval(),
            weak_task(&weak, |inner| {
                async move {
                    inner.check_now().await;
                }
                .boxed()
            }),
        );
        let session_timer = self.inner.scheduler.schedule_repeating(
            config.session_check_interval(),
            weak_task(&weak, |inner| {
                async move {
                    inner.refresher.ensure_fresh(false).await;
                }
                .boxed()
            }),
        );

        let cancellation = CancellationToken::new();
        let signal_task = self.inner.signals.as_ref().map(|source| {
            let receiver = source.subscribe();
            tokio::spawn(signal_worker(weak.clone(), receiver, cancellation.clone()))
        });

        *running = Some(Running {
            timers: vec![probe_timer, session_timer],
            cancellation,
            signal_task,
        });
    }

    /// Stop background monitoring
    ///
    /// Cancels every timer, signals the listener task to stop, and waits for
    /// it to finish. Calling `stop` on a stopped monitor does nothing.
    ///
    /// # Errors
    ///
    /// Returns `ConnectivityError::Internal` if the signal task panicked or
    /// does not stop within 5 seconds. A task that misses the deadline is
    /// aborted.
    pub async fn stop(&self) -> Result<()> {
        let Some(running) = self.inner.running.lock().take() else {
            return Ok(());
        };

        for timer in &running.timers {
            timer.cancel();
        }
        running.cancellation.cancel();

        if let Some(mut handle) = running.signal_task {
            let deadline = Duration::from_secs(MONITOR_STOP_TIMEOUT_SECS);
            match tokio::time::timeout(deadline, &mut handle).await {
                Ok(joined) => joined
                    .map_err(|e| ConnectivityError::Internal(format!("Task join failed: {e}")))?,
                Err(_) => {
                    handle.abort();
                    warn!("Signal listener did not stop in time, aborted");
                    return Err(ConnectivityError::Internal(
                        "Health monitor shutdown timeout".to_string(),
                    ));
                }
            }
        }

        info!("Connection health monitor stopped");
        Ok(())
    }

    /// Check if monitor is currently running
    pub fn is_running(&self) -> bool {
        self.inner.running.lock().is_some()
    }

    pub fn is_healthy(&self) -> bool {
        self.inner.health.is_healthy()
    }

    pub fn snapshot(&self) -> ConnectionState {
        self.inner.health.snapshot()
    }

    pub fn health(&self) -> &ConnectionHealth {
        &self.inner.health
    }

    /// Register a transition listener on the monitored state
    pub fn add_listener<F>(&self, listener: F) -> Subscription
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        self.inner.health.add_listener(listener)
    }

    /// Probe now unless the last probe was under the minimum gap ago
    ///
    /// Returns the health after the probe, or the cached health when the
    /// call was throttled.
    pub async fn check_now(&self) -> bool {
        self.inner.check_now().await
    }

    /// React to a platform signal
    pub async fn handle_signal(&self, signal: EnvironmentSignal) {
        self.inner.handle_signal(signal).await;
    }
}

impl MonitorInner {
    async fn check_now(&self) -> bool {
        if !self.reserve_probe_slot() {
            trace!("Health probe throttled");
            return self.health.is_healthy();
        }

        let timeout = self.config.probe_timeout();
        let outcome = tokio::time::timeout(timeout, self.probe.probe()).await;
        self.health.record_check(DateTime::<Utc>::from(self.clock.system_time()));

        match outcome {
            Ok(Ok(())) => {
                debug!("Health probe succeeded");
                self.health.mark_success();
            }
            Ok(Err(error)) => {
                debug!(error = %error, "Health probe failed");
                self.health.mark_failure();
            }
            Err(_) => {
                debug!(timeout_ms = self.config.probe_timeout_ms, "Health probe timed out");
                self.health.mark_failure();
            }
        }

        self.health.is_healthy()
    }

    fn reserve_probe_slot(&self) -> bool {
        let now = self.clock.now();
        let mut last_probe = self.last_probe.lock();
        if let Some(previous) = *last_probe {
            if now.saturating_duration_since(previous) < self.config.min_probe_gap() {
                return false;
            }
        }
        *last_probe = Some(now);
        true
    }

    async fn handle_signal(&self, signal: EnvironmentSignal) {
        debug!(%signal, "Environment signal received");
        match signal {
            EnvironmentSignal::Online => {
                self.health.reset_failures();
                self.check_now().await;
                self.refresher.ensure_fresh(true).await;
            }
            EnvironmentSignal::Offline => {
                self.health.force_unhealthy();
            }
            EnvironmentSignal::Visible => {
                self.check_now().await;
                self.refresher.ensure_fresh(false).await;
            }
            EnvironmentSignal::Hidden => {}
        }
    }
}

fn weak_task<F>(weak: &Weak<MonitorInner>, run: F) -> ScheduledTask
where
    F: Fn(Arc<MonitorInner>) -> futures::future::BoxFuture<'static, ()> + Send + Sync + 'static,
{
    let weak = weak.clone();
    Arc::new(move || match weak.upgrade() {
        Some(inner) => run(inner),
        None => futures::future::ready(()).boxed(),
    })
}

async fn signal_worker(
    monitor: Weak<MonitorInner>,
    mut receiver: tokio::sync::broadcast::Receiver<EnvironmentSignal>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("Signal listener shutting down");
                break;
            }
            received = receiver.recv() => {
                match received {
                    Ok(signal) => {
                        let Some(inner) = monitor.upgrade() else { break };
                        tokio::select! {
                            _ = cancel.cancelled() => {
                                debug!(?signal, "Signal handling cancelled by shutdown");
                                break;
                            }
                            _ = inner.handle_signal(signal) => {}
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Signal listener lagged, signals dropped");
                    }
                    Err(RecvError::Closed) => {
                        debug!("Signal source closed");
                        break;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;
    use studiolink_common::testing::{ManualScheduler, MockClock};
    use studiolink_domain::{Session, SessionConfig};

    use super::*;
    use crate::session::ports::SessionProvider;

    struct CountingProbe {
        calls: AtomicU32,
        healthy: bool,
    }

    #[async_trait]
    impl HealthProbe for CountingProbe {
        async fn probe(&self) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.healthy {
                Ok(())
            } else {
                Err(ConnectivityError::Network("connection refused".into()))
            }
        }
    }

    struct Anonymous;

    #[async_trait]
    impl SessionProvider for Anonymous {
        async fn current_session(&self) -> Result<Option<Session>> {
            Ok(None)
        }

        async fn refresh_session(&self) -> Result<Session> {
            Err(ConnectivityError::Internal("anonymous".into()))
        }
    }

    fn monitor(
        healthy: bool,
    ) -> (ConnectionHealthMonitor, Arc<CountingProbe>, ManualScheduler, MockClock) {
        let probe = Arc::new(CountingProbe { calls: AtomicU32::new(0), healthy });
        let scheduler = ManualScheduler::new();
        let clock = MockClock::new();
        let health = ConnectionHealth::new(3);
        let refresher = SessionRefresher::new(
            Arc::new(Anonymous),
            health.clone(),
            &SessionConfig::default(),
            Arc::new(clock.clone()),
        );
        let monitor = ConnectionHealthMonitor::builder(health, probe.clone(), refresher)
            .scheduler(Arc::new(scheduler.clone()))
            .clock(Arc::new(clock.clone()))
            .build();
        (monitor, probe, scheduler, clock)
    }

    #[tokio::test]
    async fn test_probes_inside_min_gap_are_throttled() {
        let (monitor, probe, _scheduler, clock) = monitor(true);

        assert!(monitor.check_now().await);
        clock.advance(Duration::from_secs(9));
        assert!(monitor.check_now().await);
        assert_eq!(probe.calls.load(Ordering::SeqCst), 1);

        clock.advance(Duration::from_secs(1));
        monitor.check_now().await;
        assert_eq!(probe.calls.load(Ordering::SeqCst), 2);
        assert!(monitor.snapshot().last_health_check_at.is_some());
    }

    #[tokio::test]
    async fn test_start_is_idempotent_and_stop_cancels_timers() {
        let (monitor, _probe, scheduler, _clock) = monitor(true);

        monitor.start();
        monitor.start();
        assert!(monitor.is_running());
        assert_eq!(scheduler.active_count(), 2);

        monitor.stop().await.unwrap();
        monitor.stop().await.unwrap();
        assert!(!monitor.is_running());
        assert_eq!(scheduler.active_count(), 0);
    }

    #[tokio::test]
    async fn test_offline_signal_forces_unhealthy() {
        let (monitor, probe, _scheduler, _clock) = monitor(true);

        monitor.handle_signal(EnvironmentSignal::Offline).await;
        assert!(!monitor.is_healthy());

        monitor.handle_signal(EnvironmentSignal::Hidden).await;
        assert_eq!(probe.calls.load(Ordering::SeqCst), 0);

        monitor.handle_signal(EnvironmentSignal::Online).await;
        assert!(monitor.is_healthy());
        assert_eq!(probe.calls.load(Ordering::SeqCst), 1);
    }
}
