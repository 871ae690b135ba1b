//! Shared test helpers for `studiolink-core` integration tests.
//!
//! These helpers provide scripted port implementations so that connectivity
//! tests can focus on behaviour instead of boilerplate.

pub mod mocks;

use std::sync::Arc;

use studiolink_common::testing::{ManualScheduler, MockClock};
use studiolink_core::{ConnectionHealth, ConnectionHealthMonitor, SessionRefresher};
use studiolink_domain::{HealthConfig, Session, SessionConfig};

pub use mocks::{MockGateway, MockProbe, MockSessionProvider, MockSignals, RecordingListener};

/// Fixed wall-clock second the mock clock starts at
pub const NOW: u64 = 1_700_000_000;

/// Session expiring `secs` after [`NOW`]
pub fn session_expiring_in(secs: i64) -> Session {
    Session::new("access-token", Some("refresh-token".into()), NOW as i64 + secs)
}

/// Refresher over `provider` with default thresholds and a mock clock
pub fn refresher(
    provider: Arc<MockSessionProvider>,
    health: &ConnectionHealth,
    clock: &MockClock,
) -> SessionRefresher {
    SessionRefresher::new(
        provider,
        health.clone(),
        &SessionConfig::default(),
        Arc::new(clock.clone()),
    )
}

/// Everything a monitor test needs to drive and observe the monitor
pub struct MonitorHarness {
    pub monitor: ConnectionHealthMonitor,
    pub health: ConnectionHealth,
    pub probe: Arc<MockProbe>,
    pub provider: Arc<MockSessionProvider>,
    pub scheduler: ManualScheduler,
    pub clock: MockClock,
}

impl MonitorHarness {
    pub fn new(probe: MockProbe, provider: MockSessionProvider) -> Self {
        Self::build(probe, provider, None)
    }

    /// Harness whose monitor listens to `signals` while running
    pub fn with_signals(
        probe: MockProbe,
        provider: MockSessionProvider,
        signals: Arc<MockSignals>,
    ) -> Self {
        Self::build(probe, provider, Some(signals))
    }

    fn build(
        probe: MockProbe,
        provider: MockSessionProvider,
        signals: Option<Arc<MockSignals>>,
    ) -> Self {
        let probe = Arc::new(probe);
        let provider = Arc::new(provider);
        let scheduler = ManualScheduler::new();
        let clock = MockClock::at_unix_seconds(NOW);
        let health = ConnectionHealth::new(3);
        let refresher = refresher(Arc::clone(&provider), &health, &clock);
        let mut builder =
            ConnectionHealthMonitor::builder(health.clone(), probe.clone(), refresher)
                .config(HealthConfig::default())
                .scheduler(Arc::new(scheduler.clone()))
                .clock(Arc::new(clock.clone()));
        if let Some(signals) = signals {
            builder = builder.signals(signals);
        }
        let monitor = builder.build();

        Self { monitor, health, probe, provider, scheduler, clock }
    }
}
