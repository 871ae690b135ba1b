//! Connection health state machine
//!
//! Two states, `Healthy` and `Unhealthy`. Failures accumulate until the
//! configured threshold flips the state; any success resets the counter and
//! flips it back. Listeners hear about transitions only, never about
//! repeated confirmations of the current state.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use studiolink_domain::constants::MAX_CONSECUTIVE_FAILURES;
use studiolink_domain::ConnectionState;
use tracing::{info, warn};

/// Callback invoked with the new health value on every transition
pub type HealthListener = Arc<dyn Fn(bool) + Send + Sync>;

struct Inner {
    state: Mutex<ConnectionState>,
    listeners: Mutex<Vec<(u64, HealthListener)>>,
    next_listener_id: AtomicU64,
    max_consecutive_failures: u32,
}

/// Shared handle to the connection state
///
/// Cloning is cheap; every clone observes and mutates the same state.
#[derive(Clone)]
pub struct ConnectionHealth {
    inner: Arc<Inner>,
}

impl fmt::Debug for ConnectionHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionHealth")
            .field("state", &self.snapshot())
            .field("listeners", &self.listener_count())
            .finish()
    }
}

impl Default for ConnectionHealth {
    fn default() -> Self {
        Self::new(MAX_CONSECUTIVE_FAILURES)
    }
}

impl ConnectionHealth {
    /// Create a healthy state that turns unhealthy after
    /// `max_consecutive_failures` failures in a row
    pub fn new(max_consecutive_failures: u32) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(ConnectionState::default()),
                listeners: Mutex::new(Vec::new()),
                next_listener_id: AtomicU64::new(0),
                max_consecutive_failures: max_consecutive_failures.max(1),
            }),
        }
    }

    /// Record a successful backend interaction
    pub fn mark_success(&self) {
        let recovered = {
            let mut state = self.inner.state.lock();
            state.consecutive_failures = 0;
            let recovered = !state.is_healthy;
            state.is_healthy = true;
            recovered
        };

        if recovered {
            info!("Connection recovered");
            self.notify(true);
        }
    }

    /// Record a failed backend interaction
    pub fn mark_failure(&self) {
        let (failures, degraded) = {
            let mut state = self.inner.state.lock();
            state.consecutive_failures = state.consecutive_failures.saturating_add(1);
            let degraded = state.is_healthy
                && state.consecutive_failures >= self.inner.max_consecutive_failures;
            if degraded {
                state.is_healthy = false;
            }
            (state.consecutive_failures, degraded)
        };

        if degraded {
            warn!(consecutive_failures = failures, "Connection marked unhealthy");
            self.notify(false);
        }
    }

    /// Clear the failure counter without changing the health flag
    pub fn reset_failures(&self) {
        self.inner.state.lock().consecutive_failures = 0;
    }

    /// Count failures up to the threshold, turning the state unhealthy
    ///
    /// Used when the platform reports that connectivity is gone.
    pub fn force_unhealthy(&self) {
        let degraded = {
            let mut state = self.inner.state.lock();
            state.consecutive_failures =
                state.consecutive_failures.max(self.inner.max_consecutive_failures);
            let degraded = state.is_healthy;
            state.is_healthy = false;
            degraded
        };

        if degraded {
            warn!("Connection marked unhealthy by platform signal");
            self.notify(false);
        }
    }

    /// Record when the last probe completed
    pub fn record_check(&self, at: DateTime<Utc>) {
        self.inner.state.lock().last_health_check_at = Some(at);
    }

    pub(crate) fn set_refresh_in_progress(&self, in_progress: bool) {
        self.inner.state.lock().refresh_in_progress = in_progress;
    }

    pub fn is_healthy(&self) -> bool {
        self.inner.state.lock().is_healthy
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.inner.state.lock().consecutive_failures
    }

    pub fn is_refresh_in_progress(&self) -> bool {
        self.inner.state.lock().refresh_in_progress
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> ConnectionState {
        self.inner.state.lock().clone()
    }

    /// Register a transition listener
    ///
    /// The listener stays registered until [`Subscription::unsubscribe`] is
    /// called; dropping the subscription does not remove it.
    pub fn add_listener<F>(&self, listener: F) -> Subscription
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        let id = self.inner.next_listener_id.fetch_add(1, Ordering::Relaxed);
        self.inner.listeners.lock().push((id, Arc::new(listener)));
        Subscription { id, health: Arc::downgrade(&self.inner) }
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.lock().len()
    }

    fn notify(&self, healthy: bool) {
        // Listeners run outside the lock so they may call back into this state.
        let listeners: Vec<HealthListener> =
            self.inner.listeners.lock().iter().map(|(_, listener)| Arc::clone(listener)).collect();
        for listener in listeners {
            listener(healthy);
        }
    }
}

/// Handle returned by [`ConnectionHealth::add_listener`]
#[must_use = "keep the subscription to be able to unsubscribe"]
pub struct Subscription {
    id: u64,
    health: Weak<Inner>,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

impl Subscription {
    /// Remove the listener; later transitions are not delivered to it
    pub fn unsubscribe(self) {
        if let Some(inner) = self.health.upgrade() {
            inner.listeners.lock().retain(|(id, _)| *id != self.id);
        }
    }
}
