//! Single-flight session refresher
//!
//! Keeps the bearer credential away from expiry. A refresh is due when the
//! session expires within the refresh threshold, when the caller forces one,
//! or when the force-refresh interval has passed since the last successful
//! refresh. Concurrent callers that need a refresh while one is in flight
//! await the same shared future, so the provider sees one request. The
//! refresh itself runs on a spawned task and completes even when every
//! caller has gone away.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use studiolink_common::time::Clock;
use studiolink_domain::{Session, SessionConfig};
use tracing::{debug, info, instrument, warn};

use super::ports::SessionProvider;
use crate::health::ConnectionHealth;

type InFlight = Shared<BoxFuture<'static, bool>>;

struct Inner {
    provider: Arc<dyn SessionProvider>,
    health: ConnectionHealth,
    clock: Arc<dyn Clock>,
    refresh_threshold: Duration,
    force_refresh_interval: Duration,
    last_refresh: Mutex<Instant>,
    last_refresh_at: Mutex<Option<DateTime<Utc>>>,
    in_flight: Mutex<Option<InFlight>>,
}

/// Ensures the session is fresh before backend calls
#[derive(Clone)]
pub struct SessionRefresher {
    inner: Arc<Inner>,
}

impl fmt::Debug for SessionRefresher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionRefresher")
            .field("refresh_threshold", &self.inner.refresh_threshold)
            .field("force_refresh_interval", &self.inner.force_refresh_interval)
            .field("last_refresh_at", &self.last_refresh_at())
            .field("refresh_in_flight", &self.inner.in_flight.lock().is_some())
            .finish()
    }
}

impl SessionRefresher {
    /// Create a refresher
    ///
    /// The force-refresh interval is measured from construction until the
    /// first successful refresh.
    pub fn new(
        provider: Arc<dyn SessionProvider>,
        health: ConnectionHealth,
        config: &SessionConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let now = clock.now();
        Self {
            inner: Arc::new(Inner {
                provider,
                health,
                clock,
                refresh_threshold: config.refresh_threshold(),
                force_refresh_interval: config.force_refresh_interval(),
                last_refresh: Mutex::new(now),
                last_refresh_at: Mutex::new(None),
                in_flight: Mutex::new(None),
            }),
        }
    }

    /// Make sure the current session can be used
    ///
    /// Returns `true` when there is no session (anonymous access needs no
    /// credential), when the session is fresh, or when a refresh succeeded.
    /// Returns `false` when the session could not be read or refreshed; the
    /// failure is recorded against connection health.
    #[instrument(skip(self))]
    pub async fn ensure_fresh(&self, force_refresh: bool) -> bool {
        let session = match self.inner.provider.current_session().await {
            Ok(Some(session)) => session,
            Ok(None) => {
                debug!("No session, nothing to refresh");
                return true;
            }
            Err(error) => {
                warn!(error = %error, "Failed to read current session");
                self.inner.health.mark_failure();
                return false;
            }
        };

        if !force_refresh && !self.needs_refresh(&session) {
            return true;
        }

        self.refresh().await
    }

    /// Whether `session` is due for a refresh right now
    pub fn needs_refresh(&self, session: &Session) -> bool {
        let threshold_ms =
            i64::try_from(self.inner.refresh_threshold.as_millis()).unwrap_or(i64::MAX);
        let expires_in_ms = session.expires_in_ms(self.inner.clock.millis_since_epoch());
        if expires_in_ms < threshold_ms {
            debug!(expires_in_ms, "Session close to expiry");
            return true;
        }

        let last_refresh = *self.inner.last_refresh.lock();
        let since_refresh = self.inner.clock.now().saturating_duration_since(last_refresh);
        if since_refresh > self.inner.force_refresh_interval {
            debug!(since_refresh_secs = since_refresh.as_secs(), "Periodic refresh due");
            return true;
        }

        false
    }

    /// Wall-clock time of the last successful refresh
    pub fn last_refresh_at(&self) -> Option<DateTime<Utc>> {
        *self.inner.last_refresh_at.lock()
    }

    /// Whether a refresh is currently in flight
    pub fn is_refreshing(&self) -> bool {
        self.inner.in_flight.lock().is_some()
    }

    fn refresh(&self) -> InFlight {
        let mut slot = self.inner.in_flight.lock();
        if let Some(in_flight) = slot.as_ref() {
            debug!("Joining in-flight session refresh");
            return in_flight.clone();
        }

        // Owned by its own task: callers may be dropped mid-refresh.
        self.inner.health.set_refresh_in_progress(true);
        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(async move {
            let _slot = InFlightSlot(&inner);
            inner.run_refresh().await
        });
        let shared = async move {
            handle.await.unwrap_or_else(|error| {
                warn!(error = %error, "Session refresh task did not complete");
                false
            })
        }
        .boxed()
        .shared();
        *slot = Some(shared.clone());
        shared
    }
}

/// Clears the in-flight slot and flag when the refresh task ends, including
/// by panic or runtime shutdown
struct InFlightSlot<'a>(&'a Inner);

impl Drop for InFlightSlot<'_> {
    fn drop(&mut self) {
        self.0.health.set_refresh_in_progress(false);
        *self.0.in_flight.lock() = None;
    }
}

impl Inner {
    async fn run_refresh(&self) -> bool {
        match self.provider.refresh_session().await {
            Ok(session) => {
                *self.last_refresh.lock() = self.clock.now();
                *self.last_refresh_at.lock() =
                    Some(DateTime::<Utc>::from(self.clock.system_time()));
                info!(expires_at = session.expires_at_epoch_seconds, "Session refreshed");
                self.health.mark_success();
                true
            }
            Err(error) => {
                warn!(
                    error = %error,
                    category = error.category().label(),
                    "Session refresh failed"
                );
                self.health.mark_failure();
                false
            }
        }
    }
}
