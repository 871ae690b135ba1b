//! Recurring timers with cancellation support
//!
//! Background components never call `tokio::time::interval` directly. They
//! ask a [`Scheduler`] for a repeating task and keep the returned
//! [`TimerHandle`], which lets tests swap in
//! [`ManualScheduler`](crate::testing::ManualScheduler) and fire ticks on
//! demand.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use tokio::task::AbortHandle;
use tokio::time::MissedTickBehavior;
use tracing::trace;

/// Work run on every tick of a repeating timer
pub type ScheduledTask = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// A timer handle that can be used to cancel a timer
#[derive(Debug, Clone)]
pub struct TimerHandle {
    cancelled: Arc<AtomicBool>,
    abort: Option<AbortHandle>,
}

impl Default for TimerHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerHandle {
    /// Create a handle that is not bound to a spawned task
    pub fn new() -> Self {
        Self { cancelled: Arc::new(AtomicBool::new(false)), abort: None }
    }

    /// Cancel the timer
    ///
    /// No tick starts after this returns. A tick already in flight on a
    /// spawned task is aborted at its next await point.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        if let Some(abort) = &self.abort {
            abort.abort();
        }
    }

    /// Check if the timer has been cancelled
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Source of repeating timers
pub trait Scheduler: Send + Sync {
    /// Run `task` every `period`, first tick one full period from now
    fn schedule_repeating(&self, period: Duration, task: ScheduledTask) -> TimerHandle;
}

/// [`Scheduler`] backed by the Tokio timer wheel
///
/// Must be used from within a Tokio runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioScheduler;

impl Scheduler for TokioScheduler {
    fn schedule_repeating(&self, period: Duration, task: ScheduledTask) -> TimerHandle {
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);

        let join = tokio::spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut interval = tokio::time::interval_at(start, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                interval.tick().await;
                if flag.load(Ordering::SeqCst) {
                    break;
                }
                trace!(
                    period_ms = u64::try_from(period.as_millis()).unwrap_or(u64::MAX),
                    "timer tick"
                );
                task().await;
            }
        });

        TimerHandle { cancelled, abort: Some(join.abort_handle()) }
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for time::timer.
    use std::sync::atomic::AtomicU32;

    use futures::FutureExt;

    use super::*;

    fn counting_task(counter: &Arc<AtomicU32>) -> ScheduledTask {
        let counter = Arc::clone(counter);
        Arc::new(move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
            .boxed()
        })
    }

    /// Validates `TimerHandle::new` behavior for the timer handle cancel
    /// scenario.
    ///
    /// Assertions:
    /// - Ensures `!handle.is_cancelled()` evaluates to true.
    /// - Ensures `handle.is_cancelled()` evaluates to true.
    #[test]
    fn test_timer_handle_cancel() {
        let handle = TimerHandle::new();
        assert!(!handle.is_cancelled());

        handle.cancel();
        assert!(handle.is_cancelled());
        assert!(handle.clone().is_cancelled());
    }

    /// Validates `TokioScheduler` skips the immediate tick and fires once
    /// per period.
    ///
    /// Assertions:
    /// - Confirms no tick before the first period elapses.
    /// - Confirms three ticks after three periods.
    #[tokio::test(start_paused = true)]
    async fn test_tokio_scheduler_fires_each_period() {
        let counter = Arc::new(AtomicU32::new(0));
        let handle =
            TokioScheduler.schedule_repeating(Duration::from_secs(60), counting_task(&counter));

        tokio::time::sleep(Duration::from_secs(59)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(125)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 3);

        handle.cancel();
    }

    /// Validates a cancelled timer stops ticking.
    ///
    /// Assertions:
    /// - Confirms the counter stays at 1 after cancellation.
    #[tokio::test(start_paused = true)]
    async fn test_tokio_scheduler_cancel_stops_ticks() {
        let counter = Arc::new(AtomicU32::new(0));
        let handle =
            TokioScheduler.schedule_repeating(Duration::from_secs(10), counting_task(&counter));

        tokio::time::sleep(Duration::from_millis(10_500)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        handle.cancel();
        assert!(handle.is_cancelled());

        tokio::time::sleep(Duration::from_secs(100)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
