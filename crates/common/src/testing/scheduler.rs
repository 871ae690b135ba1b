//! Manually driven scheduler for tests
//!
//! [`ManualScheduler`] records every repeating task instead of spawning it.
//! Tests fire ticks explicitly, so periodic behavior is exercised without
//! waiting on real or virtual time.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::time::{ScheduledTask, Scheduler, TimerHandle};

struct Entry {
    period: Duration,
    task: ScheduledTask,
    handle: TimerHandle,
}

/// [`Scheduler`] that only runs tasks when told to
#[derive(Clone, Default)]
pub struct ManualScheduler {
    entries: Arc<Mutex<Vec<Entry>>>,
}

impl fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualScheduler")
            .field("scheduled", &self.entries.lock().len())
            .field("active", &self.active_count())
            .finish()
    }
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tasks scheduled and not yet cancelled
    pub fn active_count(&self) -> usize {
        self.entries.lock().iter().filter(|entry| !entry.handle.is_cancelled()).count()
    }

    /// Periods of active tasks, in scheduling order
    pub fn active_periods(&self) -> Vec<Duration> {
        self.entries
            .lock()
            .iter()
            .filter(|entry| !entry.handle.is_cancelled())
            .map(|entry| entry.period)
            .collect()
    }

    /// Run one tick of every active task, sequentially
    pub async fn fire_all(&self) {
        for task in self.active_tasks(|_| true) {
            task().await;
        }
    }

    /// Run one tick of every active task scheduled with `period`
    pub async fn fire_period(&self, period: Duration) {
        for task in self.active_tasks(|entry| entry.period == period) {
            task().await;
        }
    }

    fn active_tasks(&self, filter: impl Fn(&Entry) -> bool) -> Vec<ScheduledTask> {
        self.entries
            .lock()
            .iter()
            .filter(|entry| !entry.handle.is_cancelled() && filter(entry))
            .map(|entry| Arc::clone(&entry.task))
            .collect()
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_repeating(&self, period: Duration, task: ScheduledTask) -> TimerHandle {
        let handle = TimerHandle::new();
        self.entries.lock().push(Entry { period, task, handle: handle.clone() });
        handle
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for testing::scheduler.
    use std::sync::atomic::{AtomicU32, Ordering};

    use futures::FutureExt;

    use super::*;

    fn task(counter: &Arc<AtomicU32>, amount: u32) -> ScheduledTask {
        let counter = Arc::clone(counter);
        Arc::new(move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(amount, Ordering::SeqCst);
            }
            .boxed()
        })
    }

    /// Validates manual firing honors period filters and cancellation.
    ///
    /// Assertions:
    /// - Confirms `fire_period` runs only the matching task.
    /// - Confirms cancelled tasks are skipped by `fire_all`.
    #[tokio::test]
    async fn test_manual_scheduler_fires_on_demand() {
        let scheduler = ManualScheduler::new();
        let counter = Arc::new(AtomicU32::new(0));

        let fast = scheduler.schedule_repeating(Duration::from_secs(1), task(&counter, 1));
        let _slow = scheduler.schedule_repeating(Duration::from_secs(60), task(&counter, 100));
        assert_eq!(scheduler.active_count(), 2);

        scheduler.fire_period(Duration::from_secs(60)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 100);

        fast.cancel();
        scheduler.fire_all().await;
        assert_eq!(counter.load(Ordering::SeqCst), 200);
        assert_eq!(scheduler.active_periods(), vec![Duration::from_secs(60)]);
    }
}
