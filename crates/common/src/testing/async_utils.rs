//! Async testing utilities

use std::future::Future;
use std::time::Duration;

/// Assert that an async condition eventually becomes true within a timeout
///
/// Works under paused Tokio time: each poll sleeps 10ms of virtual time.
#[macro_export]
macro_rules! assert_eventually_async {
    ($timeout:expr, $fut:expr) => {{
        let timeout_duration = $timeout;
        let result = tokio::time::timeout(timeout_duration, async {
            loop {
                if $fut.await {
                    break;
                }
                tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            }
        })
        .await;

        assert!(result.is_ok(), "Condition did not become true within {:?}", timeout_duration);
    }};
}

/// Poll `condition` every `interval` until it holds or `timeout` elapses
///
/// Returns whether the condition was observed.
pub async fn poll_until<F, Fut>(timeout: Duration, interval: Duration, mut condition: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    tokio::time::timeout(timeout, async {
        loop {
            if condition().await {
                return;
            }
            tokio::time::sleep(interval).await;
        }
    })
    .await
    .is_ok()
}
