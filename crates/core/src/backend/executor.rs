//! Retrying executor that keeps the session fresh between attempts
//!
//! Wraps [`RetryExecutor`] with the connectivity error classification and
//! calls [`SessionRefresher::ensure_fresh`] at the start of every attempt.
//! When an attempt fails with an expired credential, the next attempt forces
//! a refresh instead of waiting for the expiry threshold.

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};

use studiolink_common::resilience::{
    BackoffStrategy, OnRetry, RetryConfig, RetryExecutor, RetryOutcome,
};
use studiolink_domain::{ConnectivityError, Result, RetrySettings};
use tracing::{debug, instrument};

use crate::session::SessionRefresher;

/// Credential-aware retry wrapper for backend calls
#[derive(Clone)]
pub struct ResilientExecutor {
    refresher: SessionRefresher,
    config: RetryConfig,
    on_retry: Option<OnRetry<ConnectivityError>>,
}

impl fmt::Debug for ResilientExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResilientExecutor")
            .field("config", &self.config)
            .field("on_retry", &self.on_retry.is_some())
            .finish()
    }
}

impl ResilientExecutor {
    pub fn new(refresher: SessionRefresher, config: RetryConfig) -> Self {
        Self { refresher, config, on_retry: None }
    }

    /// Executor with linear backoff built from loaded retry settings
    pub fn from_settings(refresher: SessionRefresher, settings: &RetrySettings) -> Self {
        let config = RetryConfig {
            max_attempts: settings.max_attempts,
            timeout: settings.timeout(),
            backoff: BackoffStrategy::Linear { base: settings.base_delay() },
        };
        Self::new(refresher, config)
    }

    /// Install a hook called before every retry with the failed attempt
    /// number and its error
    #[must_use]
    pub fn with_on_retry(mut self, hook: OnRetry<ConnectivityError>) -> Self {
        self.on_retry = Some(hook);
        self
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    pub fn refresher(&self) -> &SessionRefresher {
        &self.refresher
    }

    /// Run `task` with retries, refreshing the session before each attempt
    ///
    /// The refresh result does not gate the attempt: a failed refresh is
    /// already counted against connection health, and the attempt itself
    /// reports whether the credential was rejected.
    ///
    /// # Errors
    ///
    /// Returns the first non-retryable error, or the last error once all
    /// attempts are used. A lost timeout race surfaces as
    /// [`ConnectivityError::Timeout`] labelled with `operation`.
    #[instrument(skip(self, task), fields(max_attempts = self.config.max_attempts))]
    pub async fn run<F, Fut, T>(&self, operation: &str, task: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.run_with_outcome(operation, task).await.into_result()
    }

    /// Like [`run`](Self::run), also reporting attempts and backoff delays
    pub async fn run_with_outcome<F, Fut, T>(
        &self,
        operation: &str,
        mut task: F,
    ) -> RetryOutcome<T, ConnectivityError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut executor =
            RetryExecutor::classified(self.config.clone()).with_operation(operation);
        if let Some(hook) = &self.on_retry {
            executor = executor.with_on_retry(hook.clone());
        }

        let force_refresh = AtomicBool::new(false);
        let refresher = &self.refresher;
        let force_refresh = &force_refresh;

        executor
            .execute_with_outcome(|| {
                let force = force_refresh.swap(false, Ordering::SeqCst);
                let attempt = task();
                async move {
                    refresher.ensure_fresh(force).await;
                    let result = attempt.await;
                    if let Err(error) = &result {
                        if error.is_credential_expired() {
                            debug!("Credential rejected, forcing refresh before next attempt");
                            force_refresh.store(true, Ordering::SeqCst);
                        }
                    }
                    result
                }
            })
            .await
    }
}
