//! Generic retry executor with per-attempt timeout and configurable backoff
//!
//! Every attempt is raced against `RetryConfig::timeout`. A failed attempt is
//! handed to a [`RetryPolicy`]; retryable failures are retried after the
//! backoff delay until `max_attempts` is reached. The error returned to the
//! caller is always the last one observed, never a wrapper around it.
//!
//! The default [`BackoffStrategy::Linear`] waits `base * n` after the `n`-th
//! failed attempt, so the worst-case total wait is
//! `base * max_attempts * (max_attempts - 1) / 2`.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, instrument, warn};

pub use crate::error::FromTimeout;
use crate::error::ErrorClassification;

/// Errors raised while building a retry configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RetryConfigError {
    /// The retry strategy configuration is invalid
    #[error("Invalid retry configuration: {message}")]
    InvalidConfiguration { message: String },
}

/// Trait for determining whether an error should be retried
pub trait RetryPolicy<E> {
    /// Decide what to do after attempt number `attempt` (1-based) failed
    fn should_retry(&self, error: &E, attempt: u32) -> RetryDecision;
}

/// Decision for whether to retry an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry the operation after the configured backoff delay
    Retry,
    /// Don't retry the operation
    Stop,
}

/// Backoff strategy for calculating retry delays
#[derive(Debug, Clone, PartialEq)]
pub enum BackoffStrategy {
    /// Fixed delay between retries
    Fixed(Duration),
    /// Linear backoff: `base * failed_attempt`
    Linear { base: Duration },
    /// Exponential backoff: `initial_delay * base^(failed_attempt - 1)`, capped
    Exponential { initial_delay: Duration, base: f64, max_delay: Duration },
}

impl BackoffStrategy {
    /// Calculate the delay to wait after the given failed attempt (1-based)
    pub fn calculate_delay(&self, failed_attempt: u32) -> Duration {
        match self {
            Self::Fixed(delay) => *delay,
            Self::Linear { base } => base.saturating_mul(failed_attempt),
            Self::Exponential { initial_delay, base, max_delay } => {
                let exponent = i32::try_from(failed_attempt.saturating_sub(1)).unwrap_or(i32::MAX);
                let delay = initial_delay.as_secs_f64() * base.powi(exponent);
                if !delay.is_finite() || delay >= max_delay.as_secs_f64() {
                    *max_delay
                } else {
                    Duration::from_secs_f64(delay)
                }
            }
        }
    }
}

/// Configuration for retry behavior
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first one
    pub max_attempts: u32,
    /// Deadline for each individual attempt
    pub timeout: Duration,
    /// Backoff strategy for calculating delays
    pub backoff: BackoffStrategy,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            timeout: Duration::from_secs(15),
            backoff: BackoffStrategy::Linear { base: Duration::from_secs(1) },
        }
    }
}

impl RetryConfig {
    /// Create a configuration builder
    pub fn builder() -> RetryConfigBuilder {
        RetryConfigBuilder::new()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), RetryConfigError> {
        if self.max_attempts == 0 {
            return Err(RetryConfigError::InvalidConfiguration {
                message: "max_attempts must be greater than 0".to_string(),
            });
        }

        if self.timeout.is_zero() {
            return Err(RetryConfigError::InvalidConfiguration {
                message: "timeout must be greater than 0".to_string(),
            });
        }

        match &self.backoff {
            BackoffStrategy::Exponential { base, .. } if *base <= 0.0 => {
                Err(RetryConfigError::InvalidConfiguration {
                    message: "exponential base must be greater than 0".to_string(),
                })
            }
            _ => Ok(()),
        }
    }

    /// Sum of every backoff delay when all attempts fail
    pub fn worst_case_backoff(&self) -> Duration {
        (1..self.max_attempts).map(|attempt| self.backoff.calculate_delay(attempt)).sum()
    }
}

/// Builder for [`RetryConfig`] with fluent API
#[derive(Debug)]
pub struct RetryConfigBuilder {
    config: RetryConfig,
}

impl Default for RetryConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RetryConfigBuilder {
    pub fn new() -> Self {
        Self { config: RetryConfig::default() }
    }

    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.config.max_attempts = attempts;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn fixed_backoff(mut self, delay: Duration) -> Self {
        self.config.backoff = BackoffStrategy::Fixed(delay);
        self
    }

    pub fn linear_backoff(mut self, base: Duration) -> Self {
        self.config.backoff = BackoffStrategy::Linear { base };
        self
    }

    pub fn exponential_backoff(
        mut self,
        initial_delay: Duration,
        base: f64,
        max_delay: Duration,
    ) -> Self {
        self.config.backoff = BackoffStrategy::Exponential { initial_delay, base, max_delay };
        self
    }

    pub fn build(self) -> Result<RetryConfig, RetryConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Outcome of a retry execution including result and summary statistics.
#[derive(Debug)]
pub struct RetryOutcome<T, E> {
    pub result: Result<T, E>,
    /// Attempts actually made (1-based count)
    pub attempts: u32,
    /// Backoff delays waited, in order
    pub delays: Vec<Duration>,
}

impl<T, E> RetryOutcome<T, E> {
    /// Consume the outcome and return only the result.
    pub fn into_result(self) -> Result<T, E> {
        self.result
    }

    /// Total time spent waiting between attempts
    pub fn total_delay(&self) -> Duration {
        self.delays.iter().sum()
    }
}

/// Hook invoked before each retry with the failed attempt number and error
pub type OnRetry<E> = Arc<dyn Fn(u32, &E) + Send + Sync>;

/// The main retry executor
pub struct RetryExecutor<P, E> {
    config: RetryConfig,
    policy: P,
    operation: String,
    on_retry: Option<OnRetry<E>>,
}

impl<P, E> RetryExecutor<P, E> {
    /// Create a new retry executor with the given configuration and policy
    pub fn new(config: RetryConfig, policy: P) -> Self {
        Self { config, policy, operation: "operation".to_string(), on_retry: None }
    }

    /// Label used in logs and timeout errors
    #[must_use]
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = operation.into();
        self
    }

    /// Install a hook called before every retry (logging, telemetry)
    #[must_use]
    pub fn with_on_retry(mut self, hook: OnRetry<E>) -> Self {
        self.on_retry = Some(hook);
        self
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }
}

impl<E> RetryExecutor<policies::ClassifiedRetry, E> {
    /// Executor that retries whatever the error's own classification allows
    pub fn classified(config: RetryConfig) -> Self {
        Self::new(config, policies::ClassifiedRetry)
    }
}

impl<P, E> RetryExecutor<P, E>
where
    P: RetryPolicy<E>,
    E: FromTimeout + fmt::Display,
{
    /// Execute an operation with retry logic
    #[instrument(
        skip(self, operation),
        fields(op = %self.operation, max_attempts = self.config.max_attempts)
    )]
    pub async fn execute<F, Fut, T>(&self, operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.execute_with_outcome(operation).await.into_result()
    }

    /// Execute an operation with retry logic and return outcome statistics.
    pub async fn execute_with_outcome<F, Fut, T>(&self, mut operation: F) -> RetryOutcome<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let max_attempts = self.config.max_attempts.max(1);
        let mut delays = Vec::new();
        let mut attempt = 1;

        loop {
            debug!(attempt, max_attempts, "Executing operation");

            let result = match tokio::time::timeout(self.config.timeout, operation()).await {
                Ok(result) => result,
                Err(_) => Err(E::from_timeout(&self.operation, self.config.timeout)),
            };

            let error = match result {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(attempt, "Operation succeeded after retries");
                    }
                    return RetryOutcome { result: Ok(value), attempts: attempt, delays };
                }
                Err(error) => error,
            };

            if self.policy.should_retry(&error, attempt) == RetryDecision::Stop {
                debug!(attempt, error = %error, "Retry policy determined not to retry");
                return RetryOutcome { result: Err(error), attempts: attempt, delays };
            }

            if attempt >= max_attempts {
                warn!(attempts = attempt, error = %error, "All retry attempts exhausted");
                return RetryOutcome { result: Err(error), attempts: attempt, delays };
            }

            if let Some(hook) = &self.on_retry {
                hook(attempt, &error);
            }

            let delay = self.config.backoff.calculate_delay(attempt);
            warn!(
                attempt,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                error = %error,
                "Operation failed, retrying"
            );
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            delays.push(delay);
            attempt += 1;
        }
    }
}

/// Convenience function: execute with the error's own classification
pub async fn retry<F, Fut, T, E>(config: RetryConfig, operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: ErrorClassification + FromTimeout + fmt::Display,
{
    RetryExecutor::classified(config).execute(operation).await
}

/// Pre-defined retry policies for common scenarios
pub mod policies {
    use super::{ErrorClassification, RetryDecision, RetryPolicy};

    /// Retries exactly the errors that classify themselves as retryable
    #[derive(Debug, Clone, Copy, Default)]
    pub struct ClassifiedRetry;

    impl<E: ErrorClassification> RetryPolicy<E> for ClassifiedRetry {
        fn should_retry(&self, error: &E, _attempt: u32) -> RetryDecision {
            if error.is_retryable() {
                RetryDecision::Retry
            } else {
                RetryDecision::Stop
            }
        }
    }

    /// Predicate-based retry policy
    #[derive(Debug)]
    pub struct PredicateRetry<F> {
        predicate: F,
    }

    impl<F> PredicateRetry<F> {
        pub fn new(predicate: F) -> Self {
            Self { predicate }
        }
    }

    impl<F, E> RetryPolicy<E> for PredicateRetry<F>
    where
        F: Fn(&E, u32) -> bool,
    {
        fn should_retry(&self, error: &E, attempt: u32) -> RetryDecision {
            if (self.predicate)(error, attempt) {
                RetryDecision::Retry
            } else {
                RetryDecision::Stop
            }
        }
    }
}
