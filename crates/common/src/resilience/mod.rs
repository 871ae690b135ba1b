//! Resilience patterns for transient failures
//!
//! This module provides the **generic** half of retrying: the executor, its
//! configuration, backoff strategies, and policies. It knows nothing about
//! HTTP or sessions. Callers plug in their error type by implementing
//! [`ErrorClassification`](crate::error::ErrorClassification) and
//! [`FromTimeout`]; credential-aware retrying is layered on top in
//! `studiolink-core`.

pub mod retry;

pub use retry::{
    policies, retry, BackoffStrategy, FromTimeout, OnRetry, RetryConfig, RetryConfigBuilder,
    RetryConfigError, RetryDecision, RetryExecutor, RetryOutcome, RetryPolicy,
};
