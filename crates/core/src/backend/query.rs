//! Query helpers: the entry point for backend calls
//!
//! Each helper builds a [`BackendRequest`], validates it, and runs it through
//! the [`ResilientExecutor`] so every call gets session freshness, a timeout
//! per attempt, and classified retries.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use studiolink_domain::{BackendRequest, ConnectivityError, Result};
use tracing::debug;

use super::executor::ResilientExecutor;
use super::ports::BackendGateway;

/// Retrying, session-aware access to the backend
#[derive(Clone)]
pub struct QueryHelpers {
    gateway: Arc<dyn BackendGateway>,
    executor: Arc<ResilientExecutor>,
}

impl std::fmt::Debug for QueryHelpers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryHelpers").field("executor", &self.executor).finish()
    }
}

impl QueryHelpers {
    pub fn new(gateway: Arc<dyn BackendGateway>, executor: Arc<ResilientExecutor>) -> Self {
        Self { gateway, executor }
    }

    /// Run a prepared request with retries
    ///
    /// # Errors
    ///
    /// Returns `ConnectivityError::InvalidInput` without contacting the
    /// backend when the request is malformed, otherwise whatever
    /// [`ResilientExecutor::run`] surfaces.
    pub async fn execute(&self, request: BackendRequest) -> Result<Value> {
        request.validate()?;
        let label = request.label();
        let gateway = &self.gateway;
        let request = &request;

        let value = self.executor.run(&label, || gateway.execute(request)).await?;
        debug!(operation = %label, "Backend call succeeded");
        Ok(value)
    }

    /// Read rows from `table`; `configure` adds filters, projection, limit
    pub async fn select<C>(&self, table: &str, configure: C) -> Result<Value>
    where
        C: FnOnce(BackendRequest) -> BackendRequest,
    {
        self.execute(configure(BackendRequest::select(table))).await
    }

    /// Read rows from `table` and decode them
    ///
    /// # Errors
    ///
    /// Returns `ConnectivityError::Internal` when the payload does not match
    /// `T`.
    pub async fn select_as<T, C>(&self, table: &str, configure: C) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
        C: FnOnce(BackendRequest) -> BackendRequest,
    {
        let value = self.select(table, configure).await?;
        serde_json::from_value(value).map_err(|e| {
            ConnectivityError::Internal(format!("Failed to decode {table} rows: {e}"))
        })
    }

    /// Insert one row or an array of rows
    pub async fn insert(&self, table: &str, rows: Value) -> Result<Value> {
        self.execute(BackendRequest::insert(table, rows)).await
    }

    /// Apply `changes` to the rows selected by `configure`
    pub async fn update<C>(&self, table: &str, changes: Value, configure: C) -> Result<Value>
    where
        C: FnOnce(BackendRequest) -> BackendRequest,
    {
        self.execute(configure(BackendRequest::update(table, changes))).await
    }

    /// Delete the rows selected by `configure`
    pub async fn delete<C>(&self, table: &str, configure: C) -> Result<Value>
    where
        C: FnOnce(BackendRequest) -> BackendRequest,
    {
        self.execute(configure(BackendRequest::delete(table))).await
    }

    /// Call a stored function
    pub async fn rpc(&self, function: &str, args: Value) -> Result<Value> {
        self.execute(BackendRequest::rpc(function, args)).await
    }
}
