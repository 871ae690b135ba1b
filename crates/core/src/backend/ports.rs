//! Port interface for the remote backend

use async_trait::async_trait;
use serde_json::Value;
use studiolink_domain::{BackendRequest, Result};

/// Executes one backend request, once, with no retrying
#[async_trait]
pub trait BackendGateway: Send + Sync {
    /// Run `request` and return the JSON payload
    async fn execute(&self, request: &BackendRequest) -> Result<Value>;
}
