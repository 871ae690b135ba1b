//! Port interfaces for health monitoring

use async_trait::async_trait;
use studiolink_domain::{EnvironmentSignal, Result};
use tokio::sync::broadcast;

/// Lightweight reachability check against the backend
#[async_trait]
pub trait HealthProbe: Send + Sync {
    /// Succeeds when the backend answered at all
    async fn probe(&self) -> Result<()>;
}

/// Platform connectivity and visibility events
pub trait SignalSource: Send + Sync {
    /// Subscribe to signals emitted from now on
    fn subscribe(&self) -> broadcast::Receiver<EnvironmentSignal>;
}
