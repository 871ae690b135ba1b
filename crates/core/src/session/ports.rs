//! Port interface for the session provider
//!
//! Authentication itself is out of scope; the provider owns the session and
//! knows how to exchange a refresh token for a new one.

use async_trait::async_trait;
use studiolink_domain::{Result, Session};

/// Source of the current authenticated session
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Current session, `None` when the user is anonymous
    async fn current_session(&self) -> Result<Option<Session>>;

    /// Exchange the current refresh token for a new session
    async fn refresh_session(&self) -> Result<Session>;
}
