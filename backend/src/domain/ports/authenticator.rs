//! Driving port resolving a presented session token to a [`Principal`].

use async_trait::async_trait;

use crate::domain::{Error, ResolvedSession};

/// Authentication entry point used by inbound adapters on every protected
/// request.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Resolve `token` to the live session holding it, with the principal's
    /// current role.
    ///
    /// Missing, malformed, unknown and expired tokens all fail uniformly with
    /// an `unauthorized` error.
    async fn authenticate(&self, token: Option<String>) -> Result<ResolvedSession, Error>;
}
