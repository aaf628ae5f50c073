//! Authorization gate: session resolution and capability checks.
//!
//! Every role decision in the system goes through [`authorize`]. Callers get
//! back a [`Decision`], never a role string, and turn a deny into a
//! `forbidden` error with [`Decision::require`] before touching any port.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::{debug, warn};

use super::ports::{Authenticator, IdentityProvider, IdentityProviderError};
use super::{Error, Principal, ResolvedSession, Role, SessionToken};

/// Fixed set of permissions evaluated by the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// File a new issue.
    SubmitIssue,
    /// Read issues one owns.
    ReadOwnIssues,
    /// Read every issue regardless of owner.
    ReadAllIssues,
    /// Administrator-only operations: status transitions and the dashboard.
    AdminOnly,
}

impl Capability {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SubmitIssue => "submit-issue",
            Self::ReadOwnIssues => "read-own-issues",
            Self::ReadAllIssues => "read-all-issues",
            Self::AdminOnly => "admin-only",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a capability check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        self == Self::Allow
    }

    /// Turn a deny into a `forbidden` error naming `capability`.
    pub fn require(self, principal: &Principal, capability: Capability) -> Result<(), Error> {
        match self {
            Self::Allow => Ok(()),
            Self::Deny => {
                warn!(
                    principal_id = %principal.id(),
                    capability = %capability,
                    "capability denied"
                );
                Err(Error::forbidden(format!("{capability} capability required"))
                    .with_details(json!({
                        "capability": capability.as_str(),
                        "principalId": principal.id().as_ref(),
                    })))
            }
        }
    }
}

/// The single capability table.
pub fn authorize(principal: &Principal, capability: Capability) -> Decision {
    let allowed = match capability {
        Capability::SubmitIssue | Capability::ReadOwnIssues => true,
        Capability::ReadAllIssues | Capability::AdminOnly => principal.role() == Role::Admin,
    };
    if allowed {
        Decision::Allow
    } else {
        Decision::Deny
    }
}

/// Shorthand for `authorize(principal, capability).require(principal, capability)`.
pub fn require(principal: &Principal, capability: Capability) -> Result<(), Error> {
    authorize(principal, capability).require(principal, capability)
}

/// Resolves presented tokens through the identity provider.
///
/// Nothing is cached: each call re-reads the session so a demoted principal
/// loses privileges on their very next request.
#[derive(Clone)]
pub struct AuthorizationGate<P> {
    identity: Arc<P>,
    clock: Arc<dyn Clock>,
}

impl<P> AuthorizationGate<P> {
    pub fn new(identity: Arc<P>, clock: Arc<dyn Clock>) -> Self {
        Self { identity, clock }
    }
}

fn unauthenticated() -> Error {
    Error::unauthorized("login required")
}

#[async_trait]
impl<P> Authenticator for AuthorizationGate<P>
where
    P: IdentityProvider,
{
    async fn authenticate(&self, token: Option<String>) -> Result<ResolvedSession, Error> {
        let Some(raw) = token else {
            return Err(unauthenticated());
        };
        let token = SessionToken::parse(raw.trim()).map_err(|err| {
            debug!(error = %err, "rejecting presented session token");
            unauthenticated()
        })?;

        let session = self
            .identity
            .resolve_session(&token)
            .await
            .map_err(|err| match err {
                IdentityProviderError::Connection { message } => {
                    Error::service_unavailable(format!("identity provider unavailable: {message}"))
                }
                other => Error::internal(format!("identity provider error: {other}")),
            })?
            .ok_or_else(unauthenticated)?;

        if session.expires_at <= self.clock.utc() {
            debug!(principal_id = %session.principal.id(), "session expired");
            return Err(unauthenticated());
        }
        Ok(session)
    }
}
