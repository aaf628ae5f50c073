//! Driving port for moving an issue through its status lifecycle.

use async_trait::async_trait;

use crate::domain::{Error, Issue, IssueId, IssueStatus, IssueVersion, Principal};

/// Requested status change.
///
/// `expected_version` lets a client pin the version it last saw; a stale pin
/// fails with `conflict` before any write is attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionIssueRequest {
    pub issue_id: IssueId,
    pub requested: IssueStatus,
    pub expected_version: Option<IssueVersion>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IssueLifecycleCommand: Send + Sync {
    /// Apply a status transition on behalf of `principal`.
    async fn transition(
        &self,
        principal: &Principal,
        request: TransitionIssueRequest,
    ) -> Result<Issue, Error>;
}
