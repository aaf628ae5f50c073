//! Driving port for reading issues with ownership-aware visibility.

use async_trait::async_trait;

use crate::domain::{Error, Issue, IssueId, IssueStatus, Principal, TextQuery, UserId};

/// Listing parameters. Reporters may only pass their own id (or none).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListIssuesRequest {
    pub owner: Option<UserId>,
    pub status: Option<IssueStatus>,
    pub text: Option<TextQuery>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IssueQuery: Send + Sync {
    /// Issues visible to `principal`, newest first.
    async fn list_issues(
        &self,
        principal: &Principal,
        request: ListIssuesRequest,
    ) -> Result<Vec<Issue>, Error>;

    /// One issue, if visible to `principal`.
    async fn get_issue(&self, principal: &Principal, id: IssueId) -> Result<Issue, Error>;
}
