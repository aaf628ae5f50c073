//! Driving port backing the administrator triage dashboard.

use async_trait::async_trait;

use crate::domain::{Error, Issue, IssueStatus, Principal, StatusCounts, TextQuery};

/// Label used when the reporter's profile cannot be found.
pub const UNKNOWN_REPORTER_NAME: &str = "unknown";
/// Placeholder used when the reporter's email cannot be found.
pub const UNKNOWN_REPORTER_EMAIL: &str = "-";

/// Issue joined with the reporter's public profile.
#[derive(Debug, Clone, PartialEq)]
pub struct TriageRow {
    pub issue: Issue,
    pub reporter_name: String,
    pub reporter_email: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TriageDashboard: Send + Sync {
    /// Per-status totals over the current snapshot.
    async fn status_counts(&self, principal: &Principal) -> Result<StatusCounts, Error>;

    /// Admin listing, optionally drilled down to one status and a text query.
    async fn triage_list(
        &self,
        principal: &Principal,
        status: Option<IssueStatus>,
        text: Option<TextQuery>,
    ) -> Result<Vec<TriageRow>, Error>;
}
