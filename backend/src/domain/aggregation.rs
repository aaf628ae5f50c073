//! Dashboard aggregation: per-status totals and drill-down.
//!
//! Pure functions over a repository snapshot. Nothing here is persisted, so
//! a dashboard refresh simply reflects whatever the last read returned.

use serde::Serialize;

use super::issue::{Issue, IssueStatus, TextQuery, sort_newest_first};

/// Number of issues in each known status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub pending: usize,
    pub in_progress: usize,
    pub resolved: usize,
}

impl StatusCounts {
    pub fn get(&self, status: IssueStatus) -> usize {
        match status {
            IssueStatus::Pending => self.pending,
            IssueStatus::InProgress => self.in_progress,
            IssueStatus::Resolved => self.resolved,
        }
    }

    pub fn total(&self) -> usize {
        self.pending + self.in_progress + self.resolved
    }

    fn record(&mut self, status: IssueStatus) {
        match status {
            IssueStatus::Pending => self.pending += 1,
            IssueStatus::InProgress => self.in_progress += 1,
            IssueStatus::Resolved => self.resolved += 1,
        }
    }
}

/// Tally issues by status.
///
/// Status is a closed enum, so an issue with an unrecognised status can not
/// reach this function; storage adapters drop such records when decoding.
pub fn counts_by_status<'a>(issues: impl IntoIterator<Item = &'a Issue>) -> StatusCounts {
    issues
        .into_iter()
        .fold(StatusCounts::default(), |mut counts, issue| {
            counts.record(issue.status());
            counts
        })
}

/// Issues in exactly `status`, optionally narrowed by `text`, newest first.
pub fn drill_down<'a>(
    issues: impl IntoIterator<Item = &'a Issue>,
    status: IssueStatus,
    text: Option<&TextQuery>,
) -> Vec<Issue> {
    let mut matching: Vec<Issue> = issues
        .into_iter()
        .filter(|issue| issue.status() == status)
        .filter(|issue| text.is_none_or(|query| query.matches(issue)))
        .cloned()
        .collect();
    sort_newest_first(&mut matching);
    matching
}
