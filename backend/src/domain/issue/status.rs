//! Closed issue status enumeration and the allowed-transition table.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Lifecycle status of an issue.
///
/// `Pending` is initial and `Resolved` is terminal. The edges returned by
/// [`IssueStatus::allowed_transitions`] are the only legal moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueStatus {
    Pending,
    InProgress,
    Resolved,
}

impl IssueStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [IssueStatus; 3] = [Self::Pending, Self::InProgress, Self::Resolved];

    /// Statuses reachable from `self` in one step.
    pub fn allowed_transitions(self) -> &'static [IssueStatus] {
        match self {
            Self::Pending => &[Self::InProgress, Self::Resolved],
            Self::InProgress => &[Self::Resolved],
            Self::Resolved => &[],
        }
    }

    pub fn can_transition_to(self, next: IssueStatus) -> bool {
        self.allowed_transitions().contains(&next)
    }

    pub fn is_terminal(self) -> bool {
        self.allowed_transitions().is_empty()
    }

    /// Wire and storage label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Resolved => "resolved",
        }
    }
}

impl fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a status label is not one of the known values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownIssueStatus(pub String);

impl fmt::Display for UnknownIssueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown issue status `{}`; expected pending, in_progress, or resolved",
            self.0
        )
    }
}

impl std::error::Error for UnknownIssueStatus {}

impl FromStr for IssueStatus {
    type Err = UnknownIssueStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownIssueStatus(s.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    //! Transition table coverage.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(IssueStatus::Pending, IssueStatus::InProgress, true)]
    #[case(IssueStatus::Pending, IssueStatus::Resolved, true)]
    #[case(IssueStatus::Pending, IssueStatus::Pending, false)]
    #[case(IssueStatus::InProgress, IssueStatus::Resolved, true)]
    #[case(IssueStatus::InProgress, IssueStatus::Pending, false)]
    #[case(IssueStatus::InProgress, IssueStatus::InProgress, false)]
    #[case(IssueStatus::Resolved, IssueStatus::Pending, false)]
    #[case(IssueStatus::Resolved, IssueStatus::InProgress, false)]
    #[case(IssueStatus::Resolved, IssueStatus::Resolved, false)]
    fn transition_table(
        #[case] from: IssueStatus,
        #[case] to: IssueStatus,
        #[case] allowed: bool,
    ) {
        assert_eq!(from.can_transition_to(to), allowed);
    }

    #[rstest]
    fn only_resolved_is_terminal() {
        let terminal: Vec<_> = IssueStatus::ALL
            .into_iter()
            .filter(|status| status.is_terminal())
            .collect();
        assert_eq!(terminal, vec![IssueStatus::Resolved]);
    }

    #[rstest]
    #[case("pending", IssueStatus::Pending)]
    #[case("in_progress", IssueStatus::InProgress)]
    #[case("resolved", IssueStatus::Resolved)]
    fn labels_parse(#[case] raw: &str, #[case] expected: IssueStatus) {
        assert_eq!(raw.parse::<IssueStatus>(), Ok(expected));
        assert_eq!(expected.to_string(), raw);
    }

    #[rstest]
    #[case("archived")]
    #[case("Pending")]
    #[case("")]
    fn unknown_labels_fail(#[case] raw: &str) {
        assert_eq!(
            raw.parse::<IssueStatus>(),
            Err(UnknownIssueStatus(raw.to_owned()))
        );
    }

    #[rstest]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&IssueStatus::InProgress).expect("serialises");
        assert_eq!(json, "\"in_progress\"");
    }
}
