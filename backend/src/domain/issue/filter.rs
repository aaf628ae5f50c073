//! Read-side filters shared by repository listings and dashboard drill-down.

use super::{Issue, IssueStatus};

/// Case-insensitive substring query over title and description.
///
/// All-whitespace input means "no text filter" and is represented by `None`
/// at construction. Any other input is kept verbatim, surrounding spaces
/// included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextQuery(String);

impl TextQuery {
    /// Build a query from raw user input; returns `None` for blank text.
    pub fn new(raw: impl AsRef<str>) -> Option<Self> {
        let raw = raw.as_ref();
        (!raw.trim().is_empty()).then(|| Self(raw.to_lowercase()))
    }

    /// Lower-cased needle.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn matches(&self, issue: &Issue) -> bool {
        issue.title().as_ref().to_lowercase().contains(&self.0)
            || issue.description().as_ref().to_lowercase().contains(&self.0)
    }
}

/// Optional status equality plus optional text match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueFilter {
    pub status: Option<IssueStatus>,
    pub text: Option<TextQuery>,
}

impl IssueFilter {
    pub fn new(status: Option<IssueStatus>, text: Option<TextQuery>) -> Self {
        Self { status, text }
    }

    pub fn matches(&self, issue: &Issue) -> bool {
        self.status.is_none_or(|status| issue.status() == status)
            && self.text.as_ref().is_none_or(|text| text.matches(issue))
    }
}
