//! Read side: ownership-aware issue queries and the triage dashboard.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::warn;

use super::aggregation::{StatusCounts, counts_by_status, drill_down};
use super::authorization::{Capability, authorize, require};
use super::ports::{
    IdentityProvider, IssueQuery, IssueRepository, ListIssuesRequest, TriageDashboard, TriageRow,
    UNKNOWN_REPORTER_EMAIL, UNKNOWN_REPORTER_NAME,
};
use super::repository_errors::map_issue_repository_error;
use super::{Error, Issue, IssueFilter, IssueId, IssueStatus, Principal, TextQuery, UserId};

/// Query service implementing [`IssueQuery`] and [`TriageDashboard`].
#[derive(Clone)]
pub struct IssueQueryService<R, P> {
    issues: Arc<R>,
    identity: Arc<P>,
}

impl<R, P> IssueQueryService<R, P> {
    pub fn new(issues: Arc<R>, identity: Arc<P>) -> Self {
        Self { issues, identity }
    }
}

fn hidden_issue(id: IssueId) -> Error {
    Error::not_found(format!("issue {id} not found"))
        .with_details(json!({ "issueId": id.to_string() }))
}

impl<R, P> IssueQueryService<R, P>
where
    R: IssueRepository,
{
    async fn owned_by(&self, owner: &UserId, filter: &IssueFilter) -> Result<Vec<Issue>, Error> {
        let issues = self
            .issues
            .list_by_owner(owner)
            .await
            .map_err(map_issue_repository_error)?;
        Ok(issues
            .into_iter()
            .filter(|issue| filter.matches(issue))
            .collect())
    }

    async fn snapshot(&self, filter: &IssueFilter) -> Result<Vec<Issue>, Error> {
        self.issues
            .list_all(filter)
            .await
            .map_err(map_issue_repository_error)
    }
}

#[async_trait]
impl<R, P> IssueQuery for IssueQueryService<R, P>
where
    R: IssueRepository,
    P: Send + Sync,
{
    async fn list_issues(
        &self,
        principal: &Principal,
        request: ListIssuesRequest,
    ) -> Result<Vec<Issue>, Error> {
        require(principal, Capability::ReadOwnIssues)?;
        let ListIssuesRequest {
            owner,
            status,
            text,
        } = request;
        let filter = IssueFilter::new(status, text);
        let sees_all = authorize(principal, Capability::ReadAllIssues);

        match owner {
            None if sees_all.is_allowed() => self.snapshot(&filter).await,
            None => self.owned_by(principal.id(), &filter).await,
            Some(owner) if &owner == principal.id() => self.owned_by(&owner, &filter).await,
            Some(owner) => {
                sees_all
                    .require(principal, Capability::ReadAllIssues)
                    .map_err(|err| {
                        err.with_details(json!({
                            "capability": Capability::ReadAllIssues.as_str(),
                            "ownerId": owner.as_ref(),
                        }))
                    })?;
                self.owned_by(&owner, &filter).await
            }
        }
    }

    async fn get_issue(&self, principal: &Principal, id: IssueId) -> Result<Issue, Error> {
        require(principal, Capability::ReadOwnIssues)?;
        let issue = self
            .issues
            .get(&id)
            .await
            .map_err(map_issue_repository_error)?
            .ok_or_else(|| hidden_issue(id))?;

        // Reporters get the same answer for "not yours" and "does not exist".
        let visible = issue.owner() == principal.id()
            || authorize(principal, Capability::ReadAllIssues).is_allowed();
        if visible { Ok(issue) } else { Err(hidden_issue(id)) }
    }
}

impl<R, P> IssueQueryService<R, P>
where
    P: IdentityProvider,
{
    async fn label(&self, issues: Vec<Issue>) -> Vec<TriageRow> {
        let mut seen = HashSet::new();
        let owners: Vec<UserId> = issues
            .iter()
            .map(|issue| issue.owner().clone())
            .filter(|owner| seen.insert(owner.clone()))
            .collect();

        let profiles = if owners.is_empty() {
            HashMap::new()
        } else {
            match self.identity.find_profiles(&owners).await {
                Ok(profiles) => profiles
                    .into_iter()
                    .map(|profile| (profile.id.clone(), profile))
                    .collect(),
                Err(err) => {
                    warn!(error = %err, "reporter profile lookup failed; using placeholders");
                    HashMap::new()
                }
            }
        };

        issues
            .into_iter()
            .map(|issue| {
                let profile = profiles.get(issue.owner());
                TriageRow {
                    reporter_name: profile.map_or_else(
                        || UNKNOWN_REPORTER_NAME.to_owned(),
                        |p| p.display_name.to_string(),
                    ),
                    reporter_email: profile.map_or_else(
                        || UNKNOWN_REPORTER_EMAIL.to_owned(),
                        |p| p.email.to_string(),
                    ),
                    issue,
                }
            })
            .collect()
    }
}

#[async_trait]
impl<R, P> TriageDashboard for IssueQueryService<R, P>
where
    R: IssueRepository,
    P: IdentityProvider,
{
    async fn status_counts(&self, principal: &Principal) -> Result<StatusCounts, Error> {
        require(principal, Capability::AdminOnly)?;
        let snapshot = self.snapshot(&IssueFilter::default()).await?;
        Ok(counts_by_status(&snapshot))
    }

    async fn triage_list(
        &self,
        principal: &Principal,
        status: Option<IssueStatus>,
        text: Option<TextQuery>,
    ) -> Result<Vec<TriageRow>, Error> {
        require(principal, Capability::AdminOnly)?;
        let issues = match status {
            Some(status) => {
                let snapshot = self.snapshot(&IssueFilter::default()).await?;
                drill_down(&snapshot, status, text.as_ref())
            }
            None => self.snapshot(&IssueFilter::new(None, text)).await?,
        };
        Ok(self.label(issues).await)
    }
}

#[cfg(test)]
#[path = "issue_queries_tests.rs"]
mod tests;
