//! Issue lifecycle controller.
//!
//! A transition is authorize, read, validate the edge, then compare-and-swap
//! on the version that was read. Each step short-circuits, so a denied or
//! invalid request never reaches the write.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{info, warn};

use super::authorization::{Capability, require};
use super::ports::{
    IssueLifecycleCommand, IssueRepository, IssueRepositoryError, TransitionIssueRequest,
};
use super::repository_errors::map_issue_repository_error;
use super::{Error, Issue, Principal};

/// Lifecycle service implementing [`IssueLifecycleCommand`].
#[derive(Clone)]
pub struct IssueLifecycleService<R> {
    issues: Arc<R>,
}

impl<R> IssueLifecycleService<R> {
    pub fn new(issues: Arc<R>) -> Self {
        Self { issues }
    }
}

fn transition_context(request: &TransitionIssueRequest, issue: Option<&Issue>) -> serde_json::Value {
    json!({
        "issueId": request.issue_id.to_string(),
        "from": issue.map(|issue| issue.status().as_str()),
        "to": request.requested.as_str(),
    })
}

fn merge_details(error: Error, context: serde_json::Value) -> Error {
    let mut details = context;
    if let (Some(target), Some(serde_json::Value::Object(extra))) =
        (details.as_object_mut(), error.details().cloned())
    {
        target.extend(extra);
    }
    error.with_details(details)
}

#[async_trait]
impl<R> IssueLifecycleCommand for IssueLifecycleService<R>
where
    R: IssueRepository,
{
    async fn transition(
        &self,
        principal: &Principal,
        request: TransitionIssueRequest,
    ) -> Result<Issue, Error> {
        require(principal, Capability::AdminOnly)
            .map_err(|err| merge_details(err, transition_context(&request, None)))?;

        let current = self
            .issues
            .get(&request.issue_id)
            .await
            .map_err(map_issue_repository_error)?
            .ok_or_else(|| {
                Error::not_found(format!("issue {} not found", request.issue_id))
                    .with_details(transition_context(&request, None))
            })?;

        let from = current.status();
        if !from.can_transition_to(request.requested) {
            warn!(
                issue_id = %request.issue_id,
                from = %from,
                to = %request.requested,
                "invalid status transition"
            );
            let allowed: Vec<&str> = from
                .allowed_transitions()
                .iter()
                .map(|status| status.as_str())
                .collect();
            let mut details = transition_context(&request, Some(&current));
            if let Some(object) = details.as_object_mut() {
                object.insert("allowed".into(), json!(allowed));
            }
            return Err(Error::invalid_transition(format!(
                "cannot move issue from {from} to {}",
                request.requested
            ))
            .with_details(details));
        }

        if let Some(expected) = request
            .expected_version
            .filter(|expected| *expected != current.version())
        {
            warn!(
                issue_id = %request.issue_id,
                expected_version = %expected,
                actual_version = %current.version(),
                "stale expected version"
            );
            return Err(merge_details(
                map_issue_repository_error(IssueRepositoryError::version_mismatch(
                    expected,
                    current.version(),
                )),
                transition_context(&request, Some(&current)),
            ));
        }

        let updated = self
            .issues
            .compare_and_update_status(&request.issue_id, current.version(), request.requested)
            .await
            .map_err(|err| {
                if matches!(err, IssueRepositoryError::VersionMismatch { .. }) {
                    warn!(
                        issue_id = %request.issue_id,
                        from = %from,
                        to = %request.requested,
                        "concurrent status transition lost the race"
                    );
                }
                merge_details(
                    map_issue_repository_error(err),
                    transition_context(&request, Some(&current)),
                )
            })?;

        info!(
            issue_id = %updated.id(),
            from = %from,
            to = %updated.status(),
            version = %updated.version(),
            principal_id = %principal.id(),
            "issue status changed"
        );
        Ok(updated)
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
