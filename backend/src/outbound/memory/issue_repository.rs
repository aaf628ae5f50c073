//! `IssueRepository` backed by a mutex-guarded map.
//!
//! The compare-and-swap happens entirely under one lock acquisition, which
//! gives the same one-winner guarantee as the SQL adapter.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::ports::{IssueRepository, IssueRepositoryError};
use crate::domain::{Issue, IssueFilter, IssueId, IssueStatus, IssueVersion, UserId, issue};

#[derive(Debug, Default)]
pub struct InMemoryIssueRepository {
    issues: Mutex<HashMap<IssueId, Issue>>,
}

impl InMemoryIssueRepository {
    fn lock(&self) -> Result<MutexGuard<'_, HashMap<IssueId, Issue>>, IssueRepositoryError> {
        self.issues
            .lock()
            .map_err(|_| IssueRepositoryError::query("issue store lock poisoned"))
    }

    fn collect<F>(&self, keep: F) -> Result<Vec<Issue>, IssueRepositoryError>
    where
        F: Fn(&Issue) -> bool,
    {
        let mut matching: Vec<Issue> = self
            .lock()?
            .values()
            .filter(|issue| keep(issue))
            .cloned()
            .collect();
        issue::sort_newest_first(&mut matching);
        Ok(matching)
    }
}

#[async_trait]
impl IssueRepository for InMemoryIssueRepository {
    async fn create(&self, issue: &Issue) -> Result<Issue, IssueRepositoryError> {
        let mut issues = self.lock()?;
        if issues.contains_key(&issue.id()) {
            return Err(IssueRepositoryError::query("issue id already exists"));
        }
        issues.insert(issue.id(), issue.clone());
        Ok(issue.clone())
    }

    async fn get(&self, id: &IssueId) -> Result<Option<Issue>, IssueRepositoryError> {
        Ok(self.lock()?.get(id).cloned())
    }

    async fn list_by_owner(&self, owner: &UserId) -> Result<Vec<Issue>, IssueRepositoryError> {
        self.collect(|issue| issue.owner() == owner)
    }

    async fn list_all(&self, filter: &IssueFilter) -> Result<Vec<Issue>, IssueRepositoryError> {
        self.collect(|issue| filter.matches(issue))
    }

    async fn compare_and_update_status(
        &self,
        id: &IssueId,
        expected: IssueVersion,
        status: IssueStatus,
    ) -> Result<Issue, IssueRepositoryError> {
        let mut issues = self.lock()?;
        let current = issues
            .get_mut(id)
            .ok_or_else(|| IssueRepositoryError::not_found(*id))?;
        if current.version() != expected {
            return Err(IssueRepositoryError::version_mismatch(
                expected,
                current.version(),
            ));
        }
        *current = current.with_status(status);
        Ok(current.clone())
    }
}
