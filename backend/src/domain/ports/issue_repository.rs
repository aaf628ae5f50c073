//! Port for issue persistence.
//!
//! The repository is the only shared mutable resource in the system. Status
//! writes go exclusively through [`IssueRepository::compare_and_update_status`]
//! so racing transitions on the same issue serialise on the stored version.

use async_trait::async_trait;

use crate::domain::{Issue, IssueFilter, IssueId, IssueStatus, IssueVersion, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by issue repository adapters.
    pub enum IssueRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "issue repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "issue repository query failed: {message}",
        /// No issue exists with the given id.
        NotFound { id: IssueId } =>
            "issue {id} not found",
        /// The stored version moved on since the caller read it.
        VersionMismatch { expected: IssueVersion, actual: IssueVersion } =>
            "version mismatch: expected {expected}, found {actual}",
    }
}

/// Port for issue storage and retrieval.
///
/// # Ordering
///
/// Every listing is ordered by `created_at` descending.
///
/// # Version semantics
///
/// - New issues are stored at [`IssueVersion::INITIAL`].
/// - A successful status swap stores the new status at `expected.next()`.
/// - `id`, `owner` and `created_at` are never rewritten.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IssueRepository: Send + Sync {
    /// Persist a freshly opened issue and return it as stored.
    async fn create(&self, issue: &Issue) -> Result<Issue, IssueRepositoryError>;

    /// Fetch one issue. Returns `None` when the id is unknown.
    async fn get(&self, id: &IssueId) -> Result<Option<Issue>, IssueRepositoryError>;

    /// Issues owned by `owner`, newest first.
    async fn list_by_owner(&self, owner: &UserId) -> Result<Vec<Issue>, IssueRepositoryError>;

    /// Every issue matching `filter`, newest first.
    async fn list_all(&self, filter: &IssueFilter) -> Result<Vec<Issue>, IssueRepositoryError>;

    /// Atomically set `status` if the stored version still equals `expected`.
    ///
    /// Fails with [`IssueRepositoryError::VersionMismatch`] when another
    /// writer got there first and [`IssueRepositoryError::NotFound`] when the
    /// issue vanished.
    async fn compare_and_update_status(
        &self,
        id: &IssueId,
        expected: IssueVersion,
        status: IssueStatus,
    ) -> Result<Issue, IssueRepositoryError>;
}
