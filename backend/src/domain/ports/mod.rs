//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (`IssueRepository`, `IdentityProvider`, `ObjectStorage`,
//! `PasswordResetNotifier`) are implemented by outbound adapters. Driving ports are implemented by domain
//! services and called by inbound adapters.

mod macros;
pub(crate) use macros::define_port_error;

mod account_command;
mod authenticator;
mod identity_provider;
mod issue_lifecycle_command;
mod issue_query;
mod issue_repository;
mod issue_submission;
mod object_storage;
mod password_reset_notifier;
mod triage_dashboard;

pub use account_command::AccountCommand;
#[cfg(test)]
pub use account_command::MockAccountCommand;
pub use authenticator::Authenticator;
#[cfg(test)]
pub use authenticator::MockAuthenticator;
#[cfg(test)]
pub use identity_provider::MockIdentityProvider;
pub use identity_provider::{IdentityProvider, IdentityProviderError};
#[cfg(test)]
pub use issue_lifecycle_command::MockIssueLifecycleCommand;
pub use issue_lifecycle_command::{IssueLifecycleCommand, TransitionIssueRequest};
#[cfg(test)]
pub use issue_query::MockIssueQuery;
pub use issue_query::{IssueQuery, ListIssuesRequest};
#[cfg(test)]
pub use issue_repository::MockIssueRepository;
pub use issue_repository::{IssueRepository, IssueRepositoryError};
#[cfg(test)]
pub use issue_submission::MockIssueSubmission;
pub use issue_submission::{ImageUpload, IssueSubmission, SubmitIssueRequest};
#[cfg(test)]
pub use object_storage::MockObjectStorage;
pub use object_storage::{ObjectStorage, ObjectStorageError};
#[cfg(test)]
pub use password_reset_notifier::MockPasswordResetNotifier;
pub use password_reset_notifier::{PasswordResetNotifier, PasswordResetNotifierError};
#[cfg(test)]
pub use triage_dashboard::MockTriageDashboard;
pub use triage_dashboard::{
    TriageDashboard, TriageRow, UNKNOWN_REPORTER_EMAIL, UNKNOWN_REPORTER_NAME,
};
