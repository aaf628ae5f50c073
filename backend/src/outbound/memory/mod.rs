//! In-process adapters used when no database is configured and in tests.

mod identity_provider;
mod issue_repository;

pub use identity_provider::InMemoryIdentityProvider;
pub use issue_repository::InMemoryIssueRepository;
