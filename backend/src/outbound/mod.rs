//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL-backed issue repository and identity
//!   provider using Diesel ORM
//! - **memory**: process-local issue repository and identity provider used
//!   when no database is configured and by the integration tests
//! - **storage**: filesystem object store for uploaded photos
//! - **notifier**: logs password reset links during development
//!
//! Adapters are thin translators that convert between domain types and
//! infrastructure-specific representations. They contain no business logic.

mod credentials;
pub mod memory;
pub mod notifier;
pub mod persistence;
pub mod storage;
