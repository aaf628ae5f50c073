//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Repositories translate between Diesel rows (`models.rs`, `schema.rs`) and
//! domain types; both stay private to this module. Connections come from a
//! `bb8` pool through `diesel-async`, and all database failures are mapped to
//! the port's error type.
//!
//! # Example
//!
//! ```ignore
//! use civic_triage::outbound::persistence::{
//!     DbPool, DieselIdentityProvider, DieselIssueRepository, PoolConfig,
//! };
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/civic")).await?;
//! let repo = DieselIssueRepository::new(pool.clone());
//! let identity = DieselIdentityProvider::new(pool, Arc::new(DefaultClock), TimeDelta::hours(12));
//! ```

mod diesel_identity_provider;
mod diesel_issue_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_identity_provider::DieselIdentityProvider;
pub use diesel_issue_repository::DieselIssueRepository;
pub use migrations::{MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
