//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on driving ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{
    AccountCommand, Authenticator, IssueLifecycleCommand, IssueQuery, IssueSubmission,
    TriageDashboard,
};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub authenticator: Arc<dyn Authenticator>,
    pub accounts: Arc<dyn AccountCommand>,
    pub submission: Arc<dyn IssueSubmission>,
    pub lifecycle: Arc<dyn IssueLifecycleCommand>,
    pub issues: Arc<dyn IssueQuery>,
    pub dashboard: Arc<dyn TriageDashboard>,
}
