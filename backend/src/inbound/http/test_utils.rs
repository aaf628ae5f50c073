//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::Key;
use actix_web::web;

use crate::domain::ports::{
    MockAccountCommand, MockAuthenticator, MockIssueLifecycleCommand, MockIssueQuery,
    MockIssueSubmission, MockTriageDashboard,
};
use crate::domain::{Principal, ResolvedSession};

use super::state::HttpState;

/// Build a session middleware configured for tests.
///
/// - Generates a fresh signing/encryption key per invocation.
/// - Sets the cookie name to `session` and disables the `Secure` flag for
///   local HTTP tests.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// HTTP state whose ports are expectation-free mocks; `configure` swaps in
/// the ones a test exercises. Any unexpected port call panics.
pub fn http_state(configure: impl FnOnce(&mut HttpState)) -> web::Data<HttpState> {
    let mut state = HttpState {
        authenticator: Arc::new(MockAuthenticator::new()),
        accounts: Arc::new(MockAccountCommand::new()),
        submission: Arc::new(MockIssueSubmission::new()),
        lifecycle: Arc::new(MockIssueLifecycleCommand::new()),
        issues: Arc::new(MockIssueQuery::new()),
        dashboard: Arc::new(MockTriageDashboard::new()),
    };
    configure(&mut state);
    web::Data::new(state)
}

/// Authenticator accepting any request as `principal`.
pub fn authenticated_as(principal: Principal) -> Arc<MockAuthenticator> {
    let mut authenticator = MockAuthenticator::new();
    authenticator.expect_authenticate().returning(move |_| {
        Ok(ResolvedSession {
            principal: principal.clone(),
            expires_at: chrono::Utc::now() + chrono::TimeDelta::hours(1),
        })
    });
    Arc::new(authenticator)
}
