//! Wiring of driven adapters into the driving ports held by [`HttpState`].
//!
//! Issues and accounts live in PostgreSQL when a pool is configured and in
//! memory otherwise. Photos always go to the filesystem store and reset links
//! are written to the log.

use std::io;
use std::sync::Arc;

use actix_web::web;
use mockable::Clock;
use tracing::info;

use civic_triage::domain::ports::{IdentityProvider, IssueRepository};
use civic_triage::domain::{
    AccountService, AuthorizationGate, IssueLifecycleService, IssueQueryService,
    IssueSubmissionService, Principal,
};
use civic_triage::inbound::http::state::HttpState;
use civic_triage::outbound::memory::{InMemoryIdentityProvider, InMemoryIssueRepository};
use civic_triage::outbound::notifier::LogResetNotifier;
use civic_triage::outbound::persistence::{DieselIdentityProvider, DieselIssueRepository};
use civic_triage::outbound::storage::FilesystemObjectStorage;

use super::ServerConfig;

fn seed_failed(err: impl std::fmt::Display) -> io::Error {
    io::Error::other(format!("failed to seed administrator: {err}"))
}

fn announce_admin(principal: &Principal) {
    info!(principal_id = %principal.id(), "administrator account ready");
}

/// Build the HTTP state for `config`, seeding the configured administrator.
///
/// # Errors
///
/// Returns [`io::Error`] when the upload directory cannot be opened or the
/// administrator cannot be seeded.
pub(crate) async fn build_http_state(
    config: &ServerConfig,
    clock: Arc<dyn Clock>,
) -> io::Result<web::Data<HttpState>> {
    let storage = Arc::new(
        FilesystemObjectStorage::open(&config.uploads.dir, config.uploads.public_base_url.clone())
            .map_err(io::Error::other)?,
    );

    let state = match &config.db_pool {
        Some(pool) => {
            let identity = Arc::new(DieselIdentityProvider::new(
                pool.clone(),
                Arc::clone(&clock),
                config.session_ttl,
            ));
            if let Some(admin) = &config.admin {
                announce_admin(&identity.seed_admin(admin).await.map_err(seed_failed)?);
            }
            info!("issues and accounts persisted in PostgreSQL");
            wire(
                Arc::new(DieselIssueRepository::new(pool.clone())),
                identity,
                storage,
                clock,
                config,
            )
        }
        None => {
            let identity = Arc::new(InMemoryIdentityProvider::new(
                Arc::clone(&clock),
                config.session_ttl,
            ));
            if let Some(admin) = &config.admin {
                announce_admin(&identity.seed_admin(admin).map_err(seed_failed)?);
            }
            info!("no database configured; issues and accounts are kept in memory");
            wire(
                Arc::new(InMemoryIssueRepository::default()),
                identity,
                storage,
                clock,
                config,
            )
        }
    };
    Ok(web::Data::new(state))
}

fn wire<R, P>(
    issues: Arc<R>,
    identity: Arc<P>,
    storage: Arc<FilesystemObjectStorage>,
    clock: Arc<dyn Clock>,
    config: &ServerConfig,
) -> HttpState
where
    R: IssueRepository + 'static,
    P: IdentityProvider + 'static,
{
    let queries = Arc::new(IssueQueryService::new(
        Arc::clone(&issues),
        Arc::clone(&identity),
    ));
    let notifier = Arc::new(LogResetNotifier::new(config.password_reset_url.clone()));
    HttpState {
        authenticator: Arc::new(AuthorizationGate::new(
            Arc::clone(&identity),
            Arc::clone(&clock),
        )),
        accounts: Arc::new(AccountService::new(identity, notifier)),
        submission: Arc::new(IssueSubmissionService::new(
            Arc::clone(&issues),
            storage,
            clock,
            config.default_location,
        )),
        lifecycle: Arc::new(IssueLifecycleService::new(issues)),
        issues: queries.clone(),
        dashboard: queries,
    }
}
