//! HTTP server configuration object and helpers.

use std::net::SocketAddr;
use std::path::PathBuf;

use chrono::TimeDelta;
use civic_triage::domain::{GeoPoint, Registration};
use civic_triage::inbound::http::session_config::SessionSettings;
use civic_triage::outbound::persistence::DbPool;

const DEFAULT_PASSWORD_RESET_URL: &str = "/reset-password";

/// Where uploaded photos are written and how they are addressed.
#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub(crate) dir: PathBuf,
    pub(crate) public_base_url: String,
}

impl UploadConfig {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            public_base_url: public_base_url.into(),
        }
    }
}

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) session: SessionSettings,
    pub(crate) session_ttl: TimeDelta,
    pub(crate) bind_addr: SocketAddr,
    pub(crate) default_location: GeoPoint,
    pub(crate) uploads: UploadConfig,
    pub(crate) db_pool: Option<DbPool>,
    pub(crate) admin: Option<Registration>,
    pub(crate) password_reset_url: String,
}

impl ServerConfig {
    /// Construct a configuration with in-memory persistence, no seeded
    /// administrator and reset links pointing at `/reset-password`.
    #[must_use]
    pub fn new(
        session: SessionSettings,
        session_ttl: TimeDelta,
        bind_addr: SocketAddr,
        default_location: GeoPoint,
        uploads: UploadConfig,
    ) -> Self {
        Self {
            session,
            session_ttl,
            bind_addr,
            default_location,
            uploads,
            db_pool: None,
            admin: None,
            password_reset_url: DEFAULT_PASSWORD_RESET_URL.to_owned(),
        }
    }

    /// Persist issues and accounts in PostgreSQL instead of memory.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    /// Seed an administrator account at startup.
    #[must_use]
    pub fn with_admin(mut self, admin: Option<Registration>) -> Self {
        self.admin = admin;
        self
    }

    /// Base URL of the page that redeems password reset tokens.
    #[must_use]
    pub fn with_password_reset_url(mut self, url: impl Into<String>) -> Self {
        self.password_reset_url = url.into();
        self
    }

    /// Return the socket address the server will bind to.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }
}
