//! Application settings loaded via OrthoConfig.
//!
//! Values come from `CIVIC_*` environment variables, CLI flags or a config
//! file. Unset values fall back to the defaults exposed by the accessors.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use chrono::TimeDelta;
use ortho_config::OrthoConfig;
use serde::Deserialize;

use civic_triage::domain::{GeoPoint, IssueValidationError, LoginValidationError, Registration};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_SESSION_TTL_MINUTES: i64 = 120;
/// Thirty days.
const MAX_SESSION_TTL_MINUTES: i64 = 43_200;
// Bangkok city centre; reports without coordinates are pinned here.
const DEFAULT_LATITUDE: f64 = 13.7563;
const DEFAULT_LONGITUDE: f64 = 100.5018;
const DEFAULT_UPLOAD_DIR: &str = "uploads";
const DEFAULT_PUBLIC_BASE_URL: &str = "/uploads";
const DEFAULT_ADMIN_NAME: &str = "Administrator";
const DEFAULT_PASSWORD_RESET_URL: &str = "/reset-password";

/// Runtime settings for the triage server.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "CIVIC")]
pub struct AppSettings {
    /// Interface to bind.
    pub host: Option<IpAddr>,
    /// Port to bind.
    pub port: Option<u16>,
    /// PostgreSQL URL. In-memory adapters are used when absent.
    pub database_url: Option<String>,
    /// Lifetime of a session in minutes.
    pub session_ttl_minutes: Option<i64>,
    /// Latitude used for reports submitted without coordinates.
    pub default_latitude: Option<f64>,
    /// Longitude used for reports submitted without coordinates.
    pub default_longitude: Option<f64>,
    /// Directory receiving uploaded photos.
    pub upload_dir: Option<PathBuf>,
    /// URL prefix under which uploaded photos are served.
    pub public_base_url: Option<String>,
    /// Email of an administrator to seed at startup.
    pub admin_email: Option<String>,
    /// Password of the seeded administrator.
    pub admin_password: Option<String>,
    /// Display name of the seeded administrator.
    pub admin_display_name: Option<String>,
    /// Page that accepts a reset token; the token is appended as a query
    /// parameter.
    pub password_reset_url: Option<String>,
}

/// Invalid combination of settings detected at startup.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("default location is invalid: {0}")]
    DefaultLocation(#[from] IssueValidationError),
    #[error("session TTL must be between 1 and {max} minutes, got {minutes}", max = MAX_SESSION_TTL_MINUTES)]
    SessionTtl { minutes: i64 },
    #[error("seeded administrator is invalid: {0}")]
    Admin(#[from] LoginValidationError),
    #[error("CIVIC_ADMIN_EMAIL and CIVIC_ADMIN_PASSWORD must be set together")]
    PartialAdmin,
}

impl AppSettings {
    /// Socket address to bind.
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(
            self.host.unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED)),
            self.port.unwrap_or(DEFAULT_PORT),
        )
    }

    /// Session lifetime shared by the identity provider and the cookie.
    pub fn session_ttl(&self) -> Result<TimeDelta, SettingsError> {
        let minutes = self
            .session_ttl_minutes
            .unwrap_or(DEFAULT_SESSION_TTL_MINUTES);
        if !(1..=MAX_SESSION_TTL_MINUTES).contains(&minutes) {
            return Err(SettingsError::SessionTtl { minutes });
        }
        TimeDelta::try_minutes(minutes).ok_or(SettingsError::SessionTtl { minutes })
    }

    /// Location assigned to submissions that carry no coordinates.
    pub fn default_location(&self) -> Result<GeoPoint, SettingsError> {
        Ok(GeoPoint::new(
            self.default_latitude.unwrap_or(DEFAULT_LATITUDE),
            self.default_longitude.unwrap_or(DEFAULT_LONGITUDE),
        )?)
    }

    pub fn upload_dir(&self) -> PathBuf {
        self.upload_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_UPLOAD_DIR))
    }

    pub fn public_base_url(&self) -> &str {
        self.public_base_url
            .as_deref()
            .unwrap_or(DEFAULT_PUBLIC_BASE_URL)
    }

    pub fn password_reset_url(&self) -> &str {
        self.password_reset_url
            .as_deref()
            .unwrap_or(DEFAULT_PASSWORD_RESET_URL)
    }

    /// Administrator to seed, if both email and password are configured.
    pub fn admin_registration(&self) -> Result<Option<Registration>, SettingsError> {
        match (&self.admin_email, &self.admin_password) {
            (None, None) => Ok(None),
            (Some(email), Some(password)) => {
                let name = self
                    .admin_display_name
                    .as_deref()
                    .unwrap_or(DEFAULT_ADMIN_NAME);
                Ok(Some(Registration::try_from_parts(
                    email, password, name, None,
                )?))
            }
            _ => Err(SettingsError::PartialAdmin),
        }
    }
}
