//! Server entry-point: loads settings, wires adapters and serves the API.

mod server;

use actix_web::web;
use color_eyre::eyre::WrapErr;
use mockable::DefaultEnv;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use civic_triage::inbound::http::health::HealthState;
use civic_triage::inbound::http::session_config::{BuildMode, session_settings_from_env};
use civic_triage::outbound::persistence::{DbPool, PoolConfig, run_pending_migrations};
use server::{AppSettings, ServerConfig, UploadConfig, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    if let Err(error) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(%error, "tracing init failed");
    }

    let settings = AppSettings::load().wrap_err("failed to load settings")?;
    let session = session_settings_from_env(&DefaultEnv::new(), BuildMode::from_debug_assertions())
        .wrap_err("invalid session configuration")?;

    let config = ServerConfig::new(
        session,
        settings.session_ttl()?,
        settings.bind_addr(),
        settings.default_location()?,
        UploadConfig::new(settings.upload_dir(), settings.public_base_url()),
    )
    .with_admin(settings.admin_registration()?)
    .with_password_reset_url(settings.password_reset_url());

    let config = match settings.database_url.as_deref() {
        Some(url) => {
            run_pending_migrations(url)
                .await
                .wrap_err("failed to apply database migrations")?;
            let pool = DbPool::new(PoolConfig::new(url))
                .await
                .wrap_err("failed to build database pool")?;
            config.with_db_pool(pool)
        }
        None => config,
    };

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state.clone(), config).await?;
    server.await?;
    health_state.mark_unhealthy();
    info!("server stopped");
    Ok(())
}
