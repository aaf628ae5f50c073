//! Server construction and middleware wiring.

mod config;
mod settings;
mod state_builders;

pub use config::{ServerConfig, UploadConfig};
pub use settings::{AppSettings, SettingsError};

use state_builders::build_http_state;

use std::sync::Arc;

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
use chrono::TimeDelta;
use mockable::{Clock, DefaultClock};
use tracing::info;

use civic_triage::Trace;
#[cfg(debug_assertions)]
use civic_triage::doc::ApiDoc;
use civic_triage::inbound::http::configure_api;
use civic_triage::inbound::http::health::{HealthState, live, ready};
use civic_triage::inbound::http::session_config::SessionSettings;
use civic_triage::inbound::http::session_config::fingerprint::key_fingerprint;
use civic_triage::inbound::http::state::HttpState;
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

#[derive(Clone)]
struct AppDependencies {
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
    session: SessionSettings,
    session_ttl: TimeDelta,
}

fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        http_state,
        session,
        session_ttl,
    } = deps;

    let api = web::scope("/api/v1")
        .wrap(session.middleware(session_ttl))
        .configure(configure_api);

    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .wrap(Trace)
        .service(api)
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    app
}

/// Construct an Actix HTTP server using the provided health state and
/// configuration.
///
/// # Errors
///
/// Propagates [`std::io::Error`] when the upload directory cannot be opened,
/// the administrator cannot be seeded, or the socket cannot be bound.
pub async fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let http_state = build_http_state(&config, clock).await?;
    info!(
        bind_addr = %config.bind_addr(),
        session_key = %key_fingerprint(&config.session.key),
        "starting HTTP server"
    );

    let bind_addr = config.bind_addr();
    let ServerConfig {
        session,
        session_ttl,
        ..
    } = config;
    let server_health_state = health_state.clone();
    let server = HttpServer::new(move || {
        build_app(AppDependencies {
            health_state: server_health_state.clone(),
            http_state: http_state.clone(),
            session: session.clone(),
            session_ttl,
        })
    })
    .bind(bind_addr)?
    .run();

    health_state.mark_ready();
    Ok(server)
}
