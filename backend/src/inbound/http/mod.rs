//! HTTP inbound adapter exposing the REST endpoints.
//!
//! Handlers translate requests into driving-port calls and map domain
//! [`Error`](crate::domain::Error) codes onto status codes. [`configure_api`]
//! registers everything that lives under `/api/v1`; the caller decides which
//! session middleware wraps that scope.

pub mod accounts;
pub mod admin;
pub mod auth;
pub mod dto;
pub mod error;
pub mod health;
pub mod issues;
pub mod schemas;
pub mod session;
pub mod session_config;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod validation;

use actix_web::web;

use crate::domain::{Error, MAX_IMAGE_BYTES};

pub use error::ApiResult;

/// Register the `/api/v1` handlers and their extractor limits.
///
/// Image bodies may reach one byte past the domain cap so the oversize check
/// reports a validation error instead of a bare 413.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::PayloadConfig::new(MAX_IMAGE_BYTES + 1))
        .app_data(
            web::JsonConfig::default()
                .error_handler(|err, _| Error::invalid_request(err.to_string()).into()),
        )
        .app_data(
            web::QueryConfig::default()
                .error_handler(|err, _| Error::invalid_request(err.to_string()).into()),
        )
        .service(accounts::sign_up)
        .service(accounts::sign_in)
        .service(accounts::sign_out)
        .service(accounts::current_session)
        .service(accounts::change_password)
        .service(accounts::request_password_reset)
        .service(accounts::confirm_password_reset)
        .service(issues::upload_image)
        .service(issues::create_issue)
        .service(issues::list_issues)
        .service(issues::get_issue)
        .service(issues::transition_issue)
        .service(admin::dashboard)
        .service(admin::triage_issues);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use actix_web::http::StatusCode;
    use actix_web::{App, test};

    #[actix_web::test]
    async fn malformed_json_yields_domain_error_body() {
        let app = test::init_service(
            App::new()
                .app_data(test_utils::http_state(|_| {}))
                .service(web::scope("/api/v1").configure(configure_api)),
        )
        .await;
        let req = test::TestRequest::post()
            .uri("/api/v1/auth/sign-in")
            .insert_header(("content-type", "application/json"))
            .set_payload("{not json")
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Error = test::read_body_json(res).await;
        assert_eq!(body.code(), ErrorCode::InvalidRequest);
    }
}
