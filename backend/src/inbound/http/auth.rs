//! Authentication extractor used by protected handlers.
//!
//! A request may present its session token as `Authorization: Bearer <token>`
//! or through the session cookie set at sign-in. The header wins when both
//! are present. Resolution itself is delegated to the [`Authenticator`] port.
//!
//! [`Authenticator`]: crate::domain::ports::Authenticator

use actix_web::http::header::AUTHORIZATION;
use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use chrono::{DateTime, Utc};
use futures_util::future::LocalBoxFuture;

use crate::domain::{Error, Principal};

use super::session::SessionContext;
use super::state::HttpState;

const BEARER_PREFIX: &str = "Bearer ";

/// Principal resolved from the presented session token.
#[derive(Debug, Clone)]
pub struct Authenticated {
    pub principal: Principal,
    pub expires_at: DateTime<Utc>,
}

fn malformed_header() -> Error {
    Error::unauthorized("malformed authorization header")
}

/// Token presented with the request, header first, cookie second.
pub(crate) fn presented_token(req: &HttpRequest) -> Result<Option<String>, Error> {
    if let Some(header) = req.headers().get(AUTHORIZATION) {
        let value = header.to_str().map_err(|_| malformed_header())?;
        let token = value
            .strip_prefix(BEARER_PREFIX)
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(malformed_header)?;
        return Ok(Some(token.to_owned()));
    }
    SessionContext::from_http_request(req).token()
}

impl FromRequest for Authenticated {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move {
            let state = req
                .app_data::<web::Data<HttpState>>()
                .cloned()
                .ok_or_else(|| Error::internal("HTTP state is not configured"))?;
            let token = presented_token(&req)?;
            let session = state.authenticator.authenticate(token).await?;
            Ok(Self {
                principal: session.principal,
                expires_at: session.expires_at,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::MockAuthenticator;
    use crate::domain::{ErrorCode, ResolvedSession};
    use crate::inbound::http::test_utils::{http_state, test_session_middleware};
    use crate::test_support::reporter;
    use actix_web::http::StatusCode;
    use actix_web::{App, HttpResponse, test};
    use rstest::rstest;

    async fn call_with(
        authenticator: MockAuthenticator,
        header: Option<&'static str>,
    ) -> StatusCode {
        let state = http_state(|state| state.authenticator = std::sync::Arc::new(authenticator));
        let app = test::init_service(
            App::new()
                .app_data(state)
                .wrap(test_session_middleware())
                .route(
                    "/whoami",
                    web::get().to(|auth: Authenticated| async move {
                        HttpResponse::Ok().body(auth.principal.id().to_string())
                    }),
                ),
        )
        .await;
        let mut request = test::TestRequest::get().uri("/whoami");
        if let Some(value) = header {
            request = request.insert_header((AUTHORIZATION, value));
        }
        test::call_service(&app, request.to_request()).await.status()
    }

    #[actix_web::test]
    async fn bearer_token_is_forwarded_to_the_authenticator() {
        let mut authenticator = MockAuthenticator::new();
        authenticator
            .expect_authenticate()
            .withf(|token| token.as_deref() == Some("abc123"))
            .times(1)
            .returning(|_| {
                Ok(ResolvedSession {
                    principal: reporter(),
                    expires_at: Utc::now(),
                })
            });

        assert_eq!(
            call_with(authenticator, Some("Bearer abc123")).await,
            StatusCode::OK
        );
    }

    #[rstest]
    #[case("Basic dXNlcjpwdw==")]
    #[case("Bearer ")]
    #[case("bearer abc123")]
    #[actix_web::test]
    async fn malformed_header_is_unauthorised(#[case] header: &'static str) {
        let mut authenticator = MockAuthenticator::new();
        authenticator.expect_authenticate().never();

        assert_eq!(
            call_with(authenticator, Some(header)).await,
            StatusCode::UNAUTHORIZED
        );
    }

    #[actix_web::test]
    async fn missing_credentials_reach_the_authenticator_as_none() {
        let mut authenticator = MockAuthenticator::new();
        authenticator
            .expect_authenticate()
            .withf(Option::is_none)
            .times(1)
            .returning(|_| Err(Error::unauthorized("login required")));

        assert_eq!(call_with(authenticator, None).await, StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn missing_state_is_an_internal_error() {
        let req = test::TestRequest::get().to_http_request();
        let err = Authenticated::extract(&req)
            .await
            .expect_err("state missing");
        assert_eq!(err.code(), ErrorCode::InternalError);
    }
}
