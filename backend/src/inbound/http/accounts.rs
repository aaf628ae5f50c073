//! Account API handlers.
//!
//! ```text
//! POST /api/v1/auth/sign-up {"email":"ada@example.org","password":"secret1","confirmPassword":"secret1","displayName":"Ada"}
//! POST /api/v1/auth/sign-in {"email":"ada@example.org","password":"secret1"}
//! POST /api/v1/auth/sign-out
//! GET  /api/v1/auth/session
//! POST /api/v1/auth/password {"password":"secret2","confirmPassword":"secret2"}
//! POST /api/v1/auth/password-reset {"email":"ada@example.org"}
//! POST /api/v1/auth/password-reset/confirm {"token":"<hex>","password":"secret2","confirmPassword":"secret2"}
//! ```

use actix_web::{HttpRequest, HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{Error, LoginCredentials, NewPassword, Registration, SessionToken};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::{Authenticated, presented_token};
use crate::inbound::http::dto::PrincipalResponse;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, login_validation_error, parse_email, parse_reset_token,
};

/// Sign-up request body for `POST /api/v1/auth/sign-up`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    /// Must repeat `password` exactly.
    pub confirm_password: String,
    pub display_name: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

/// Sign-in request body for `POST /api/v1/auth/sign-in`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

/// Body of `POST /api/v1/auth/password`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub password: String,
    pub confirm_password: String,
}

/// Body of `POST /api/v1/auth/password-reset`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PasswordResetRequest {
    pub email: String,
}

/// Body of `POST /api/v1/auth/password-reset/confirm`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmPasswordResetRequest {
    /// Token delivered by the reset link.
    pub token: String,
    pub password: String,
    pub confirm_password: String,
}

/// Session established by sign-in, or reported by `GET /auth/session`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub principal: PrincipalResponse,
    /// Bearer token; only present in the sign-in response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    pub expires_at: String,
}

/// Register a new reporter account.
#[utoipa::path(
    post,
    path = "/api/v1/auth/sign-up",
    request_body = SignUpRequest,
    responses(
        (status = 201, description = "Account created", body = PrincipalResponse),
        (status = 400, description = "Invalid request, mismatched confirmation or email taken", body = ErrorSchema),
        (status = 503, description = "Identity provider unavailable", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["auth"],
    operation_id = "signUp",
    security([])
)]
#[post("/auth/sign-up")]
pub async fn sign_up(
    state: web::Data<HttpState>,
    payload: web::Json<SignUpRequest>,
) -> ApiResult<HttpResponse> {
    let SignUpRequest {
        email,
        password,
        confirm_password,
        display_name,
        avatar_url,
        phone,
        address,
    } = payload.into_inner();
    let registration =
        Registration::try_from_parts(&email, &password, &display_name, avatar_url.as_deref())
            .and_then(|registration| {
                NewPassword::confirmed(&password, &confirm_password).map(|_| registration)
            })
            .and_then(|registration| registration.with_contact(phone.as_deref(), address.as_deref()))
            .map_err(|err| login_validation_error(&err))?;
    let principal = state.accounts.sign_up(registration).await?;
    Ok(HttpResponse::Created().json(PrincipalResponse::from(&principal)))
}

/// Verify credentials and open a session.
///
/// The token is stored in the session cookie and also returned in the body
/// for clients that prefer `Authorization: Bearer`.
#[utoipa::path(
    post,
    path = "/api/v1/auth/sign-in",
    request_body = SignInRequest,
    responses(
        (status = 200, description = "Signed in", body = SessionResponse, headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Invalid credentials", body = ErrorSchema),
        (status = 503, description = "Identity provider unavailable", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["auth"],
    operation_id = "signIn",
    security([])
)]
#[post("/auth/sign-in")]
pub async fn sign_in(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<SignInRequest>,
) -> ApiResult<web::Json<SessionResponse>> {
    let SignInRequest { email, password } = payload.into_inner();
    let credentials = LoginCredentials::try_from_parts(&email, &password)
        .map_err(|err| login_validation_error(&err))?;
    let grant = state.accounts.sign_in(credentials).await?;
    session.persist_token(&grant.token)?;
    Ok(web::Json(SessionResponse {
        principal: PrincipalResponse::from(&grant.principal),
        token: Some(grant.token.expose().to_owned()),
        expires_at: grant.expires_at.to_rfc3339(),
    }))
}

/// Session token presented with `req`, or `unauthorized`.
fn session_token(req: &HttpRequest) -> Result<SessionToken, Error> {
    let raw = presented_token(req)?.ok_or_else(|| Error::unauthorized("login required"))?;
    SessionToken::parse(raw.trim()).map_err(|err| {
        debug!(error = %err, "malformed session token presented");
        Error::unauthorized("login required")
    })
}

/// Revoke the presented session and clear the cookie.
#[utoipa::path(
    post,
    path = "/api/v1/auth/sign-out",
    responses(
        (status = 204, description = "Signed out"),
        (status = 401, description = "No session presented", body = ErrorSchema),
        (status = 503, description = "Identity provider unavailable", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["auth"],
    operation_id = "signOut"
)]
#[post("/auth/sign-out")]
pub async fn sign_out(
    req: HttpRequest,
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<HttpResponse> {
    let token = session_token(&req)?;
    state.accounts.sign_out(token).await?;
    session.purge();
    Ok(HttpResponse::NoContent().finish())
}

/// Report the current principal and session expiry.
#[utoipa::path(
    get,
    path = "/api/v1/auth/session",
    responses(
        (status = 200, description = "Current session", body = SessionResponse),
        (status = 401, description = "Unauthenticated", body = ErrorSchema),
        (status = 503, description = "Identity provider unavailable", body = ErrorSchema)
    ),
    tags = ["auth"],
    operation_id = "currentSession"
)]
#[get("/auth/session")]
pub async fn current_session(auth: Authenticated) -> web::Json<SessionResponse> {
    web::Json(SessionResponse {
        principal: PrincipalResponse::from(&auth.principal),
        token: None,
        expires_at: auth.expires_at.to_rfc3339(),
    })
}

/// Change the password of the signed-in principal.
///
/// The presented session stays valid; every other session of the principal
/// is revoked.
#[utoipa::path(
    post,
    path = "/api/v1/auth/password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 204, description = "Password changed"),
        (status = 400, description = "Password too short or confirmation mismatch", body = ErrorSchema),
        (status = 401, description = "Unauthenticated", body = ErrorSchema),
        (status = 503, description = "Identity provider unavailable", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["auth"],
    operation_id = "changePassword"
)]
#[post("/auth/password")]
pub async fn change_password(
    req: HttpRequest,
    state: web::Data<HttpState>,
    _auth: Authenticated,
    payload: web::Json<ChangePasswordRequest>,
) -> ApiResult<HttpResponse> {
    let ChangePasswordRequest {
        password,
        confirm_password,
    } = payload.into_inner();
    let password = NewPassword::confirmed(&password, &confirm_password)
        .map_err(|err| login_validation_error(&err))?;
    let token = session_token(&req)?;
    state.accounts.change_password(token, password).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Ask for a password reset link.
///
/// Always answers 202 for a well-formed address, whether or not an account
/// uses it.
#[utoipa::path(
    post,
    path = "/api/v1/auth/password-reset",
    request_body = PasswordResetRequest,
    responses(
        (status = 202, description = "Reset link sent if the account exists"),
        (status = 400, description = "Malformed email", body = ErrorSchema),
        (status = 503, description = "Identity provider or delivery unavailable", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["auth"],
    operation_id = "requestPasswordReset",
    security([])
)]
#[post("/auth/password-reset")]
pub async fn request_password_reset(
    state: web::Data<HttpState>,
    payload: web::Json<PasswordResetRequest>,
) -> ApiResult<HttpResponse> {
    let email = parse_email(&payload.email, FieldName::new("email"))?;
    state.accounts.request_password_reset(email).await?;
    Ok(HttpResponse::Accepted().finish())
}

/// Set a new password with a reset token. Signs the account out everywhere.
#[utoipa::path(
    post,
    path = "/api/v1/auth/password-reset/confirm",
    request_body = ConfirmPasswordResetRequest,
    responses(
        (status = 204, description = "Password reset"),
        (status = 400, description = "Invalid, spent or expired token, or bad password", body = ErrorSchema),
        (status = 503, description = "Identity provider unavailable", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["auth"],
    operation_id = "confirmPasswordReset",
    security([])
)]
#[post("/auth/password-reset/confirm")]
pub async fn confirm_password_reset(
    state: web::Data<HttpState>,
    payload: web::Json<ConfirmPasswordResetRequest>,
) -> ApiResult<HttpResponse> {
    let ConfirmPasswordResetRequest {
        token,
        password,
        confirm_password,
    } = payload.into_inner();
    let token = parse_reset_token(&token, FieldName::new("token"))?;
    let password = NewPassword::confirmed(&password, &confirm_password)
        .map_err(|err| login_validation_error(&err))?;
    state.accounts.reset_password(token, password).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{MockAccountCommand, MockAuthenticator};
    use crate::domain::{PasswordResetToken, Role, SessionGrant};
    use crate::inbound::http::test_utils::{authenticated_as, http_state, test_session_middleware};
    use crate::test_support::{principal, reporter};
    use actix_web::http::StatusCode;
    use actix_web::{App, test as actix_test};
    use chrono::{TimeZone, Utc};
    use rstest::rstest;
    use serde_json::Value;
    use std::sync::Arc;

    fn test_app(
        state: web::Data<HttpState>,
    ) -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        App::new().app_data(state).wrap(test_session_middleware()).service(
            web::scope("/api/v1")
                .service(sign_up)
                .service(sign_in)
                .service(sign_out)
                .service(current_session)
                .service(change_password)
                .service(request_password_reset)
                .service(confirm_password_reset),
        )
    }

    fn sign_up_body(
        email: &str,
        password: &str,
        confirm_password: &str,
        display_name: &str,
    ) -> SignUpRequest {
        SignUpRequest {
            email: email.into(),
            password: password.into(),
            confirm_password: confirm_password.into(),
            display_name: display_name.into(),
            avatar_url: None,
            phone: None,
            address: None,
        }
    }

    fn unauthenticated() -> Arc<MockAuthenticator> {
        let mut authenticator = MockAuthenticator::new();
        authenticator
            .expect_authenticate()
            .returning(|_| Err(Error::unauthorized("login required")));
        Arc::new(authenticator)
    }

    async fn post_json(
        state: web::Data<HttpState>,
        uri: &str,
        bearer: Option<&str>,
        body: Value,
    ) -> actix_web::dev::ServiceResponse {
        let app = actix_test::init_service(test_app(state)).await;
        let mut request = actix_test::TestRequest::post().uri(uri).set_json(body);
        if let Some(token) = bearer {
            request = request.insert_header(("Authorization", format!("Bearer {token}")));
        }
        actix_test::call_service(&app, request.to_request()).await
    }

    #[rstest]
    #[case("not-an-email", "secret1", "Ada", "email")]
    #[case("ada@example.org", "123", "Ada", "password")]
    #[case("ada@example.org", "secret1", "A", "displayName")]
    #[actix_web::test]
    async fn sign_up_rejects_invalid_fields(
        #[case] email: &str,
        #[case] password: &str,
        #[case] display_name: &str,
        #[case] field: &str,
    ) {
        let state = http_state(|state| {
            let mut accounts = MockAccountCommand::new();
            accounts.expect_sign_up().never();
            state.accounts = Arc::new(accounts);
        });
        let app = actix_test::init_service(test_app(state)).await;
        let request = actix_test::TestRequest::post()
            .uri("/api/v1/auth/sign-up")
            .set_json(sign_up_body(email, password, password, display_name))
            .to_request();

        let response = actix_test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(body["code"], "invalid_request");
        assert_eq!(body["details"]["field"], field);
    }

    #[actix_web::test]
    async fn sign_up_returns_created_reporter() {
        let state = http_state(|state| {
            let mut accounts = MockAccountCommand::new();
            accounts.expect_sign_up().times(1).returning(|registration| {
                Ok(principal(
                    Role::Reporter,
                    registration.display_name().as_ref(),
                    registration.credentials().email().as_ref(),
                ))
            });
            state.accounts = Arc::new(accounts);
        });
        let app = actix_test::init_service(test_app(state)).await;
        let request = actix_test::TestRequest::post()
            .uri("/api/v1/auth/sign-up")
            .set_json(sign_up_body("Ada@Example.org", "secret1", "secret1", "Ada"))
            .to_request();

        let response = actix_test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body: PrincipalResponse = actix_test::read_body_json(response).await;
        assert_eq!(body.role, "reporter");
        assert_eq!(body.email, "ada@example.org");
    }

    #[actix_web::test]
    async fn sign_in_sets_cookie_and_returns_token() {
        let expires_at = Utc
            .with_ymd_and_hms(2026, 3, 1, 9, 0, 0)
            .single()
            .expect("timestamp");
        let token = SessionToken::generate();
        let expected_token = token.expose().to_owned();
        let state = http_state(|state| {
            let mut accounts = MockAccountCommand::new();
            accounts.expect_sign_in().times(1).return_once(move |_| {
                Ok(SessionGrant {
                    token,
                    principal: reporter(),
                    expires_at,
                })
            });
            state.accounts = Arc::new(accounts);
        });
        let app = actix_test::init_service(test_app(state)).await;
        let request = actix_test::TestRequest::post()
            .uri("/api/v1/auth/sign-in")
            .set_json(SignInRequest {
                email: "reporter@example.org".into(),
                password: "secret1".into(),
            })
            .to_request();

        let response = actix_test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(
            response
                .response()
                .cookies()
                .any(|cookie| cookie.name() == "session")
        );
        let body: SessionResponse = actix_test::read_body_json(response).await;
        assert_eq!(body.token.as_deref(), Some(expected_token.as_str()));
        assert_eq!(body.expires_at, expires_at.to_rfc3339());
    }

    #[actix_web::test]
    async fn sign_out_without_token_is_unauthorised() {
        let state = http_state(|state| {
            let mut accounts = MockAccountCommand::new();
            accounts.expect_sign_out().never();
            state.accounts = Arc::new(accounts);
        });
        let app = actix_test::init_service(test_app(state)).await;
        let request = actix_test::TestRequest::post()
            .uri("/api/v1/auth/sign-out")
            .to_request();

        let response = actix_test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn sign_out_revokes_bearer_token() {
        let token = SessionToken::generate();
        let digest = token.digest();
        let header = format!("Bearer {}", token.expose());
        let state = http_state(|state| {
            let mut accounts = MockAccountCommand::new();
            accounts
                .expect_sign_out()
                .withf(move |presented| presented.digest() == digest)
                .times(1)
                .returning(|_| Ok(()));
            state.accounts = Arc::new(accounts);
        });
        let app = actix_test::init_service(test_app(state)).await;
        let request = actix_test::TestRequest::post()
            .uri("/api/v1/auth/sign-out")
            .insert_header(("Authorization", header))
            .to_request();

        let response = actix_test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[actix_web::test]
    async fn current_session_reports_principal() {
        let admin = principal(Role::Admin, "Triage Lead", "lead@example.org");
        let state = http_state(|state| state.authenticator = authenticated_as(admin.clone()));
        let app = actix_test::init_service(test_app(state)).await;
        let request = actix_test::TestRequest::get()
            .uri("/api/v1/auth/session")
            .to_request();

        let response = actix_test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body: SessionResponse = actix_test::read_body_json(response).await;
        assert_eq!(body.principal.role, "admin");
        assert_eq!(body.principal.id, admin.id().to_string());
        assert!(body.token.is_none());
    }

    #[actix_web::test]
    async fn sign_up_rejects_mismatched_confirmation() {
        let state = http_state(|state| {
            let mut accounts = MockAccountCommand::new();
            accounts.expect_sign_up().never();
            state.accounts = Arc::new(accounts);
        });
        let body = serde_json::to_value(sign_up_body("ada@example.org", "secret1", "secret2", "Ada"))
            .expect("json");

        let response = post_json(state, "/api/v1/auth/sign-up", None, body).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(body["details"]["field"], "confirmPassword");
    }

    #[actix_web::test]
    async fn sign_up_forwards_contact_details() {
        let state = http_state(|state| {
            let mut accounts = MockAccountCommand::new();
            accounts
                .expect_sign_up()
                .withf(|registration| {
                    let contact = registration.contact();
                    contact.phone.as_ref().map(|phone| phone.as_ref()) == Some("+66 2 123 4567")
                        && contact.address.is_none()
                })
                .times(1)
                .returning(|registration| {
                    Ok(principal(
                        Role::Reporter,
                        registration.display_name().as_ref(),
                        registration.credentials().email().as_ref(),
                    )
                    .with_contact(registration.contact().clone()))
                });
            state.accounts = Arc::new(accounts);
        });
        let mut request = sign_up_body("ada@example.org", "secret1", "secret1", "Ada");
        request.phone = Some("+66 2 123 4567".into());
        request.address = Some("   ".into());
        let body = serde_json::to_value(request).expect("json");

        let response = post_json(state, "/api/v1/auth/sign-up", None, body).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(body["phone"], "+66 2 123 4567");
        assert!(body.get("address").is_none());
    }

    #[actix_web::test]
    async fn change_password_requires_a_session() {
        let state = http_state(|state| {
            state.authenticator = unauthenticated();
            let mut accounts = MockAccountCommand::new();
            accounts.expect_change_password().never();
            state.accounts = Arc::new(accounts);
        });
        let body = serde_json::json!({ "password": "secret22", "confirmPassword": "secret22" });

        let response = post_json(state, "/api/v1/auth/password", None, body).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn change_password_uses_the_presented_session() {
        let token = SessionToken::generate();
        let digest = token.digest();
        let state = http_state(|state| {
            state.authenticator = authenticated_as(reporter());
            let mut accounts = MockAccountCommand::new();
            accounts
                .expect_change_password()
                .withf(move |presented, password| {
                    presented.digest() == digest && password.expose() == "secret22"
                })
                .times(1)
                .returning(|_, _| Ok(()));
            state.accounts = Arc::new(accounts);
        });
        let body = serde_json::json!({ "password": "secret22", "confirmPassword": "secret22" });

        let response =
            post_json(state, "/api/v1/auth/password", Some(token.expose()), body).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[rstest]
    #[case("secret22", "secret23", "confirmPassword")]
    #[case("abc", "abc", "password")]
    #[actix_web::test]
    async fn change_password_validates_the_new_password(
        #[case] password: &str,
        #[case] confirmation: &str,
        #[case] field: &str,
    ) {
        let token = SessionToken::generate();
        let state = http_state(|state| {
            state.authenticator = authenticated_as(reporter());
            let mut accounts = MockAccountCommand::new();
            accounts.expect_change_password().never();
            state.accounts = Arc::new(accounts);
        });
        let body = serde_json::json!({ "password": password, "confirmPassword": confirmation });

        let response =
            post_json(state, "/api/v1/auth/password", Some(token.expose()), body).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(body["details"]["field"], field);
    }

    #[actix_web::test]
    async fn reset_request_is_accepted() {
        let state = http_state(|state| {
            let mut accounts = MockAccountCommand::new();
            accounts
                .expect_request_password_reset()
                .withf(|email| email.as_ref() == "ada@example.org")
                .times(1)
                .returning(|_| Ok(()));
            state.accounts = Arc::new(accounts);
        });
        let body = serde_json::json!({ "email": "Ada@Example.org" });

        let response = post_json(state, "/api/v1/auth/password-reset", None, body).await;
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }

    #[actix_web::test]
    async fn reset_request_rejects_malformed_email() {
        let state = http_state(|state| {
            let mut accounts = MockAccountCommand::new();
            accounts.expect_request_password_reset().never();
            state.accounts = Arc::new(accounts);
        });
        let body = serde_json::json!({ "email": "not-an-email" });

        let response = post_json(state, "/api/v1/auth/password-reset", None, body).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(body["details"]["field"], "email");
    }

    #[actix_web::test]
    async fn reset_confirmation_rejects_malformed_token() {
        let state = http_state(|state| {
            let mut accounts = MockAccountCommand::new();
            accounts.expect_reset_password().never();
            state.accounts = Arc::new(accounts);
        });
        let body = serde_json::json!({
            "token": "not-hex",
            "password": "secret22",
            "confirmPassword": "secret22",
        });

        let response = post_json(state, "/api/v1/auth/password-reset/confirm", None, body).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(body["details"]["field"], "token");
        assert_eq!(body["details"]["code"], "invalid_token");
    }

    #[actix_web::test]
    async fn reset_confirmation_forwards_token_and_password() {
        let token = PasswordResetToken::generate();
        let expected = token.clone();
        let state = http_state(|state| {
            let mut accounts = MockAccountCommand::new();
            accounts
                .expect_reset_password()
                .withf(move |presented, password| {
                    *presented == expected && password.expose() == "secret22"
                })
                .times(1)
                .returning(|_, _| Ok(()));
            state.accounts = Arc::new(accounts);
        });
        let body = serde_json::json!({
            "token": token.expose(),
            "password": "secret22",
            "confirmPassword": "secret22",
        });

        let response = post_json(state, "/api/v1/auth/password-reset/confirm", None, body).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }
}
