//! OpenAPI documentation for the REST API.
//!
//! [`ApiDoc`] registers every handler under `inbound::http`, the response
//! payloads, and the two ways a client can present its session token. Swagger
//! UI serves it in debug builds and `openapi-dump` prints it for tooling.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::inbound::http::accounts::{
    ChangePasswordRequest, ConfirmPasswordResetRequest, PasswordResetRequest, SessionResponse,
    SignInRequest, SignUpRequest,
};
use crate::inbound::http::dto::{
    IssueResponse, PrincipalResponse, StatusCountsResponse, TriageRowResponse,
};
use crate::inbound::http::issues::{CreateIssueRequest, ImageUploadResponse, TransitionRequest};
use crate::inbound::http::schemas::{ErrorCodeSchema, ErrorSchema};
use crate::inbound::http::session_config::SESSION_COOKIE_NAME;

/// Adds the session cookie and bearer token security schemes.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                SESSION_COOKIE_NAME,
                "Private session cookie set by POST /api/v1/auth/sign-in.",
            ))),
        );
        let mut bearer = Http::new(HttpAuthScheme::Bearer);
        bearer.description = Some("Session token returned by POST /api/v1/auth/sign-in.".into());
        components.add_security_scheme("BearerToken", SecurityScheme::Http(bearer));
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Civic triage API",
        description = "Community issue reporting and administrator triage."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = []), ("BearerToken" = [])),
    paths(
        crate::inbound::http::accounts::sign_up,
        crate::inbound::http::accounts::sign_in,
        crate::inbound::http::accounts::sign_out,
        crate::inbound::http::accounts::current_session,
        crate::inbound::http::accounts::change_password,
        crate::inbound::http::accounts::request_password_reset,
        crate::inbound::http::accounts::confirm_password_reset,
        crate::inbound::http::issues::upload_image,
        crate::inbound::http::issues::create_issue,
        crate::inbound::http::issues::list_issues,
        crate::inbound::http::issues::get_issue,
        crate::inbound::http::issues::transition_issue,
        crate::inbound::http::admin::dashboard,
        crate::inbound::http::admin::triage_issues,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        ErrorSchema,
        ErrorCodeSchema,
        PrincipalResponse,
        SessionResponse,
        SignUpRequest,
        SignInRequest,
        ChangePasswordRequest,
        PasswordResetRequest,
        ConfirmPasswordResetRequest,
        IssueResponse,
        CreateIssueRequest,
        TransitionRequest,
        ImageUploadResponse,
        TriageRowResponse,
        StatusCountsResponse,
    )),
    tags(
        (name = "auth", description = "Sign-up, sign-in, sessions and password recovery"),
        (name = "issues", description = "Reporting and reading issues"),
        (name = "admin", description = "Triage dashboard for administrators"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use utoipa::openapi::RefOr;
    use utoipa::openapi::schema::Schema;

    fn object_fields(name: &str) -> Vec<String> {
        let doc = ApiDoc::openapi();
        let schemas = doc.components.expect("components").schemas;
        match schemas.get(name).unwrap_or_else(|| panic!("{name} schema registered")) {
            RefOr::T(Schema::Object(obj)) => obj.properties.keys().cloned().collect(),
            _ => panic!("expected object schema for {name}"),
        }
    }

    #[rstest]
    #[case("Error", &["code", "message", "traceId", "details"])]
    #[case("IssueResponse", &["id", "title", "status", "ownerId", "version", "createdAt"])]
    #[case("StatusCountsResponse", &["pending", "inProgress", "resolved", "total"])]
    #[case("TransitionRequest", &["status", "expectedVersion"])]
    #[case("SignUpRequest", &["email", "password", "confirmPassword", "phone", "address"])]
    #[case("ConfirmPasswordResetRequest", &["token", "password", "confirmPassword"])]
    fn schemas_use_wire_field_names(#[case] name: &str, #[case] fields: &[&str]) {
        let present = object_fields(name);
        for field in fields {
            assert!(present.iter().any(|p| p == field), "{name} lacks {field}");
        }
    }

    #[rstest]
    #[case("/api/v1/auth/sign-in")]
    #[case("/api/v1/auth/password")]
    #[case("/api/v1/auth/password-reset")]
    #[case("/api/v1/auth/password-reset/confirm")]
    #[case("/api/v1/issues")]
    #[case("/api/v1/issues/{id}/status")]
    #[case("/api/v1/admin/dashboard")]
    #[case("/health/ready")]
    fn paths_are_registered(#[case] path: &str) {
        assert!(ApiDoc::openapi().paths.paths.contains_key(path));
    }

    #[rstest]
    fn both_session_schemes_are_documented() {
        let components = ApiDoc::openapi().components.expect("components");
        assert!(components.security_schemes.contains_key("SessionCookie"));
        assert!(components.security_schemes.contains_key("BearerToken"));
    }
}
