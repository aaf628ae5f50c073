//! Translation of driven-port failures into domain errors.

use serde_json::json;
use tracing::debug;

use super::Error;
use super::ports::{IdentityProviderError, IssueRepositoryError, PasswordResetNotifierError};

pub(crate) fn map_issue_repository_error(error: IssueRepositoryError) -> Error {
    debug!(kind = error.kind(), %error, "issue repository call failed");
    match error {
        IssueRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("issue repository unavailable: {message}"))
        }
        IssueRepositoryError::Query { message } => {
            Error::internal(format!("issue repository error: {message}"))
        }
        IssueRepositoryError::NotFound { id } => Error::not_found(format!("issue {id} not found"))
            .with_details(json!({ "issueId": id.to_string() })),
        IssueRepositoryError::VersionMismatch { expected, actual } => Error::conflict(
            "issue was modified concurrently; re-read and retry",
        )
        .with_details(json!({
            "expectedVersion": expected.get(),
            "actualVersion": actual.get(),
        })),
    }
}

pub(crate) fn map_identity_error(error: IdentityProviderError) -> Error {
    debug!(kind = error.kind(), %error, "identity provider call failed");
    match error {
        IdentityProviderError::Connection { message } => {
            Error::service_unavailable(format!("identity provider unavailable: {message}"))
        }
        IdentityProviderError::Query { message } => {
            Error::internal(format!("identity provider error: {message}"))
        }
        IdentityProviderError::InvalidCredentials => {
            Error::unauthorized("invalid email or password")
        }
        IdentityProviderError::EmailTaken { email } => {
            Error::invalid_request(format!("email {email} is already registered"))
                .with_details(json!({ "field": "email", "code": "email_taken" }))
        }
        IdentityProviderError::InactiveSession => Error::unauthorized("session is not active"),
        IdentityProviderError::InvalidResetToken => {
            Error::invalid_request("password reset token is invalid or expired")
                .with_details(json!({ "field": "token", "code": "invalid_token" }))
        }
    }
}

pub(crate) fn map_notifier_error(error: PasswordResetNotifierError) -> Error {
    debug!(kind = error.kind(), %error, "password reset notifier call failed");
    match error {
        PasswordResetNotifierError::Delivery { message } => {
            Error::service_unavailable(format!("password reset delivery unavailable: {message}"))
        }
    }
}
