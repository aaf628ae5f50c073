//! Shared validation helpers for inbound HTTP adapters.
//!
//! Every helper produces an `invalid_request` error whose `details` name the
//! offending `field` and a stable `code`.

use serde_json::json;

use crate::domain::{
    EmailAddress, Error, IssueId, IssueStatus, IssueVersion, LoginValidationError,
    PasswordResetToken, TextQuery, UserId,
};

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    InvalidUuid,
    InvalidStatus,
    InvalidVersion,
    InvalidToken,
    ValidationFailed,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            ErrorCode::InvalidUuid => "invalid_uuid",
            ErrorCode::InvalidStatus => "invalid_status",
            ErrorCode::InvalidVersion => "invalid_version",
            ErrorCode::InvalidToken => "invalid_token",
            ErrorCode::ValidationFailed => "validation_failed",
        }
    }
}

/// Newtype wrapper for HTTP field names to provide type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(&self) -> &'static str {
        self.0
    }
}

/// Builder for validation errors with field context.
struct ValidationError {
    field: &'static str,
    message: String,
}

impl ValidationError {
    fn new(field: FieldName, message: impl Into<String>) -> Self {
        Self {
            field: field.as_str(),
            message: message.into(),
        }
    }

    fn with_code(self, code: ErrorCode) -> Error {
        Error::invalid_request(self.message).with_details(json!({
            "field": self.field,
            "code": code.as_str(),
        }))
    }

    fn with_value(self, code: ErrorCode, value: impl Into<String>) -> Error {
        Error::invalid_request(self.message).with_details(json!({
            "field": self.field,
            "value": value.into(),
            "code": code.as_str(),
        }))
    }
}

pub(crate) fn invalid_uuid_error(field: FieldName, value: &str) -> Error {
    ValidationError::new(field, format!("{} must be a valid UUID", field.as_str()))
        .with_value(ErrorCode::InvalidUuid, value)
}

pub(crate) fn parse_issue_id(value: &str, field: FieldName) -> Result<IssueId, Error> {
    IssueId::parse(value).map_err(|_| invalid_uuid_error(field, value))
}

pub(crate) fn parse_user_id(value: &str, field: FieldName) -> Result<UserId, Error> {
    UserId::new(value).map_err(|_| invalid_uuid_error(field, value))
}

pub(crate) fn parse_status(value: &str, field: FieldName) -> Result<IssueStatus, Error> {
    value.parse().map_err(|err: crate::domain::UnknownIssueStatus| {
        ValidationError::new(field, err.to_string()).with_value(ErrorCode::InvalidStatus, value)
    })
}

pub(crate) fn parse_optional_status(
    value: Option<&str>,
    field: FieldName,
) -> Result<Option<IssueStatus>, Error> {
    value
        .filter(|raw| !raw.trim().is_empty())
        .map(|raw| parse_status(raw.trim(), field))
        .transpose()
}

pub(crate) fn parse_version(value: u64, field: FieldName) -> Result<IssueVersion, Error> {
    IssueVersion::new(value).map_err(|err| {
        ValidationError::new(field, err.to_string())
            .with_value(ErrorCode::InvalidVersion, value.to_string())
    })
}

/// Blank search text means "no text filter".
pub(crate) fn text_query(value: Option<&str>) -> Option<TextQuery> {
    value.and_then(TextQuery::new)
}

pub(crate) fn login_validation_error(err: &LoginValidationError) -> Error {
    ValidationError::new(FieldName::new(err.field()), err.to_string())
        .with_code(ErrorCode::ValidationFailed)
}

pub(crate) fn parse_email(value: &str, field: FieldName) -> Result<EmailAddress, Error> {
    EmailAddress::new(value).map_err(|err| {
        ValidationError::new(field, err.to_string()).with_code(ErrorCode::ValidationFailed)
    })
}

/// The token text is never echoed back in error details.
pub(crate) fn parse_reset_token(value: &str, field: FieldName) -> Result<PasswordResetToken, Error> {
    PasswordResetToken::parse(value.trim()).map_err(|err| {
        ValidationError::new(field, err.to_string()).with_code(ErrorCode::InvalidToken)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn invalid_uuid_reports_field_and_value() {
        let err = parse_issue_id("nope", FieldName::new("id")).expect_err("invalid id");
        let details = err.details().expect("details");
        assert_eq!(details["field"], "id");
        assert_eq!(details["value"], "nope");
        assert_eq!(details["code"], "invalid_uuid");
    }

    #[rstest]
    #[case(None, None)]
    #[case(Some(""), None)]
    #[case(Some(" in_progress "), Some(IssueStatus::InProgress))]
    fn optional_status_accepts_blank_and_known_labels(
        #[case] raw: Option<&str>,
        #[case] expected: Option<IssueStatus>,
    ) {
        assert_eq!(
            parse_optional_status(raw, FieldName::new("status")).expect("valid"),
            expected
        );
    }

    #[rstest]
    fn unknown_status_is_rejected() {
        let err = parse_status("archived", FieldName::new("status")).expect_err("unknown");
        assert_eq!(err.details().expect("details")["code"], "invalid_status");
    }

    #[rstest]
    fn zero_version_is_rejected() {
        let err = parse_version(0, FieldName::new("expectedVersion")).expect_err("zero");
        assert_eq!(err.details().expect("details")["field"], "expectedVersion");
    }

    #[rstest]
    fn malformed_reset_token_is_not_echoed() {
        let err = parse_reset_token("abc123", FieldName::new("token")).expect_err("malformed");
        let details = err.details().expect("details");
        assert_eq!(details["field"], "token");
        assert_eq!(details["code"], "invalid_token");
        assert!(details.get("value").is_none());
    }

    #[rstest]
    fn reset_token_tolerates_surrounding_whitespace() {
        let token = PasswordResetToken::generate();
        let padded = format!(" {} ", token.expose());
        assert_eq!(
            parse_reset_token(&padded, FieldName::new("token")).expect("valid"),
            token
        );
    }

    #[rstest]
    fn bad_email_names_the_field() {
        let err = parse_email("not-an-email", FieldName::new("email")).expect_err("invalid");
        assert_eq!(err.details().expect("details")["field"], "email");
    }

    #[rstest]
    fn login_errors_name_their_field() {
        let err = LoginValidationError::PasswordTooShort { min: 6 };
        let mapped = login_validation_error(&err);
        assert_eq!(mapped.details().expect("details")["field"], "password");
    }
}
