//! Domain primitives, aggregates and services.
//!
//! Purpose: model principals, sessions and issues as validated types, keep
//! the issue lifecycle and capability table in one place each, and expose the
//! use-cases through driving ports so inbound adapters never see storage.
//!
//! Public surface:
//! - Error / ErrorCode: transport-agnostic failures with audit details.
//! - Principal, Role, UserId and friends: who is acting.
//! - Issue, IssueStatus, IssueFilter: what is being triaged.
//! - AuthorizationGate, IssueLifecycleService, IssueSubmissionService,
//!   IssueQueryService, AccountService: use-case implementations.

pub mod accounts;
pub mod aggregation;
pub mod auth;
pub mod authorization;
pub mod error;
pub mod issue;
pub mod issue_queries;
pub mod lifecycle;
pub mod ports;
mod repository_errors;
pub mod submission;
pub mod trace_id;
pub mod user;

pub use self::accounts::AccountService;
pub use self::aggregation::{StatusCounts, counts_by_status, drill_down};
pub use self::auth::{
    LoginCredentials, LoginValidationError, NewPassword, PASSWORD_MIN,
    PASSWORD_RESET_TTL_MINUTES, PasswordResetGrant, PasswordResetToken, Registration,
    ResolvedSession, SessionGrant, SessionToken, TokenFormatError,
};
pub use self::authorization::{AuthorizationGate, Capability, Decision, authorize};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::issue::{
    GeoPoint, ImageRef, Issue, IssueDescription, IssueFilter, IssueId, IssueParts, IssueStatus,
    IssueTitle, IssueValidationError, IssueVersion, NewIssue, TextQuery, UnknownIssueStatus,
};
pub use self::issue_queries::IssueQueryService;
pub use self::lifecycle::IssueLifecycleService;
pub use self::submission::{IssueSubmissionService, MAX_IMAGE_BYTES};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user::{
    AvatarRef, ContactDetails, DisplayName, EmailAddress, PhoneNumber, PostalAddress, Principal,
    ReporterProfile, Role, UserId, UserValidationError,
};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use civic_triage::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
