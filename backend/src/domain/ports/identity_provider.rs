//! Port for the external identity provider.
//!
//! The provider owns credentials, profiles and session records. The rest of
//! the system only ever sees opaque [`SessionToken`]s and resolved
//! [`Principal`]s.

use async_trait::async_trait;

use crate::domain::{
    EmailAddress, LoginCredentials, NewPassword, PasswordResetGrant, PasswordResetToken, Principal,
    Registration, ReporterProfile, ResolvedSession, SessionGrant, SessionToken, UserId,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by identity provider adapters.
    pub enum IdentityProviderError {
        /// Provider could not be reached.
        Connection { message: String } =>
            "identity provider unreachable: {message}",
        /// Provider answered with an unexpected failure.
        Query { message: String } =>
            "identity provider request failed: {message}",
        /// Email/password pair did not match an account.
        InvalidCredentials => "invalid email or password",
        /// Sign-up collided with an existing account.
        EmailTaken { email: String } =>
            "email {email} is already registered",
        /// The session backing a password change is unknown or expired.
        InactiveSession => "session is not active",
        /// Reset token is unknown, already used or expired.
        InvalidResetToken => "password reset token is invalid or expired",
    }
}

/// Identity provider boundary: accounts, sessions and password management.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Create an account. New principals always hold the reporter role.
    async fn sign_up(&self, registration: &Registration) -> Result<Principal, IdentityProviderError>;

    /// Verify credentials and open a session.
    async fn sign_in(
        &self,
        credentials: &LoginCredentials,
    ) -> Result<SessionGrant, IdentityProviderError>;

    /// Revoke a session. Unknown tokens are ignored.
    async fn sign_out(&self, token: &SessionToken) -> Result<(), IdentityProviderError>;

    /// Look up the live session for `token`, with the principal's current
    /// role. Returns `None` for unknown or revoked tokens.
    async fn resolve_session(
        &self,
        token: &SessionToken,
    ) -> Result<Option<ResolvedSession>, IdentityProviderError>;

    /// Profiles for the given ids; unknown ids are simply absent.
    async fn find_profiles(
        &self,
        ids: &[UserId],
    ) -> Result<Vec<ReporterProfile>, IdentityProviderError>;

    /// Replace the password of the principal behind the live session
    /// `token`. Every other session of that principal is revoked.
    async fn change_password(
        &self,
        token: &SessionToken,
        password: &NewPassword,
    ) -> Result<(), IdentityProviderError>;

    /// Mint a single-use reset token for `email`. Returns `None` when no
    /// account uses that address.
    async fn issue_password_reset(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<PasswordResetGrant>, IdentityProviderError>;

    /// Consume `token` and set `password`. All sessions of the account are
    /// revoked.
    async fn redeem_password_reset(
        &self,
        token: &PasswordResetToken,
        password: &NewPassword,
    ) -> Result<(), IdentityProviderError>;
}
