//! Driving port for account lifecycle and password management.

use async_trait::async_trait;

use crate::domain::{
    EmailAddress, Error, LoginCredentials, NewPassword, PasswordResetToken, Principal,
    Registration, SessionGrant, SessionToken,
};

/// Account use-cases exposed to inbound adapters.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountCommand: Send + Sync {
    /// Register a new reporter account.
    async fn sign_up(&self, registration: Registration) -> Result<Principal, Error>;

    /// Exchange credentials for a session.
    async fn sign_in(&self, credentials: LoginCredentials) -> Result<SessionGrant, Error>;

    /// Revoke the session behind `token`.
    async fn sign_out(&self, token: SessionToken) -> Result<(), Error>;

    /// Set a new password for the holder of the live session `token`.
    async fn change_password(&self, token: SessionToken, password: NewPassword)
    -> Result<(), Error>;

    /// Send a reset link to `email` when an account uses it. Succeeds either
    /// way so the response never reveals whether an address is registered.
    async fn request_password_reset(&self, email: EmailAddress) -> Result<(), Error>;

    /// Redeem a reset token minted by [`Self::request_password_reset`].
    async fn reset_password(
        &self,
        token: PasswordResetToken,
        password: NewPassword,
    ) -> Result<(), Error>;
}
