//! Port for delivering password reset links to account holders.

use async_trait::async_trait;

use crate::domain::PasswordResetGrant;

use super::define_port_error;

define_port_error! {
    /// Errors raised by reset notification adapters.
    pub enum PasswordResetNotifierError {
        /// Delivery channel refused or dropped the message.
        Delivery { message: String } =>
            "password reset delivery failed: {message}",
    }
}

/// Out-of-band delivery of reset tokens.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PasswordResetNotifier: Send + Sync {
    /// Hand `grant` to the account holder behind `grant.email`.
    async fn send_reset(&self, grant: &PasswordResetGrant)
    -> Result<(), PasswordResetNotifierError>;
}
