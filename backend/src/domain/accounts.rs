//! Account service: registration, session management and password recovery
//! through the identity provider.
//!
//! Reset requests always succeed from the caller's point of view. An unknown
//! address is logged at debug level and nothing is delivered.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use super::ports::{AccountCommand, IdentityProvider, PasswordResetNotifier};
use super::repository_errors::{map_identity_error, map_notifier_error};
use super::{
    EmailAddress, Error, LoginCredentials, NewPassword, PasswordResetToken, Principal,
    Registration, SessionGrant, SessionToken,
};

pub struct AccountService<P, N> {
    identity: Arc<P>,
    notifier: Arc<N>,
}

impl<P, N> AccountService<P, N> {
    pub fn new(identity: Arc<P>, notifier: Arc<N>) -> Self {
        Self { identity, notifier }
    }
}

impl<P, N> Clone for AccountService<P, N> {
    fn clone(&self) -> Self {
        Self {
            identity: Arc::clone(&self.identity),
            notifier: Arc::clone(&self.notifier),
        }
    }
}

#[async_trait]
impl<P, N> AccountCommand for AccountService<P, N>
where
    P: IdentityProvider,
    N: PasswordResetNotifier,
{
    async fn sign_up(&self, registration: Registration) -> Result<Principal, Error> {
        let principal = self
            .identity
            .sign_up(&registration)
            .await
            .map_err(map_identity_error)?;
        info!(principal_id = %principal.id(), role = %principal.role(), "account registered");
        Ok(principal)
    }

    async fn sign_in(&self, credentials: LoginCredentials) -> Result<SessionGrant, Error> {
        let grant = self
            .identity
            .sign_in(&credentials)
            .await
            .map_err(map_identity_error)?;
        info!(
            principal_id = %grant.principal.id(),
            expires_at = %grant.expires_at,
            "session opened"
        );
        Ok(grant)
    }

    async fn sign_out(&self, token: SessionToken) -> Result<(), Error> {
        self.identity
            .sign_out(&token)
            .await
            .map_err(map_identity_error)?;
        info!("session revoked");
        Ok(())
    }

    async fn change_password(
        &self,
        token: SessionToken,
        password: NewPassword,
    ) -> Result<(), Error> {
        self.identity
            .change_password(&token, &password)
            .await
            .map_err(map_identity_error)?;
        info!("password changed; other sessions revoked");
        Ok(())
    }

    async fn request_password_reset(&self, email: EmailAddress) -> Result<(), Error> {
        let Some(grant) = self
            .identity
            .issue_password_reset(&email)
            .await
            .map_err(map_identity_error)?
        else {
            debug!("password reset requested for unregistered address");
            return Ok(());
        };
        self.notifier
            .send_reset(&grant)
            .await
            .map_err(map_notifier_error)?;
        info!(expires_at = %grant.expires_at, "password reset issued");
        Ok(())
    }

    async fn reset_password(
        &self,
        token: PasswordResetToken,
        password: NewPassword,
    ) -> Result<(), Error> {
        self.identity
            .redeem_password_reset(&token, &password)
            .await
            .map_err(map_identity_error)?;
        info!("password reset redeemed; sessions revoked");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{
        IdentityProviderError, MockIdentityProvider, MockPasswordResetNotifier,
        PasswordResetNotifierError,
    };
    use crate::domain::{ErrorCode, PasswordResetGrant};
    use crate::test_support::reporter;
    use chrono::Utc;
    use rstest::rstest;

    fn service(
        identity: MockIdentityProvider,
        notifier: MockPasswordResetNotifier,
    ) -> AccountService<MockIdentityProvider, MockPasswordResetNotifier> {
        AccountService::new(Arc::new(identity), Arc::new(notifier))
    }

    fn new_password() -> NewPassword {
        NewPassword::confirmed("fresh-secret", "fresh-secret").expect("password")
    }

    fn email() -> EmailAddress {
        EmailAddress::new("reporter@example.org").expect("email")
    }

    fn credentials() -> LoginCredentials {
        LoginCredentials::try_from_parts("reporter@example.org", "secret1").expect("credentials")
    }

    #[tokio::test]
    async fn sign_in_returns_provider_grant() {
        let principal = reporter();
        let grant = SessionGrant {
            token: SessionToken::generate(),
            principal: principal.clone(),
            expires_at: Utc::now(),
        };
        let expected = grant.clone();
        let mut identity = MockIdentityProvider::new();
        identity
            .expect_sign_in()
            .withf(|creds| creds.email().as_ref() == "reporter@example.org")
            .return_once(move |_| Ok(grant));

        let service = service(identity, MockPasswordResetNotifier::new());
        let result = service.sign_in(credentials()).await.expect("signed in");
        assert_eq!(result, expected);
    }

    #[rstest]
    #[case(IdentityProviderError::invalid_credentials(), ErrorCode::Unauthorized)]
    #[case(IdentityProviderError::connection("down"), ErrorCode::ServiceUnavailable)]
    #[tokio::test]
    async fn sign_in_maps_failures(#[case] failure: IdentityProviderError, #[case] code: ErrorCode) {
        let mut identity = MockIdentityProvider::new();
        identity.expect_sign_in().return_once(move |_| Err(failure));

        let service = service(identity, MockPasswordResetNotifier::new());
        let err = service.sign_in(credentials()).await.expect_err("failure");
        assert_eq!(err.code(), code);
    }

    #[tokio::test]
    async fn duplicate_sign_up_is_a_validation_error() {
        let mut identity = MockIdentityProvider::new();
        identity
            .expect_sign_up()
            .return_once(|reg| Err(IdentityProviderError::email_taken(reg.credentials().email().as_ref())));
        let registration =
            Registration::try_from_parts("dup@example.org", "secret1", "Dup User", None)
                .expect("registration");

        let service = service(identity, MockPasswordResetNotifier::new());
        let err = service.sign_up(registration).await.expect_err("duplicate");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
        assert_eq!(err.details().expect("details")["field"], "email");
    }

    #[tokio::test]
    async fn change_password_forwards_session_and_password() {
        let token = SessionToken::generate();
        let expected = token.clone();
        let mut identity = MockIdentityProvider::new();
        identity
            .expect_change_password()
            .withf(move |tok, pw| *tok == expected && pw.expose() == "fresh-secret")
            .times(1)
            .return_once(|_, _| Ok(()));

        service(identity, MockPasswordResetNotifier::new())
            .change_password(token, new_password())
            .await
            .expect("changed");
    }

    #[tokio::test]
    async fn change_password_with_dead_session_is_unauthorized() {
        let mut identity = MockIdentityProvider::new();
        identity
            .expect_change_password()
            .return_once(|_, _| Err(IdentityProviderError::inactive_session()));

        let err = service(identity, MockPasswordResetNotifier::new())
            .change_password(SessionToken::generate(), new_password())
            .await
            .expect_err("inactive");
        assert_eq!(err.code(), ErrorCode::Unauthorized);
    }

    #[tokio::test]
    async fn reset_request_delivers_the_minted_grant() {
        let grant = PasswordResetGrant {
            token: PasswordResetToken::generate(),
            email: email(),
            expires_at: Utc::now(),
        };
        let expected = grant.clone();
        let mut identity = MockIdentityProvider::new();
        identity
            .expect_issue_password_reset()
            .return_once(move |_| Ok(Some(grant)));
        let mut notifier = MockPasswordResetNotifier::new();
        notifier
            .expect_send_reset()
            .withf(move |sent| *sent == expected)
            .times(1)
            .return_once(|_| Ok(()));

        service(identity, notifier)
            .request_password_reset(email())
            .await
            .expect("requested");
    }

    #[tokio::test]
    async fn reset_request_for_unknown_address_sends_nothing() {
        let mut identity = MockIdentityProvider::new();
        identity
            .expect_issue_password_reset()
            .return_once(|_| Ok(None));
        let mut notifier = MockPasswordResetNotifier::new();
        notifier.expect_send_reset().never();

        service(identity, notifier)
            .request_password_reset(email())
            .await
            .expect("silently accepted");
    }

    #[tokio::test]
    async fn reset_delivery_failure_surfaces_as_outage() {
        let mut identity = MockIdentityProvider::new();
        identity.expect_issue_password_reset().return_once(|email| {
            Ok(Some(PasswordResetGrant {
                token: PasswordResetToken::generate(),
                email: email.clone(),
                expires_at: Utc::now(),
            }))
        });
        let mut notifier = MockPasswordResetNotifier::new();
        notifier
            .expect_send_reset()
            .return_once(|_| Err(PasswordResetNotifierError::delivery("smtp down")));

        let err = service(identity, notifier)
            .request_password_reset(email())
            .await
            .expect_err("outage");
        assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
    }

    #[tokio::test]
    async fn spent_reset_token_is_rejected() {
        let mut identity = MockIdentityProvider::new();
        identity
            .expect_redeem_password_reset()
            .return_once(|_, _| Err(IdentityProviderError::invalid_reset_token()));

        let err = service(identity, MockPasswordResetNotifier::new())
            .reset_password(PasswordResetToken::generate(), new_password())
            .await
            .expect_err("spent");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
        assert_eq!(err.details().expect("details")["field"], "token");
    }
}
