//! In-process identity provider.
//!
//! Holds accounts, sessions and reset tokens in memory. Passwords are stored
//! as Argon2id hashes and tokens are keyed by their SHA-256 digest, so no
//! plaintext secret is retained after the call that carried it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use tracing::info;

use crate::domain::ports::{IdentityProvider, IdentityProviderError};
use crate::domain::{
    EmailAddress, LoginCredentials, NewPassword, PASSWORD_RESET_TTL_MINUTES, PasswordResetGrant,
    PasswordResetToken, Principal, Registration, ReporterProfile, ResolvedSession, Role,
    SessionGrant, SessionToken, UserId,
};
use crate::outbound::credentials::{expiry_after, hash_password, verify_password};

struct Account {
    principal: Principal,
    password_hash: String,
}

/// Session or reset token owner and lifetime.
struct TokenRecord {
    principal_id: UserId,
    expires_at: DateTime<Utc>,
}

#[derive(Default)]
struct State {
    accounts: HashMap<UserId, Account>,
    by_email: HashMap<EmailAddress, UserId>,
    sessions: HashMap<String, TokenRecord>,
    resets: HashMap<String, TokenRecord>,
}

impl State {
    fn account_for_email(&self, email: &EmailAddress) -> Option<&Account> {
        self.by_email.get(email).and_then(|id| self.accounts.get(id))
    }

    fn set_password_hash(
        &mut self,
        id: &UserId,
        password_hash: String,
    ) -> Result<(), IdentityProviderError> {
        let account = self
            .accounts
            .get_mut(id)
            .ok_or_else(|| IdentityProviderError::query(format!("no account {id}")))?;
        account.password_hash = password_hash;
        Ok(())
    }
}

/// Identity provider keeping everything in process memory.
pub struct InMemoryIdentityProvider {
    clock: Arc<dyn Clock>,
    session_ttl: TimeDelta,
    state: Mutex<State>,
}

impl InMemoryIdentityProvider {
    pub fn new(clock: Arc<dyn Clock>, session_ttl: TimeDelta) -> Self {
        Self {
            clock,
            session_ttl,
            state: Mutex::new(State::default()),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, IdentityProviderError> {
        self.state
            .lock()
            .map_err(|_| IdentityProviderError::query("identity store lock poisoned"))
    }

    /// Privileged role change. Live sessions pick up the new role on their
    /// next resolution.
    pub fn set_role(&self, id: &UserId, role: Role) -> Result<Principal, IdentityProviderError> {
        let mut state = self.lock()?;
        let account = state
            .accounts
            .get_mut(id)
            .ok_or_else(|| IdentityProviderError::query(format!("no account {id}")))?;
        let p = &account.principal;
        account.principal = Principal::new(
            p.id().clone(),
            role,
            p.display_name().clone(),
            p.email().clone(),
            p.avatar().cloned(),
        )
        .with_contact(p.contact().clone());
        info!(principal_id = %id, role = %role, "role changed");
        Ok(account.principal.clone())
    }

    /// Register an account and promote it to administrator.
    ///
    /// Idempotent for an email that already belongs to an administrator.
    pub fn seed_admin(&self, registration: &Registration) -> Result<Principal, IdentityProviderError> {
        let existing = self
            .lock()?
            .account_for_email(registration.credentials().email())
            .map(|account| account.principal.clone());
        let principal = match existing {
            Some(principal) if principal.is_admin() => return Ok(principal),
            Some(principal) => principal,
            None => self.register(registration)?,
        };
        self.set_role(principal.id(), Role::Admin)
    }

    fn register(&self, registration: &Registration) -> Result<Principal, IdentityProviderError> {
        let email = registration.credentials().email().clone();
        if self.lock()?.by_email.contains_key(&email) {
            return Err(IdentityProviderError::email_taken(email.as_ref()));
        }
        let password_hash = hash_password(registration.credentials().password())?;

        let mut state = self.lock()?;
        // Re-check: the hash ran without the lock held.
        if state.by_email.contains_key(&email) {
            return Err(IdentityProviderError::email_taken(email.as_ref()));
        }
        let principal = Principal::new(
            UserId::random(),
            Role::Reporter,
            registration.display_name().clone(),
            email.clone(),
            registration.avatar().cloned(),
        )
        .with_contact(registration.contact().clone());
        state.by_email.insert(email, principal.id().clone());
        state.accounts.insert(
            principal.id().clone(),
            Account {
                principal: principal.clone(),
                password_hash,
            },
        );
        Ok(principal)
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn sign_up(&self, registration: &Registration) -> Result<Principal, IdentityProviderError> {
        self.register(registration)
    }

    async fn sign_in(
        &self,
        credentials: &LoginCredentials,
    ) -> Result<SessionGrant, IdentityProviderError> {
        let now = self.clock.utc();
        let expires_at = expiry_after(now, self.session_ttl)?;
        let candidate = self
            .lock()?
            .account_for_email(credentials.email())
            .map(|account| (account.principal.clone(), account.password_hash.clone()));
        let stored = candidate.as_ref().map(|(_, hash)| hash.as_str());
        if !verify_password(credentials.password(), stored) {
            return Err(IdentityProviderError::invalid_credentials());
        }
        let Some((principal, _)) = candidate else {
            return Err(IdentityProviderError::invalid_credentials());
        };

        let mut state = self.lock()?;
        state.sessions.retain(|_, session| session.expires_at > now);
        let token = SessionToken::generate();
        state.sessions.insert(
            token.digest(),
            TokenRecord {
                principal_id: principal.id().clone(),
                expires_at,
            },
        );
        Ok(SessionGrant {
            token,
            principal,
            expires_at,
        })
    }

    async fn sign_out(&self, token: &SessionToken) -> Result<(), IdentityProviderError> {
        self.lock()?.sessions.remove(&token.digest());
        Ok(())
    }

    async fn resolve_session(
        &self,
        token: &SessionToken,
    ) -> Result<Option<ResolvedSession>, IdentityProviderError> {
        let now = self.clock.utc();
        let mut state = self.lock()?;
        let digest = token.digest();
        let Some(session) = state.sessions.get(&digest) else {
            return Ok(None);
        };
        if session.expires_at <= now {
            state.sessions.remove(&digest);
            return Ok(None);
        }
        let expires_at = session.expires_at;
        Ok(state
            .accounts
            .get(&session.principal_id)
            .map(|account| ResolvedSession {
                principal: account.principal.clone(),
                expires_at,
            }))
    }

    async fn find_profiles(
        &self,
        ids: &[UserId],
    ) -> Result<Vec<ReporterProfile>, IdentityProviderError> {
        let state = self.lock()?;
        Ok(ids
            .iter()
            .filter_map(|id| state.accounts.get(id))
            .map(|account| ReporterProfile {
                id: account.principal.id().clone(),
                display_name: account.principal.display_name().clone(),
                email: account.principal.email().clone(),
            })
            .collect())
    }

    async fn change_password(
        &self,
        token: &SessionToken,
        password: &NewPassword,
    ) -> Result<(), IdentityProviderError> {
        let now = self.clock.utc();
        let password_hash = hash_password(password.expose())?;
        let digest = token.digest();

        let mut state = self.lock()?;
        let principal_id = state
            .sessions
            .get(&digest)
            .filter(|session| session.expires_at > now)
            .map(|session| session.principal_id.clone())
            .ok_or_else(IdentityProviderError::inactive_session)?;
        state.set_password_hash(&principal_id, password_hash)?;
        state
            .sessions
            .retain(|key, session| *key == digest || session.principal_id != principal_id);
        info!(principal_id = %principal_id, "password changed");
        Ok(())
    }

    async fn issue_password_reset(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<PasswordResetGrant>, IdentityProviderError> {
        let now = self.clock.utc();
        let expires_at = expiry_after(now, TimeDelta::minutes(PASSWORD_RESET_TTL_MINUTES))?;
        let mut state = self.lock()?;
        let Some(principal_id) = state.by_email.get(email).cloned() else {
            return Ok(None);
        };
        state.resets.retain(|_, reset| reset.expires_at > now);
        let token = PasswordResetToken::generate();
        state.resets.insert(
            token.digest(),
            TokenRecord {
                principal_id,
                expires_at,
            },
        );
        Ok(Some(PasswordResetGrant {
            token,
            email: email.clone(),
            expires_at,
        }))
    }

    async fn redeem_password_reset(
        &self,
        token: &PasswordResetToken,
        password: &NewPassword,
    ) -> Result<(), IdentityProviderError> {
        let now = self.clock.utc();
        let password_hash = hash_password(password.expose())?;

        let mut state = self.lock()?;
        let principal_id = state
            .resets
            .remove(&token.digest())
            .filter(|reset| reset.expires_at > now)
            .map(|reset| reset.principal_id)
            .ok_or_else(IdentityProviderError::invalid_reset_token)?;
        state.set_password_hash(&principal_id, password_hash)?;
        state
            .sessions
            .retain(|_, session| session.principal_id != principal_id);
        info!(principal_id = %principal_id, "password reset redeemed");
        Ok(())
    }
}
