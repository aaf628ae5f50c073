//! PostgreSQL-backed `IdentityProvider` implementation using Diesel ORM.
//!
//! Accounts live in `users`, sessions and reset tokens in `sessions` and
//! `password_resets`, each keyed by the SHA-256 digest of the token. Password
//! changes and reset redemptions run in one transaction with the session
//! revocations they imply.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use mockable::Clock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::ports::{IdentityProvider, IdentityProviderError};
use crate::domain::{
    EmailAddress, LoginCredentials, NewPassword, PASSWORD_RESET_TTL_MINUTES, PasswordResetGrant,
    PasswordResetToken, Principal, Registration, ReporterProfile, ResolvedSession, Role,
    SessionGrant, SessionToken, UserId,
};
use crate::outbound::credentials::{expiry_after, hash_password, verify_password};

use super::models::{NewUserRow, UserRow};
use super::pool::{DbPool, PoolError};
use super::schema::{password_resets, sessions, users};

/// Diesel-backed implementation of the [`IdentityProvider`] port.
#[derive(Clone)]
pub struct DieselIdentityProvider {
    pool: DbPool,
    clock: Arc<dyn Clock>,
    session_ttl: TimeDelta,
}

fn map_pool_error(error: PoolError) -> IdentityProviderError {
    IdentityProviderError::connection(error.into_message())
}

fn map_diesel_error(error: diesel::result::Error) -> IdentityProviderError {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            IdentityProviderError::connection("database connection error")
        }
        DieselError::DatabaseError(DatabaseErrorKind::CheckViolation, _) => {
            IdentityProviderError::query("user violates a table constraint")
        }
        DieselError::QueryBuilderError(_) => IdentityProviderError::query("database query error"),
        _ => IdentityProviderError::query("database error"),
    }
}

fn is_unique_violation(error: &diesel::result::Error) -> bool {
    matches!(
        error,
        diesel::result::Error::DatabaseError(diesel::result::DatabaseErrorKind::UniqueViolation, _)
    )
}

fn decode_principal(row: &UserRow) -> Result<Principal, IdentityProviderError> {
    row.to_principal()
        .map_err(|err| IdentityProviderError::query(err.to_string()))
}

/// Decode profiles, skipping rows that fail validation.
fn decode_profiles(rows: &[UserRow]) -> Vec<ReporterProfile> {
    rows.iter()
        .filter_map(|row| {
            row.to_profile()
                .inspect_err(|err| {
                    warn!(user_id = %row.id, error = %err, "skipping undecodable user row");
                })
                .ok()
        })
        .collect()
}

impl DieselIdentityProvider {
    pub fn new(pool: DbPool, clock: Arc<dyn Clock>, session_ttl: TimeDelta) -> Self {
        Self {
            pool,
            clock,
            session_ttl,
        }
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<UserRow>, IdentityProviderError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        users::table
            .filter(users::email.eq(email.as_ref()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)
    }

    async fn insert(
        &self,
        principal: &Principal,
        password_hash: &str,
    ) -> Result<(), IdentityProviderError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = NewUserRow::from_principal(principal, password_hash, self.clock.utc());
        diesel::insert_into(users::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|err| {
                if is_unique_violation(&err) {
                    IdentityProviderError::email_taken(principal.email().as_ref())
                } else {
                    map_diesel_error(err)
                }
            })
    }

    /// Register an account and promote it to administrator.
    ///
    /// Idempotent for an email that already belongs to an administrator; an
    /// existing reporter with that email is promoted and keeps its password.
    pub async fn seed_admin(
        &self,
        registration: &Registration,
    ) -> Result<Principal, IdentityProviderError> {
        if let Some(row) = self.find_by_email(registration.credentials().email()).await? {
            let principal = decode_principal(&row)?;
            if principal.is_admin() {
                return Ok(principal);
            }
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let promoted = diesel::update(users::table.filter(users::id.eq(row.id)))
                .set(users::role.eq(Role::Admin.as_str()))
                .returning(UserRow::as_returning())
                .get_result(&mut conn)
                .await
                .map_err(map_diesel_error)?;
            info!(principal_id = %principal.id(), "seeded administrator promoted");
            return decode_principal(&promoted);
        }

        let principal = Principal::new(
            UserId::random(),
            Role::Admin,
            registration.display_name().clone(),
            registration.credentials().email().clone(),
            registration.avatar().cloned(),
        )
        .with_contact(registration.contact().clone());
        let password_hash = hash_password(registration.credentials().password())?;
        self.insert(&principal, &password_hash).await?;
        info!(principal_id = %principal.id(), "administrator seeded");
        Ok(principal)
    }
}

#[async_trait]
impl IdentityProvider for DieselIdentityProvider {
    async fn sign_up(&self, registration: &Registration) -> Result<Principal, IdentityProviderError> {
        let principal = Principal::new(
            UserId::random(),
            Role::Reporter,
            registration.display_name().clone(),
            registration.credentials().email().clone(),
            registration.avatar().cloned(),
        )
        .with_contact(registration.contact().clone());
        let password_hash = hash_password(registration.credentials().password())?;
        self.insert(&principal, &password_hash).await?;
        Ok(principal)
    }

    async fn sign_in(
        &self,
        credentials: &LoginCredentials,
    ) -> Result<SessionGrant, IdentityProviderError> {
        let now = self.clock.utc();
        let expires_at = expiry_after(now, self.session_ttl)?;
        let row = self.find_by_email(credentials.email()).await?;
        let stored = row.as_ref().map(|row| row.password_hash.as_str());
        if !verify_password(credentials.password(), stored) {
            return Err(IdentityProviderError::invalid_credentials());
        }
        let Some(row) = row else {
            return Err(IdentityProviderError::invalid_credentials());
        };
        let principal = decode_principal(&row)?;
        let user_id = row.id;

        let token = SessionToken::generate();
        let digest = token.digest();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction(|conn| {
            async move {
                diesel::delete(
                    sessions::table
                        .filter(sessions::user_id.eq(user_id))
                        .filter(sessions::expires_at.le(now)),
                )
                .execute(conn)
                .await?;
                diesel::insert_into(sessions::table)
                    .values((
                        sessions::token_digest.eq(digest.as_str()),
                        sessions::user_id.eq(user_id),
                        sessions::expires_at.eq(expires_at),
                    ))
                    .execute(conn)
                    .await
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)?;

        Ok(SessionGrant {
            token,
            principal,
            expires_at,
        })
    }

    async fn sign_out(&self, token: &SessionToken) -> Result<(), IdentityProviderError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::delete(sessions::table.filter(sessions::token_digest.eq(token.digest())))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn resolve_session(
        &self,
        token: &SessionToken,
    ) -> Result<Option<ResolvedSession>, IdentityProviderError> {
        let now = self.clock.utc();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let found: Option<(UserRow, DateTime<Utc>)> = sessions::table
            .inner_join(users::table)
            .filter(sessions::token_digest.eq(token.digest()))
            .filter(sessions::expires_at.gt(now))
            .select((UserRow::as_select(), sessions::expires_at))
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        found
            .map(|(row, expires_at)| {
                Ok(ResolvedSession {
                    principal: decode_principal(&row)?,
                    expires_at,
                })
            })
            .transpose()
    }

    async fn find_profiles(
        &self,
        ids: &[UserId],
    ) -> Result<Vec<ReporterProfile>, IdentityProviderError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let uuids: Vec<Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<UserRow> = users::table
            .filter(users::id.eq_any(uuids))
            .select(UserRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(decode_profiles(&rows))
    }

    async fn change_password(
        &self,
        token: &SessionToken,
        password: &NewPassword,
    ) -> Result<(), IdentityProviderError> {
        let now = self.clock.utc();
        let password_hash = hash_password(password.expose())?;
        let digest = token.digest();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let changed: Option<Uuid> = conn
            .transaction(|conn| {
                async move {
                    let user_id: Option<Uuid> = sessions::table
                        .filter(sessions::token_digest.eq(digest.as_str()))
                        .filter(sessions::expires_at.gt(now))
                        .select(sessions::user_id)
                        .first(conn)
                        .await
                        .optional()?;
                    let Some(user_id) = user_id else {
                        return Ok(None);
                    };
                    diesel::update(users::table.filter(users::id.eq(user_id)))
                        .set(users::password_hash.eq(password_hash.as_str()))
                        .execute(conn)
                        .await?;
                    diesel::delete(
                        sessions::table
                            .filter(sessions::user_id.eq(user_id))
                            .filter(sessions::token_digest.ne(digest.as_str())),
                    )
                    .execute(conn)
                    .await?;
                    Ok::<_, diesel::result::Error>(Some(user_id))
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;

        let user_id = changed.ok_or_else(IdentityProviderError::inactive_session)?;
        info!(principal_id = %user_id, "password changed");
        Ok(())
    }

    async fn issue_password_reset(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<PasswordResetGrant>, IdentityProviderError> {
        let now = self.clock.utc();
        let expires_at = expiry_after(now, TimeDelta::minutes(PASSWORD_RESET_TTL_MINUTES))?;
        let Some(user_id) = self.find_by_email(email).await?.map(|row| row.id) else {
            return Ok(None);
        };

        let token = PasswordResetToken::generate();
        let digest = token.digest();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction(|conn| {
            async move {
                diesel::delete(password_resets::table.filter(password_resets::expires_at.le(now)))
                    .execute(conn)
                    .await?;
                diesel::insert_into(password_resets::table)
                    .values((
                        password_resets::token_digest.eq(digest.as_str()),
                        password_resets::user_id.eq(user_id),
                        password_resets::expires_at.eq(expires_at),
                    ))
                    .execute(conn)
                    .await
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)?;

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
        let digest = token.digest();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let redeemed: Option<Uuid> = conn
            .transaction(|conn| {
                async move {
                    // Deleting first makes the token single-use even when two
                    // redemptions race.
                    let claimed: Option<(Uuid, DateTime<Utc>)> = diesel::delete(
                        password_resets::table
                            .filter(password_resets::token_digest.eq(digest.as_str())),
                    )
                    .returning((password_resets::user_id, password_resets::expires_at))
                    .get_result(conn)
                    .await
                    .optional()?;
                    let Some((user_id, _)) = claimed.filter(|(_, expires_at)| *expires_at > now)
                    else {
                        return Ok(None);
                    };
                    diesel::update(users::table.filter(users::id.eq(user_id)))
                        .set(users::password_hash.eq(password_hash.as_str()))
                        .execute(conn)
                        .await?;
                    diesel::delete(sessions::table.filter(sessions::user_id.eq(user_id)))
                        .execute(conn)
                        .await?;
                    Ok::<_, diesel::result::Error>(Some(user_id))
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;

        let user_id = redeemed.ok_or_else(IdentityProviderError::invalid_reset_token)?;
        info!(principal_id = %user_id, "password reset redeemed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for error mapping and row decoding.
    use super::*;
    use chrono::TimeZone;
    use diesel::result::{DatabaseErrorKind, Error as DieselError};
    use rstest::rstest;

    fn row(display_name: &str) -> UserRow {
        UserRow {
            id: Uuid::new_v4(),
            email: "ada@example.org".into(),
            password_hash: "$argon2id$placeholder".into(),
            display_name: display_name.into(),
            avatar_url: None,
            phone: None,
            address: None,
            role: "reporter".into(),
            created_at: Utc
                .with_ymd_and_hms(2026, 1, 2, 3, 4, 5)
                .single()
                .expect("timestamp"),
        }
    }

    #[rstest]
    #[case(
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, Box::new(String::from("closed"))),
        "Connection"
    )]
    #[case(
        DieselError::DatabaseError(DatabaseErrorKind::CheckViolation, Box::new(String::from("check"))),
        "Query"
    )]
    #[case(DieselError::NotFound, "Query")]
    fn diesel_errors_map_to_port_errors(#[case] error: DieselError, #[case] kind: &str) {
        assert_eq!(map_diesel_error(error).kind(), kind);
    }

    #[test]
    fn unique_violation_is_recognised() {
        let duplicate =
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, Box::new(String::from("dup")));
        assert!(is_unique_violation(&duplicate));
        assert!(!is_unique_violation(&DieselError::NotFound));
    }

    #[test]
    fn pool_failures_are_connection_errors() {
        let mapped = map_pool_error(PoolError::checkout("timed out"));
        assert_eq!(mapped, IdentityProviderError::connection("timed out"));
    }

    #[test]
    fn corrupt_rows_are_skipped_from_profiles() {
        let rows = vec![row("Ada Lovelace"), row("   ")];
        let profiles = decode_profiles(&rows);
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].display_name.as_ref(), "Ada Lovelace");
    }

    #[test]
    fn corrupt_principal_is_a_query_error() {
        let mut corrupt = row("Ada Lovelace");
        corrupt.role = "owner".into();
        assert!(matches!(
            decode_principal(&corrupt),
            Err(IdentityProviderError::Query { .. })
        ));
    }
}
