//! Credential handling shared by the identity provider adapters.
//!
//! Hashes are Argon2id PHC strings (`$argon2id$v=19$...`), so parameters and
//! salt travel with the hash and stay readable if the defaults change.
//! Verification goes through [`PasswordVerifier`], which compares digests in
//! constant time.

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::{DateTime, TimeDelta, Utc};
use rand::RngCore;

use crate::domain::ports::IdentityProviderError;

const SALT_BYTES: usize = 16;

/// Hash `password` with a fresh random salt.
pub(crate) fn hash_password(password: &str) -> Result<String, IdentityProviderError> {
    let mut bytes = [0_u8; SALT_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    let salt = SaltString::encode_b64(&bytes)
        .map_err(|err| IdentityProviderError::query(format!("password salt: {err}")))?;
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| IdentityProviderError::query(format!("password hashing failed: {err}")))
}

/// Check `password` against a stored PHC string.
///
/// With no stored hash the candidate is still hashed once, so unknown emails
/// cost about as much as wrong passwords.
pub(crate) fn verify_password(password: &str, stored: Option<&str>) -> bool {
    let Some(stored) = stored else {
        let _ = hash_password(password);
        return false;
    };
    PasswordHash::new(stored)
        .and_then(|parsed| Argon2::default().verify_password(password.as_bytes(), &parsed))
        .is_ok()
}

/// `now + ttl`, or a query error when the sum leaves chrono's range.
pub(crate) fn expiry_after(
    now: DateTime<Utc>,
    ttl: TimeDelta,
) -> Result<DateTime<Utc>, IdentityProviderError> {
    now.checked_add_signed(ttl)
        .ok_or_else(|| IdentityProviderError::query("token lifetime overflows the calendar"))
}
