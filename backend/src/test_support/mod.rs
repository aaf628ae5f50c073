//! Shared test doubles: a controllable clock and principal builders.
//!
//! Compiled into the library so integration tests under `tests/` can use the
//! same helpers as unit tests.

mod clock;

pub use clock::MutableClock;

use crate::domain::{DisplayName, EmailAddress, Principal, Role, UserId};

/// Build a principal with a fresh id and the given role.
///
/// # Panics
///
/// Panics if `name` or `email` fail validation; intended for test fixtures.
pub fn principal(role: Role, name: &str, email: &str) -> Principal {
    let display_name = DisplayName::new(name)
        .unwrap_or_else(|err| panic!("fixture display name {name:?} is invalid: {err}"));
    let email = EmailAddress::new(email)
        .unwrap_or_else(|err| panic!("fixture email {email:?} is invalid: {err}"));
    Principal::new(UserId::random(), role, display_name, email, None)
}

/// A reporter with placeholder profile data.
pub fn reporter() -> Principal {
    principal(Role::Reporter, "Reporter", "reporter@example.org")
}

/// An administrator with placeholder profile data.
pub fn admin() -> Principal {
    principal(Role::Admin, "Administrator", "admin@example.org")
}
