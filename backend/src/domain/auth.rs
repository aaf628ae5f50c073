//! Authentication primitives: credentials, registrations and session tokens.
//!
//! Keep inbound payload parsing outside the domain by exposing constructors
//! that validate string inputs before a handler talks to a port or service.

use std::fmt;

use chrono::{DateTime, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use super::user::{
    AvatarRef, ContactDetails, DisplayName, EmailAddress, PhoneNumber, PostalAddress, Principal,
    UserValidationError,
};

/// Minimum password length accepted at registration.
pub const PASSWORD_MIN: usize = 6;
/// Lifetime of a password reset token.
pub const PASSWORD_RESET_TTL_MINUTES: i64 = 30;

const TOKEN_BYTES: usize = 32;

/// Domain error returned when credential or registration values are invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginValidationError {
    /// Email was missing or malformed.
    InvalidEmail(UserValidationError),
    /// Password was blank.
    EmptyPassword,
    /// Password is shorter than [`PASSWORD_MIN`].
    PasswordTooShort { min: usize },
    /// Display name failed validation.
    InvalidDisplayName(UserValidationError),
    /// Avatar reference failed validation.
    InvalidAvatar(UserValidationError),
    /// Phone number failed validation.
    InvalidPhone(UserValidationError),
    /// Postal address failed validation.
    InvalidAddress(UserValidationError),
    /// Password and its confirmation differ.
    PasswordMismatch,
}

impl LoginValidationError {
    /// Name of the offending request field, for error details.
    pub fn field(&self) -> &'static str {
        match self {
            Self::InvalidEmail(_) => "email",
            Self::EmptyPassword | Self::PasswordTooShort { .. } => "password",
            Self::InvalidDisplayName(_) => "displayName",
            Self::InvalidAvatar(_) => "avatarUrl",
            Self::InvalidPhone(_) => "phone",
            Self::InvalidAddress(_) => "address",
            Self::PasswordMismatch => "confirmPassword",
        }
    }
}

impl fmt::Display for LoginValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidEmail(err)
            | Self::InvalidDisplayName(err)
            | Self::InvalidAvatar(err)
            | Self::InvalidPhone(err)
            | Self::InvalidAddress(err) => write!(f, "{err}"),
            Self::PasswordMismatch => write!(f, "passwords do not match"),
            Self::EmptyPassword => write!(f, "password must not be empty"),
            Self::PasswordTooShort { min } => {
                write!(f, "password must be at least {min} characters")
            }
        }
    }
}

impl std::error::Error for LoginValidationError {}

/// Validated sign-in credentials.
///
/// ## Invariants
/// - `email` is normalised by [`EmailAddress`].
/// - `password` is non-empty and retains caller-provided whitespace.
///
/// # Examples
/// ```
/// use civic_triage::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts("Admin@Example.org", "password").unwrap();
/// assert_eq!(creds.email().as_ref(), "admin@example.org");
/// assert_eq!(creds.password(), "password");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    email: EmailAddress,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw email/password inputs.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, LoginValidationError> {
        let email = EmailAddress::new(email).map_err(LoginValidationError::InvalidEmail)?;
        if password.is_empty() {
            return Err(LoginValidationError::EmptyPassword);
        }

        Ok(Self {
            email,
            password: Zeroizing::new(password.to_owned()),
        })
    }

    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Validated sign-up request. Role is never part of the input; every new
/// principal starts as a reporter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    credentials: LoginCredentials,
    display_name: DisplayName,
    avatar: Option<AvatarRef>,
    contact: ContactDetails,
}

impl Registration {
    pub fn try_from_parts(
        email: &str,
        password: &str,
        display_name: &str,
        avatar: Option<&str>,
    ) -> Result<Self, LoginValidationError> {
        let credentials = LoginCredentials::try_from_parts(email, password)?;
        if password.chars().count() < PASSWORD_MIN {
            return Err(LoginValidationError::PasswordTooShort { min: PASSWORD_MIN });
        }
        let display_name =
            DisplayName::new(display_name).map_err(LoginValidationError::InvalidDisplayName)?;
        let avatar = avatar
            .filter(|value| !value.trim().is_empty())
            .map(AvatarRef::new)
            .transpose()
            .map_err(LoginValidationError::InvalidAvatar)?;
        Ok(Self {
            credentials,
            display_name,
            avatar,
            contact: ContactDetails::default(),
        })
    }

    /// Attach optional phone and address; blank values count as absent.
    pub fn with_contact(
        mut self,
        phone: Option<&str>,
        address: Option<&str>,
    ) -> Result<Self, LoginValidationError> {
        fn present(value: Option<&str>) -> Option<&str> {
            value.filter(|raw| !raw.trim().is_empty())
        }
        self.contact = ContactDetails {
            phone: present(phone)
                .map(PhoneNumber::new)
                .transpose()
                .map_err(LoginValidationError::InvalidPhone)?,
            address: present(address)
                .map(PostalAddress::new)
                .transpose()
                .map_err(LoginValidationError::InvalidAddress)?,
        };
        Ok(self)
    }

    pub fn credentials(&self) -> &LoginCredentials {
        &self.credentials
    }

    pub fn display_name(&self) -> &DisplayName {
        &self.display_name
    }

    pub fn avatar(&self) -> Option<&AvatarRef> {
        self.avatar.as_ref()
    }

    pub fn contact(&self) -> &ContactDetails {
        &self.contact
    }
}

/// Replacement password, typed twice by the user.
#[derive(Clone, PartialEq, Eq)]
pub struct NewPassword(Zeroizing<String>);

impl NewPassword {
    /// Accept `password` when it is long enough and equals `confirmation`.
    pub fn confirmed(password: &str, confirmation: &str) -> Result<Self, LoginValidationError> {
        if password.is_empty() {
            return Err(LoginValidationError::EmptyPassword);
        }
        if password.chars().count() < PASSWORD_MIN {
            return Err(LoginValidationError::PasswordTooShort { min: PASSWORD_MIN });
        }
        if password != confirmation {
            return Err(LoginValidationError::PasswordMismatch);
        }
        Ok(Self(Zeroizing::new(password.to_owned())))
    }

    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for NewPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("NewPassword(<redacted>)")
    }
}

/// Errors raised when parsing a presented token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenFormatError {
    Malformed,
}

impl fmt::Display for TokenFormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "token is malformed")
    }
}

impl std::error::Error for TokenFormatError {}

macro_rules! opaque_token {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq)]
        pub struct $name(Zeroizing<String>);

        impl $name {
            /// Mint a fresh random token.
            pub fn generate() -> Self {
                let mut bytes = [0_u8; TOKEN_BYTES];
                rand::thread_rng().fill_bytes(&mut bytes);
                Self(Zeroizing::new(hex::encode(bytes)))
            }

            /// Parse a token presented by a client.
            pub fn parse(raw: &str) -> Result<Self, TokenFormatError> {
                let is_hex = raw
                    .chars()
                    .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c));
                if raw.len() != TOKEN_BYTES * 2 || !is_hex {
                    return Err(TokenFormatError::Malformed);
                }
                Ok(Self(Zeroizing::new(raw.to_owned())))
            }

            /// Token text to hand back to the client.
            pub fn expose(&self) -> &str {
                self.0.as_str()
            }

            /// Hex-encoded SHA-256 digest used as the storage key.
            pub fn digest(&self) -> String {
                hex::encode(Sha256::digest(self.0.as_bytes()))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}(<redacted>)", stringify!($name))
            }
        }
    };
}

opaque_token!(
    /// Opaque bearer token proving an authenticated session.
    ///
    /// Tokens are 256 random bits rendered as lowercase hex. Only the SHA-256
    /// digest ever reaches a session store. `Debug` output is redacted.
    SessionToken
);

opaque_token!(
    /// Single-use secret letting the holder of an email inbox set a new
    /// password. Stored by digest only, like [`SessionToken`].
    PasswordResetToken
);

/// Result of a successful sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionGrant {
    pub token: SessionToken,
    pub principal: Principal,
    pub expires_at: DateTime<Utc>,
}

/// Reset token minted for an account, ready to be delivered to its inbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordResetGrant {
    pub token: PasswordResetToken,
    pub email: EmailAddress,
    pub expires_at: DateTime<Utc>,
}

/// Live session record as reported by the identity provider.
///
/// `principal.role()` reflects the principal's role at lookup time, not the
/// role held when the session was opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSession {
    pub principal: Principal,
    pub expires_at: DateTime<Utc>,
}
