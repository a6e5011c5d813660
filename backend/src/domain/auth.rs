//! Authentication primitives: credentials, registration input, and the
//! identity resolved from a bearer token.

use std::fmt;

use chrono::{DateTime, Utc};
use zeroize::Zeroizing;

use crate::domain::{Account, AccountId, AccountValidationError, MobileNumber, PersonName, PetProfile};

/// Minimum accepted password length, in characters.
pub const PASSWORD_MIN_LEN: usize = 6;

/// Validation errors for login and registration payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialValidationError {
    Account(AccountValidationError),
    EmptyPassword,
    PasswordTooShort { min: usize },
}

impl CredentialValidationError {
    pub fn field(&self) -> &'static str {
        match self {
            Self::Account(inner) => inner.field(),
            Self::EmptyPassword | Self::PasswordTooShort { .. } => "password",
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Account(inner) => inner.code(),
            Self::EmptyPassword => "missing_field",
            Self::PasswordTooShort { .. } => "too_short",
        }
    }
}

impl fmt::Display for CredentialValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Account(inner) => inner.fmt(f),
            Self::EmptyPassword => write!(f, "password must not be empty"),
            Self::PasswordTooShort { min } => {
                write!(f, "password must be at least {min} characters")
            }
        }
    }
}

impl std::error::Error for CredentialValidationError {}

impl From<AccountValidationError> for CredentialValidationError {
    fn from(value: AccountValidationError) -> Self {
        Self::Account(value)
    }
}

/// Validated login credentials.
///
/// ## Invariants
/// - `mobile` satisfies [`MobileNumber`] rules.
/// - `password` is non-empty and kept verbatim; it is wiped on drop.
///
/// # Examples
/// ```
/// use vetconsult::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts("09121234567", "secret").expect("valid");
/// assert_eq!(creds.mobile().as_ref(), "09121234567");
/// assert_eq!(creds.password(), "secret");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    mobile: MobileNumber,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    pub fn try_from_parts(mobile: &str, password: &str) -> Result<Self, CredentialValidationError> {
        let mobile = MobileNumber::new(mobile)?;
        if password.is_empty() {
            return Err(CredentialValidationError::EmptyPassword);
        }
        Ok(Self {
            mobile,
            password: Zeroizing::new(password.to_owned()),
        })
    }

    pub fn mobile(&self) -> &MobileNumber {
        &self.mobile
    }

    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Validated registration request.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistrationDraft {
    pub name: PersonName,
    pub mobile: MobileNumber,
    pub password: Zeroizing<String>,
    /// Optional first pet captured during sign-up.
    pub pet: Option<PetProfile>,
}

impl RegistrationDraft {
    /// Validate the account fields of a registration request.
    pub fn try_new(
        first_name: &str,
        last_name: &str,
        mobile: &str,
        password: &str,
        pet: Option<PetProfile>,
    ) -> Result<Self, CredentialValidationError> {
        let name = PersonName::new(first_name, last_name)?;
        let mobile = MobileNumber::new(mobile)?;
        if password.is_empty() {
            return Err(CredentialValidationError::EmptyPassword);
        }
        if password.chars().count() < PASSWORD_MIN_LEN {
            return Err(CredentialValidationError::PasswordTooShort {
                min: PASSWORD_MIN_LEN,
            });
        }
        Ok(Self {
            name,
            mobile,
            password: Zeroizing::new(password.to_owned()),
            pet,
        })
    }
}

/// Caller identity resolved from a verified bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    /// A registered account.
    Account { id: AccountId, mobile: MobileNumber },
    /// The configured administrator, who has no account row.
    Admin { mobile: MobileNumber },
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin { .. })
    }

    pub fn account_id(&self) -> Option<AccountId> {
        match self {
            Self::Account { id, .. } => Some(*id),
            Self::Admin { .. } => None,
        }
    }

    pub fn mobile(&self) -> &MobileNumber {
        match self {
            Self::Account { mobile, .. } | Self::Admin { mobile } => mobile,
        }
    }
}

/// Signed bearer token together with its expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Outcome of a successful registration or login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub token: IssuedToken,
    pub identity: Identity,
    /// Present for account logins; absent for the administrator.
    pub account: Option<Account>,
}
