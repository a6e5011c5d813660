//! Account aggregate: the pet owner who registers, logs in, and books.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::AccountId;

/// Maximum length of a first or last name, in characters.
pub const NAME_MAX: usize = 64;
const MOBILE_MIN_DIGITS: usize = 10;
const MOBILE_MAX_DIGITS: usize = 15;

/// Validation errors for account fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountValidationError {
    EmptyFirstName,
    EmptyLastName,
    NameTooLong { max: usize },
    EmptyMobile,
    InvalidMobile,
}

impl AccountValidationError {
    /// Request field the error refers to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::EmptyFirstName => "firstName",
            Self::EmptyLastName => "lastName",
            Self::NameTooLong { .. } => "name",
            Self::EmptyMobile | Self::InvalidMobile => "mobile",
        }
    }

    /// Machine-readable validation code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyFirstName | Self::EmptyLastName | Self::EmptyMobile => "missing_field",
            Self::NameTooLong { .. } => "too_long",
            Self::InvalidMobile => "invalid_mobile",
        }
    }
}

impl fmt::Display for AccountValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyFirstName => write!(f, "first name must not be empty"),
            Self::EmptyLastName => write!(f, "last name must not be empty"),
            Self::NameTooLong { max } => write!(f, "names must be at most {max} characters"),
            Self::EmptyMobile => write!(f, "mobile number must not be empty"),
            Self::InvalidMobile => write!(
                f,
                "mobile number must contain {MOBILE_MIN_DIGITS} to {MOBILE_MAX_DIGITS} digits"
            ),
        }
    }
}

impl std::error::Error for AccountValidationError {}

/// Mobile number used as the account's natural key.
///
/// ## Invariants
/// - Trimmed; an optional leading `+` followed by 10 to 15 ASCII digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "String", into = "String")]
#[schema(value_type = String, example = "09121234567")]
pub struct MobileNumber(String);

impl MobileNumber {
    /// Validate and normalise a mobile number.
    ///
    /// # Examples
    /// ```
    /// use vetconsult::domain::MobileNumber;
    ///
    /// let mobile = MobileNumber::new(" 09121234567 ").expect("valid mobile");
    /// assert_eq!(mobile.as_ref(), "09121234567");
    /// assert!(MobileNumber::new("12ab").is_err());
    /// ```
    pub fn new(raw: impl AsRef<str>) -> Result<Self, AccountValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(AccountValidationError::EmptyMobile);
        }
        let digits = trimmed.strip_prefix('+').unwrap_or(trimmed);
        let valid = digits.chars().all(|c| c.is_ascii_digit())
            && (MOBILE_MIN_DIGITS..=MOBILE_MAX_DIGITS).contains(&digits.len());
        if !valid {
            return Err(AccountValidationError::InvalidMobile);
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for MobileNumber {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for MobileNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<MobileNumber> for String {
    fn from(value: MobileNumber) -> Self {
        value.0
    }
}

impl TryFrom<String> for MobileNumber {
    type Error = AccountValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// First and last name pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PersonName {
    first: String,
    last: String,
}

impl PersonName {
    /// Validate a first/last name pair, trimming surrounding whitespace.
    pub fn new(first: &str, last: &str) -> Result<Self, AccountValidationError> {
        let first = first.trim();
        let last = last.trim();
        if first.is_empty() {
            return Err(AccountValidationError::EmptyFirstName);
        }
        if last.is_empty() {
            return Err(AccountValidationError::EmptyLastName);
        }
        if first.chars().count() > NAME_MAX || last.chars().count() > NAME_MAX {
            return Err(AccountValidationError::NameTooLong { max: NAME_MAX });
        }
        Ok(Self {
            first: first.to_owned(),
            last: last.to_owned(),
        })
    }

    pub fn first(&self) -> &str {
        &self.first
    }

    pub fn last(&self) -> &str {
        &self.last
    }

    /// `"{first} {last}"`.
    pub fn full(&self) -> String {
        format!("{} {}", self.first, self.last)
    }
}

/// Registered account without credential material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    id: AccountId,
    name: PersonName,
    mobile: MobileNumber,
    created_at: DateTime<Utc>,
}

impl Account {
    pub fn new(
        id: AccountId,
        name: PersonName,
        mobile: MobileNumber,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            mobile,
            created_at,
        }
    }

    pub fn id(&self) -> AccountId {
        self.id
    }

    pub fn name(&self) -> &PersonName {
        &self.name
    }

    pub fn mobile(&self) -> &MobileNumber {
        &self.mobile
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn full_name(&self) -> String {
        self.name.full()
    }

    /// Copy of the account with a replaced name.
    pub fn renamed(self, name: PersonName) -> Self {
        Self { name, ..self }
    }
}

/// Account row plus its stored password hash, as read by the login flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountCredentials {
    pub account: Account,
    pub password_hash: String,
}
