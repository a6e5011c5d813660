//! Port abstraction for account persistence adapters and their errors.
use async_trait::async_trait;

use crate::domain::{Account, AccountCredentials, AccountId, MobileNumber, PersonName, Pet};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by account repository adapters.
    pub enum AccountRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "account repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "account repository query failed: {message}",
        /// The unique constraint on the mobile number rejected the write.
        DuplicateMobile { mobile: String } => "mobile number {mobile} is already registered",
    }
}

/// Account row to insert, with its password hash and optional first pet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAccount {
    pub account: Account,
    pub password_hash: String,
    pub first_pet: Option<Pet>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Insert the account and its first pet in one transaction.
    async fn create(&self, new_account: &NewAccount) -> Result<(), AccountRepositoryError>;

    /// Fetch an account by identifier.
    async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, AccountRepositoryError>;

    /// Fetch the account and its password hash by mobile number.
    async fn find_credentials(
        &self,
        mobile: &MobileNumber,
    ) -> Result<Option<AccountCredentials>, AccountRepositoryError>;

    /// Whether any account uses this mobile number.
    async fn mobile_exists(&self, mobile: &MobileNumber) -> Result<bool, AccountRepositoryError>;

    /// Replace the name parts; `None` when the account does not exist.
    async fn update_name(
        &self,
        id: AccountId,
        name: &PersonName,
    ) -> Result<Option<Account>, AccountRepositoryError>;

    /// Delete the account, its pets and consultations, and free any slots it
    /// holds. Returns `false` when no account matched.
    async fn delete(&self, id: AccountId) -> Result<bool, AccountRepositoryError>;
}
