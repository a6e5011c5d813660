//! Driving ports for registration, login, and profile use-cases.
//!
//! Inbound adapters call these ports without knowing how accounts are stored
//! or how credentials are hashed and signed. Handler tests substitute mocks.

use async_trait::async_trait;

use crate::domain::{Account, AccountId, AuthSession, Error, LoginCredentials, PersonName, RegistrationDraft};

/// Account mutations and authentication.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountCommand: Send + Sync {
    /// Create an account and sign it in. Duplicate mobiles are a conflict.
    async fn register(&self, draft: RegistrationDraft) -> Result<AuthSession, Error>;

    /// Authenticate as the administrator or an account holder.
    async fn login(&self, credentials: LoginCredentials) -> Result<AuthSession, Error>;

    async fn update_profile(&self, id: AccountId, name: PersonName) -> Result<Account, Error>;
}

/// Account reads.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountQuery: Send + Sync {
    async fn profile(&self, id: AccountId) -> Result<Account, Error>;
}
