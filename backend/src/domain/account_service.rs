//! Registration, login, and profile services.
//!
//! The configured administrator is checked before the account table on
//! login and never has an account row. Unknown mobiles and wrong passwords
//! produce the same `unauthorized` error.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use sha2::{Digest, Sha256};
use tracing::{info, warn};
use zeroize::Zeroizing;

use crate::domain::ports::{
    AccountCommand, AccountQuery, AccountRepository, AccountRepositoryError, NewAccount,
    PasswordHashError, PasswordHasher, TokenCodec, TokenError,
};
use crate::domain::{
    Account, AccountId, AuthSession, Error, Identity, LoginCredentials, MobileNumber, PersonName,
    Pet, PetId, RegistrationDraft,
};

pub(crate) fn map_account_repository_error(error: AccountRepositoryError) -> Error {
    match error {
        AccountRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("account repository unavailable: {message}"))
        }
        AccountRepositoryError::Query { message } => {
            Error::internal(format!("account repository error: {message}"))
        }
        AccountRepositoryError::DuplicateMobile { .. } => duplicate_mobile(),
    }
}

/// Map a write that referenced a deleted row.
///
/// A token outlives an account deleted by an administrator, so a violated
/// account key means the caller is no longer a valid principal.
pub(crate) fn missing_reference(constraint: &str) -> Error {
    if constraint.contains("account_id") {
        Error::unauthorized("account no longer exists")
    } else {
        Error::not_found("referenced record no longer exists")
    }
}

fn map_hash_error(error: PasswordHashError) -> Error {
    Error::internal(error.to_string())
}

fn map_token_error(error: TokenError) -> Error {
    match error {
        TokenError::Signing { message } => {
            Error::internal(format!("failed to issue token: {message}"))
        }
        other => Error::unauthorized(other.to_string()),
    }
}

fn duplicate_mobile() -> Error {
    Error::conflict("an account with this mobile number already exists").with_details(json!({
        "field": "mobile",
        "code": "duplicate_mobile",
    }))
}

fn invalid_credentials() -> Error {
    Error::unauthorized("invalid credentials")
}

fn account_not_found(id: AccountId) -> Error {
    Error::not_found(format!("account {id} not found"))
}

/// Out-of-band administrator login.
#[derive(Clone)]
pub struct AdminCredentials {
    mobile: MobileNumber,
    password: Zeroizing<String>,
}

impl AdminCredentials {
    pub fn new(mobile: MobileNumber, password: impl Into<String>) -> Self {
        Self {
            mobile,
            password: Zeroizing::new(password.into()),
        }
    }

    pub fn mobile(&self) -> &MobileNumber {
        &self.mobile
    }

    fn password_matches(&self, candidate: &str) -> bool {
        let expected = Sha256::digest(self.password.as_bytes());
        let actual = Sha256::digest(candidate.as_bytes());
        expected
            .iter()
            .zip(actual.iter())
            .fold(0_u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}

impl std::fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("mobile", &self.mobile)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Account service implementing the account driving ports.
#[derive(Clone)]
pub struct AccountService<A, H, T> {
    account_repo: Arc<A>,
    hasher: Arc<H>,
    tokens: Arc<T>,
    admin: Option<AdminCredentials>,
    clock: Arc<dyn Clock>,
}

impl<A, H, T> AccountService<A, H, T> {
    pub fn new(
        account_repo: Arc<A>,
        hasher: Arc<H>,
        tokens: Arc<T>,
        admin: Option<AdminCredentials>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            account_repo,
            hasher,
            tokens,
            admin,
            clock,
        }
    }
}

impl<A, H, T> AccountService<A, H, T>
where
    A: AccountRepository,
    H: PasswordHasher,
    T: TokenCodec,
{
    fn session(&self, identity: Identity, account: Option<Account>) -> Result<AuthSession, Error> {
        let token = self.tokens.issue(&identity).map_err(map_token_error)?;
        Ok(AuthSession {
            token,
            identity,
            account,
        })
    }

    fn is_admin_mobile(&self, mobile: &MobileNumber) -> bool {
        self.admin
            .as_ref()
            .is_some_and(|admin| admin.mobile() == mobile)
    }
}

#[async_trait]
impl<A, H, T> AccountCommand for AccountService<A, H, T>
where
    A: AccountRepository,
    H: PasswordHasher,
    T: TokenCodec,
{
    async fn register(&self, draft: RegistrationDraft) -> Result<AuthSession, Error> {
        let exists = self
            .account_repo
            .mobile_exists(&draft.mobile)
            .await
            .map_err(map_account_repository_error)?;
        if exists || self.is_admin_mobile(&draft.mobile) {
            return Err(duplicate_mobile());
        }

        let password_hash = self
            .hasher
            .hash(draft.password.as_str())
            .await
            .map_err(map_hash_error)?;
        let now = self.clock.utc();
        let account = Account::new(AccountId::random(), draft.name, draft.mobile, now);
        let first_pet = draft.pet.map(|profile| Pet {
            id: PetId::random(),
            owner: account.id(),
            profile,
            created_at: now,
        });

        self.account_repo
            .create(&NewAccount {
                account: account.clone(),
                password_hash,
                first_pet,
            })
            .await
            .map_err(map_account_repository_error)?;

        info!(account_id = %account.id(), "account registered");
        let identity = Identity::Account {
            id: account.id(),
            mobile: account.mobile().clone(),
        };
        self.session(identity, Some(account))
    }

    async fn login(&self, credentials: LoginCredentials) -> Result<AuthSession, Error> {
        if let Some(admin) = self
            .admin
            .as_ref()
            .filter(|admin| admin.mobile() == credentials.mobile())
        {
            if !admin.password_matches(credentials.password()) {
                warn!("rejected administrator login");
                return Err(invalid_credentials());
            }
            info!("administrator logged in");
            let identity = Identity::Admin {
                mobile: admin.mobile().clone(),
            };
            return self.session(identity, None);
        }

        let stored = self
            .account_repo
            .find_credentials(credentials.mobile())
            .await
            .map_err(map_account_repository_error)?
            .ok_or_else(invalid_credentials)?;
        let verified = self
            .hasher
            .verify(credentials.password(), &stored.password_hash)
            .await
            .map_err(map_hash_error)?;
        if !verified {
            return Err(invalid_credentials());
        }

        let account = stored.account;
        info!(account_id = %account.id(), "account logged in");
        let identity = Identity::Account {
            id: account.id(),
            mobile: account.mobile().clone(),
        };
        self.session(identity, Some(account))
    }

    async fn update_profile(&self, id: AccountId, name: PersonName) -> Result<Account, Error> {
        self.account_repo
            .update_name(id, &name)
            .await
            .map_err(map_account_repository_error)?
            .ok_or_else(|| account_not_found(id))
    }
}

#[async_trait]
impl<A, H, T> AccountQuery for AccountService<A, H, T>
where
    A: AccountRepository,
    H: PasswordHasher,
    T: TokenCodec,
{
    async fn profile(&self, id: AccountId) -> Result<Account, Error> {
        self.account_repo
            .find_by_id(id)
            .await
            .map_err(map_account_repository_error)?
            .ok_or_else(|| account_not_found(id))
    }
}

#[cfg(test)]
#[path = "account_service_tests.rs"]
mod tests;
