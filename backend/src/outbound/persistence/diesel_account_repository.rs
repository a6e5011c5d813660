//! PostgreSQL-backed `AccountRepository`.
//!
//! Account creation and deletion run in transactions: registration writes the
//! optional first pet alongside the account, and deletion frees held slots
//! before the cascade removes pets and consultations.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use uuid::Uuid;

use crate::domain::ports::{AccountRepository, AccountRepositoryError, NewAccount};
use crate::domain::{Account, AccountCredentials, AccountId, MobileNumber, PersonName};

use super::diesel_basic_error_mapping::{
    map_basic_diesel_error, map_basic_pool_error, unique_violation,
};
use super::models::{AccountCredentialsRow, AccountRow, NewAccountRow};
use super::pool::{DbPool, PoolError};
use super::row_conversions::{account_from_row, new_pet_row};
use super::schema::{accounts, appointment_slots, pets};

const MOBILE_CONSTRAINT: &str = "accounts_mobile_key";

/// Diesel-backed implementation of the account repository port.
#[derive(Clone)]
pub struct DieselAccountRepository {
    pool: DbPool,
}

impl DieselAccountRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> AccountRepositoryError {
    map_basic_pool_error(error, AccountRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> AccountRepositoryError {
    map_basic_diesel_error(
        error,
        AccountRepositoryError::query,
        AccountRepositoryError::connection,
    )
}

fn row_to_account(row: AccountRow) -> Result<Account, AccountRepositoryError> {
    account_from_row(row).map_err(AccountRepositoryError::query)
}

#[async_trait]
impl AccountRepository for DieselAccountRepository {
    async fn create(&self, new_account: &NewAccount) -> Result<(), AccountRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let account = &new_account.account;
        let account_row = NewAccountRow {
            id: *account.id().as_uuid(),
            first_name: account.name().first(),
            last_name: account.name().last(),
            mobile: account.mobile().as_ref(),
            password_hash: &new_account.password_hash,
            created_at: account.created_at(),
            updated_at: account.created_at(),
        };
        let pet_row = new_account
            .first_pet
            .as_ref()
            .map(new_pet_row)
            .transpose()
            .map_err(AccountRepositoryError::query)?;

        let outcome = conn
            .transaction::<_, diesel::result::Error, _>(|conn| {
                async move {
                    diesel::insert_into(accounts::table)
                        .values(&account_row)
                        .execute(conn)
                        .await?;
                    if let Some(pet_row) = pet_row.as_ref() {
                        diesel::insert_into(pets::table)
                            .values(pet_row)
                            .execute(conn)
                            .await?;
                    }
                    Ok(())
                }
                .scope_boxed()
            })
            .await;

        match outcome {
            Ok(()) => Ok(()),
            Err(error) if unique_violation(&error) == Some(MOBILE_CONSTRAINT) => Err(
                AccountRepositoryError::duplicate_mobile(account.mobile().as_ref()),
            ),
            Err(error) => Err(map_diesel_error(error)),
        }
    }

    async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, AccountRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = accounts::table
            .filter(accounts::id.eq(id.as_uuid()))
            .select(AccountRow::as_select())
            .first::<AccountRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_account).transpose()
    }

    async fn find_credentials(
        &self,
        mobile: &MobileNumber,
    ) -> Result<Option<AccountCredentials>, AccountRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = accounts::table
            .filter(accounts::mobile.eq(mobile.as_ref()))
            .select(AccountCredentialsRow::as_select())
            .first::<AccountCredentialsRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(|row| {
            Ok(AccountCredentials {
                account: row_to_account(row.account)?,
                password_hash: row.password_hash,
            })
        })
        .transpose()
    }

    async fn mobile_exists(&self, mobile: &MobileNumber) -> Result<bool, AccountRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::select(diesel::dsl::exists(
            accounts::table.filter(accounts::mobile.eq(mobile.as_ref())),
        ))
        .get_result(&mut conn)
        .await
        .map_err(map_diesel_error)
    }

    async fn update_name(
        &self,
        id: AccountId,
        name: &PersonName,
    ) -> Result<Option<Account>, AccountRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = diesel::update(accounts::table.filter(accounts::id.eq(id.as_uuid())))
            .set((
                accounts::first_name.eq(name.first()),
                accounts::last_name.eq(name.last()),
                accounts::updated_at.eq(Utc::now()),
            ))
            .returning(AccountRow::as_returning())
            .get_result::<AccountRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_account).transpose()
    }

    async fn delete(&self, id: AccountId) -> Result<bool, AccountRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let account_id = *id.as_uuid();
        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            async move {
                diesel::update(
                    appointment_slots::table
                        .filter(appointment_slots::account_id.eq(account_id)),
                )
                .set((
                    appointment_slots::is_available.eq(true),
                    appointment_slots::account_id.eq(None::<Uuid>),
                    appointment_slots::consultation_id.eq(None::<Uuid>),
                    appointment_slots::updated_at.eq(diesel::dsl::now),
                ))
                .execute(conn)
                .await?;
                let deleted = diesel::delete(accounts::table.filter(accounts::id.eq(account_id)))
                    .execute(conn)
                    .await?;
                Ok(deleted > 0)
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }
}

#[cfg(test)]
mod tests {
    //! Error mapping coverage; queries run against embedded PostgreSQL in the
    //! integration suite.
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn pool_error_maps_to_connection_error() {
        let err = map_pool_error(PoolError::checkout("connection refused"));
        assert!(matches!(err, AccountRepositoryError::Connection { .. }));
        assert!(err.to_string().contains("connection refused"));
    }

    #[rstest]
    fn invalid_stored_mobile_is_a_query_error() {
        let row = AccountRow {
            id: Uuid::new_v4(),
            first_name: "Sara".to_owned(),
            last_name: "Ahmadi".to_owned(),
            mobile: "not-a-number".to_owned(),
            created_at: Utc::now(),
        };
        let err = row_to_account(row).expect_err("invalid mobile");
        assert!(matches!(err, AccountRepositoryError::Query { .. }));
    }
}
