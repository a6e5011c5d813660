//! PostgreSQL-backed `PetRepository`.
//!
//! Every query is scoped by owner, so a pet belonging to another account is
//! indistinguishable from a missing one.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{PetRepository, PetRepositoryError};
use crate::domain::{AccountId, Pet, PetId, PetProfile};

use super::diesel_basic_error_mapping::{
    foreign_key_violation, map_basic_diesel_error, map_basic_pool_error,
};
use super::models::PetRow;
use super::pool::{DbPool, PoolError};
use super::row_conversions::{new_pet_row, pet_from_row, pet_profile_update};
use super::schema::pets;

/// Diesel-backed implementation of the pet repository port.
#[derive(Clone)]
pub struct DieselPetRepository {
    pool: DbPool,
}

impl DieselPetRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> PetRepositoryError {
    map_basic_pool_error(error, PetRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> PetRepositoryError {
    if let Some(constraint) = foreign_key_violation(&error) {
        return PetRepositoryError::missing_reference(constraint);
    }
    map_basic_diesel_error(error, PetRepositoryError::query, PetRepositoryError::connection)
}

fn row_to_pet(row: PetRow) -> Result<Pet, PetRepositoryError> {
    pet_from_row(row).map_err(PetRepositoryError::query)
}

#[async_trait]
impl PetRepository for DieselPetRepository {
    async fn list_for_owner(&self, owner: AccountId) -> Result<Vec<Pet>, PetRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<PetRow> = pets::table
            .filter(pets::account_id.eq(owner.as_uuid()))
            .order((pets::created_at.asc(), pets::id.asc()))
            .select(PetRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter().map(row_to_pet).collect()
    }

    async fn find_for_owner(
        &self,
        owner: AccountId,
        id: PetId,
    ) -> Result<Option<Pet>, PetRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = pets::table
            .filter(pets::id.eq(id.as_uuid()))
            .filter(pets::account_id.eq(owner.as_uuid()))
            .select(PetRow::as_select())
            .first::<PetRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_pet).transpose()
    }

    async fn insert(&self, pet: &Pet) -> Result<(), PetRepositoryError> {
        let row = new_pet_row(pet).map_err(PetRepositoryError::query)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(pets::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn update_profile(
        &self,
        owner: AccountId,
        id: PetId,
        profile: &PetProfile,
    ) -> Result<Option<Pet>, PetRepositoryError> {
        let changes = pet_profile_update(profile, Utc::now()).map_err(PetRepositoryError::query)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = diesel::update(
            pets::table
                .filter(pets::id.eq(id.as_uuid()))
                .filter(pets::account_id.eq(owner.as_uuid())),
        )
        .set(&changes)
        .returning(PetRow::as_returning())
        .get_result::<PetRow>(&mut conn)
        .await
        .optional()
        .map_err(map_diesel_error)?;
        row.map(row_to_pet).transpose()
    }

    async fn delete(&self, owner: AccountId, id: PetId) -> Result<bool, PetRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(
            pets::table
                .filter(pets::id.eq(id.as_uuid()))
                .filter(pets::account_id.eq(owner.as_uuid())),
        )
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(deleted > 0)
    }
}
