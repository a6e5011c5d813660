//! Pet profile services.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::info;

use crate::domain::account_service::missing_reference;
use crate::domain::ports::{PetCommand, PetQuery, PetRepository, PetRepositoryError};
use crate::domain::{AccountId, Error, Pet, PetId, PetProfile};

pub(crate) fn map_pet_repository_error(error: PetRepositoryError) -> Error {
    match error {
        PetRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("pet repository unavailable: {message}"))
        }
        PetRepositoryError::Query { message } => {
            Error::internal(format!("pet repository error: {message}"))
        }
        PetRepositoryError::MissingReference { constraint } => missing_reference(&constraint),
    }
}

fn pet_not_found(id: PetId) -> Error {
    Error::not_found(format!("pet {id} not found"))
}

/// Pet service implementing the pet driving ports.
#[derive(Clone)]
pub struct PetService<P> {
    pet_repo: Arc<P>,
    clock: Arc<dyn Clock>,
}

impl<P> PetService<P> {
    pub fn new(pet_repo: Arc<P>, clock: Arc<dyn Clock>) -> Self {
        Self { pet_repo, clock }
    }
}

#[async_trait]
impl<P> PetCommand for PetService<P>
where
    P: PetRepository,
{
    async fn add_pet(&self, owner: AccountId, profile: PetProfile) -> Result<Pet, Error> {
        let pet = Pet {
            id: PetId::random(),
            owner,
            profile,
            created_at: self.clock.utc(),
        };
        self.pet_repo
            .insert(&pet)
            .await
            .map_err(map_pet_repository_error)?;
        info!(pet_id = %pet.id, account_id = %owner, "pet added");
        Ok(pet)
    }

    async fn update_pet(
        &self,
        owner: AccountId,
        id: PetId,
        profile: PetProfile,
    ) -> Result<Pet, Error> {
        self.pet_repo
            .update_profile(owner, id, &profile)
            .await
            .map_err(map_pet_repository_error)?
            .ok_or_else(|| pet_not_found(id))
    }

    async fn remove_pet(&self, owner: AccountId, id: PetId) -> Result<(), Error> {
        let removed = self
            .pet_repo
            .delete(owner, id)
            .await
            .map_err(map_pet_repository_error)?;
        if removed {
            info!(pet_id = %id, account_id = %owner, "pet removed");
            Ok(())
        } else {
            Err(pet_not_found(id))
        }
    }
}

#[async_trait]
impl<P> PetQuery for PetService<P>
where
    P: PetRepository,
{
    async fn list_pets(&self, owner: AccountId) -> Result<Vec<Pet>, Error> {
        self.pet_repo
            .list_for_owner(owner)
            .await
            .map_err(map_pet_repository_error)
    }
}
