//! Driving ports for managing the caller's pets.

use async_trait::async_trait;

use crate::domain::{AccountId, Error, Pet, PetId, PetProfile};

/// Pet mutations scoped to the owning account.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PetCommand: Send + Sync {
    async fn add_pet(&self, owner: AccountId, profile: PetProfile) -> Result<Pet, Error>;

    /// Pets owned by someone else are reported as not found.
    async fn update_pet(
        &self,
        owner: AccountId,
        id: PetId,
        profile: PetProfile,
    ) -> Result<Pet, Error>;

    async fn remove_pet(&self, owner: AccountId, id: PetId) -> Result<(), Error>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PetQuery: Send + Sync {
    async fn list_pets(&self, owner: AccountId) -> Result<Vec<Pet>, Error>;
}
