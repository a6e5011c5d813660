//! Port abstraction for pet persistence adapters.
use async_trait::async_trait;

use crate::domain::{AccountId, Pet, PetId, PetProfile};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by pet repository adapters.
    pub enum PetRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "pet repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "pet repository query failed: {message}",
        /// A referenced row (usually the owning account) no longer exists.
        MissingReference { constraint: String } => "referenced row is missing: {constraint}",
    }
}

/// Every lookup is scoped to the owning account.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PetRepository: Send + Sync {
    /// Pets owned by the account, oldest first.
    async fn list_for_owner(&self, owner: AccountId) -> Result<Vec<Pet>, PetRepositoryError>;

    async fn find_for_owner(
        &self,
        owner: AccountId,
        id: PetId,
    ) -> Result<Option<Pet>, PetRepositoryError>;

    async fn insert(&self, pet: &Pet) -> Result<(), PetRepositoryError>;

    /// Replace the profile; `None` when the pet is missing or owned elsewhere.
    async fn update_profile(
        &self,
        owner: AccountId,
        id: PetId,
        profile: &PetProfile,
    ) -> Result<Option<Pet>, PetRepositoryError>;

    /// Returns `false` when nothing was deleted.
    async fn delete(&self, owner: AccountId, id: PetId) -> Result<bool, PetRepositoryError>;
}
