//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driving ports (`*Command`, `*Query`) are what inbound adapters call.
//! Driven ports (repositories, hasher, token codec, attachment store) are
//! what the domain services call. Each driven port exposes a typed error so
//! adapters map their failures into predictable variants.

mod macros;
pub(crate) use macros::define_port_error;

mod account_command;
mod account_repository;
mod admin;
mod admin_repository;
mod attachment_store;
mod consultation_command;
mod consultation_repository;
mod password_hasher;
mod pet_command;
mod pet_repository;
mod slot_booking;
mod slot_repository;
mod token_codec;

pub use account_command::{AccountCommand, AccountQuery};
#[cfg(test)]
pub use account_command::{MockAccountCommand, MockAccountQuery};
#[cfg(test)]
pub use account_repository::MockAccountRepository;
pub use account_repository::{AccountRepository, AccountRepositoryError, NewAccount};
pub use admin::{AdminCommand, AdminQuery};
#[cfg(test)]
pub use admin::{MockAdminCommand, MockAdminQuery};
#[cfg(test)]
pub use admin_repository::MockAdminRepository;
pub use admin_repository::{AdminRepository, AdminRepositoryError};
#[cfg(test)]
pub use attachment_store::MockAttachmentStore;
pub use attachment_store::{AttachmentStore, AttachmentStoreError, Upload};
pub use consultation_command::{
    ConsultationCommand, ConsultationQuery, ConsultationSubmission, PetSelection,
};
#[cfg(test)]
pub use consultation_command::{MockConsultationCommand, MockConsultationQuery};
#[cfg(test)]
pub use consultation_repository::MockConsultationRepository;
pub use consultation_repository::{
    ConsultationRepository, ConsultationRepositoryError, CountedRows,
};
#[cfg(test)]
pub use password_hasher::MockPasswordHasher;
pub use password_hasher::{PasswordHashError, PasswordHasher};
#[cfg(test)]
pub use pet_command::{MockPetCommand, MockPetQuery};
pub use pet_command::{PetCommand, PetQuery};
#[cfg(test)]
pub use pet_repository::MockPetRepository;
pub use pet_repository::{PetRepository, PetRepositoryError};
#[cfg(test)]
pub use slot_booking::{MockSlotAvailabilityQuery, MockSlotBookingCommand};
pub use slot_booking::{SlotAvailabilityQuery, SlotBookingCommand};
#[cfg(test)]
pub use slot_repository::MockSlotRepository;
pub use slot_repository::{SlotRelease, SlotRepository, SlotRepositoryError};
#[cfg(test)]
pub use token_codec::MockTokenCodec;
pub use token_codec::{TokenCodec, TokenError};
