//! Domain primitives, aggregates, and services.
//!
//! Purpose: Define strongly typed domain entities used by the API and
//! persistence layers, and the services implementing the driving ports.
//! Keep types immutable and validate at construction so adapters only ever
//! see well-formed values.
//!
//! Public surface:
//! - Error / ErrorCode — API error payload and stable identifiers.
//! - Account, Pet, Consultation — the three stored aggregates.
//! - SlotDate, TimeSlot — the fixed half-hour appointment grid.
//! - Identity — the caller resolved from a bearer token.
//! - `*Service` — implementations of the ports in [`ports`].

pub mod account;
mod account_service;
pub mod admin;
mod admin_service;
pub mod auth;
pub mod consultation;
mod consultation_service;
pub mod error;
pub mod ids;
pub mod pet;
mod pet_service;
pub mod ports;
pub mod slot;
mod slot_booking_service;
pub mod trace_id;

pub use self::account::{
    Account, AccountCredentials, AccountValidationError, MobileNumber, NAME_MAX, PersonName,
};
pub use self::account_service::{AccountService, AdminCredentials};
pub use self::admin::{
    AccountDetail, AccountSummary, AdminStats, ConsultationFilter, ConsultationListing,
    ConsultationSort, DailyCount, RECENT_REGISTRATION_DAYS, SearchTerm, SortOrder, StatusCount,
};
pub use self::admin_service::AdminService;
pub use self::auth::{
    AuthSession, CredentialValidationError, Identity, IssuedToken, LoginCredentials,
    PASSWORD_MIN_LEN, RegistrationDraft,
};
pub use self::consultation::{
    Appointment, Attachment, AttachmentKind, CONSULTATION_PRICE, Consultation,
    ConsultationStatus, ConsultationValidationError, DESCRIPTION_MAX, Description,
    NewConsultation, StatusChange, UnknownStatus,
};
pub use self::consultation_service::ConsultationService;
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::ids::{AccountId, ConsultationId, PetId};
pub use self::pet::{
    PET_AGE_MAX, PET_NAME_MAX, PET_WEIGHT_MAX_KG, Pet, PetGender, PetProfile, PetProfileDraft,
    PetValidationError,
};
pub use self::pet_service::PetService;
pub use self::slot::{
    BookedSlot, SLOTS_PER_DAY, SlotAvailability, SlotDate, SlotRecord, SlotReservation,
    SlotValidationError, TimeSlot, overlay_availability,
};
pub use self::slot_booking_service::SlotBookingService;
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
