//! Driving ports for consultation submission and review.

use async_trait::async_trait;
use pagination::{Page, PageRequest};

use crate::domain::{
    AccountId, Appointment, Consultation, ConsultationId, Description, Error, PetId, PetProfile,
    StatusChange,
};

use super::Upload;

/// Which pet a submission concerns.
#[derive(Debug, Clone, PartialEq)]
pub enum PetSelection {
    /// One of the caller's stored pets.
    Existing(PetId),
    /// A new pet to store for the caller before submitting.
    New(PetProfile),
    Unspecified,
}

/// Validated consultation submission.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsultationSubmission {
    pub account_id: AccountId,
    pub pet: PetSelection,
    /// `None` only when `uploads` carries the complaint instead.
    pub description: Option<Description>,
    pub appointment: Option<Appointment>,
    pub uploads: Vec<Upload>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConsultationCommand: Send + Sync {
    /// Store uploads, create a pending consultation, and reserve the
    /// requested slot. A taken slot fails the whole submission.
    async fn submit(&self, submission: ConsultationSubmission) -> Result<Consultation, Error>;

    /// Apply an admin status change, enforcing allowed transitions.
    /// Cancelling frees any slot held for the consultation.
    async fn change_status(
        &self,
        id: ConsultationId,
        change: StatusChange,
    ) -> Result<Consultation, Error>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConsultationQuery: Send + Sync {
    async fn list_for_account(
        &self,
        account: AccountId,
        page: PageRequest,
    ) -> Result<Page<Consultation>, Error>;

    /// Consultations owned by someone else are reported as not found.
    async fn get_for_account(
        &self,
        account: AccountId,
        id: ConsultationId,
    ) -> Result<Consultation, Error>;
}
