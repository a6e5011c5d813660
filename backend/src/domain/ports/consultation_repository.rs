//! Port abstraction for consultation persistence adapters.
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pagination::PageRequest;

use crate::domain::{
    AccountId, Consultation, ConsultationId, ConsultationStatus, NewConsultation, StatusChange,
};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by consultation repository adapters.
    pub enum ConsultationRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "consultation repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "consultation repository query failed: {message}",
        /// A referenced row (usually the owning account) no longer exists.
        MissingReference { constraint: String } => "referenced row is missing: {constraint}",
    }
}

/// One page of rows plus the total row count across all pages.
#[derive(Debug, Clone, PartialEq)]
pub struct CountedRows<T> {
    pub rows: Vec<T>,
    pub total: u64,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConsultationRepository: Send + Sync {
    /// Persist a new pending consultation and return the stored row.
    async fn insert(
        &self,
        consultation: &NewConsultation,
    ) -> Result<Consultation, ConsultationRepositoryError>;

    async fn find(
        &self,
        id: ConsultationId,
    ) -> Result<Option<Consultation>, ConsultationRepositoryError>;

    /// Newest first.
    async fn list_for_account(
        &self,
        account: AccountId,
        page: PageRequest,
    ) -> Result<CountedRows<Consultation>, ConsultationRepositoryError>;

    /// Every consultation of the account, newest first.
    async fn list_all_for_account(
        &self,
        account: AccountId,
    ) -> Result<Vec<Consultation>, ConsultationRepositoryError>;

    /// Apply a status change only if the stored status still equals
    /// `expected`. `None` means the row is missing or moved on.
    ///
    /// Moving to [`ConsultationStatus::Cancelled`] also frees every slot held
    /// for the consultation. Both writes commit together or not at all.
    async fn update_status(
        &self,
        id: ConsultationId,
        expected: ConsultationStatus,
        change: &StatusChange,
        at: DateTime<Utc>,
    ) -> Result<Option<Consultation>, ConsultationRepositoryError>;

    /// Returns `false` when nothing was deleted.
    async fn delete(&self, id: ConsultationId) -> Result<bool, ConsultationRepositoryError>;
}
