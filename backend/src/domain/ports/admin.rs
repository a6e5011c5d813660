//! Driving ports for the admin dashboard.

use async_trait::async_trait;
use pagination::{Page, PageRequest};

use crate::domain::{
    AccountDetail, AccountId, AccountSummary, AdminStats, Consultation, ConsultationFilter,
    ConsultationListing, Error, SearchTerm,
};

/// Read-only projections.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AdminQuery: Send + Sync {
    async fn stats(&self) -> Result<AdminStats, Error>;

    async fn search_accounts(
        &self,
        search: SearchTerm,
        page: PageRequest,
    ) -> Result<Page<AccountSummary>, Error>;

    async fn account_detail(&self, id: AccountId) -> Result<AccountDetail, Error>;

    async fn account_consultations(&self, id: AccountId) -> Result<Vec<Consultation>, Error>;

    async fn search_consultations(
        &self,
        filter: ConsultationFilter,
        page: PageRequest,
    ) -> Result<Page<ConsultationListing>, Error>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AdminCommand: Send + Sync {
    /// Remove an account with its pets and consultations.
    async fn delete_account(&self, id: AccountId) -> Result<(), Error>;
}
