//! Port abstraction for admin read projections.
use async_trait::async_trait;
use chrono::NaiveDate;
use pagination::PageRequest;

use crate::domain::{AccountSummary, AdminStats, ConsultationFilter, ConsultationListing, SearchTerm};

use super::{CountedRows, define_port_error};

define_port_error! {
    /// Errors raised by admin projection adapters.
    pub enum AdminRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "admin repository connection failed: {message}",
        /// Query failed during execution.
        Query { message: String } => "admin repository query failed: {message}",
    }
}

/// Read-only aggregation queries; implementations never write.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AdminRepository: Send + Sync {
    /// Dashboard counters relative to `today` (UTC).
    async fn stats(&self, today: NaiveDate) -> Result<AdminStats, AdminRepositoryError>;

    /// Accounts whose names or mobile contain the term, newest first.
    async fn search_accounts(
        &self,
        search: &SearchTerm,
        page: PageRequest,
    ) -> Result<CountedRows<AccountSummary>, AdminRepositoryError>;

    async fn search_consultations(
        &self,
        filter: &ConsultationFilter,
        page: PageRequest,
    ) -> Result<CountedRows<ConsultationListing>, AdminRepositoryError>;
}
