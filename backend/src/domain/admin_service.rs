//! Admin dashboard services.
//!
//! Queries are pure read projections. The only mutation is account removal,
//! which the repository performs as one cascade.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use pagination::{Page, PageRequest};
use tracing::info;

use crate::domain::account_service::map_account_repository_error;
use crate::domain::consultation_service::map_consultation_repository_error;
use crate::domain::pet_service::map_pet_repository_error;
use crate::domain::ports::{
    AccountRepository, AdminCommand, AdminQuery, AdminRepository, AdminRepositoryError,
    ConsultationRepository, PetRepository,
};
use crate::domain::{
    Account, AccountDetail, AccountId, AccountSummary, AdminStats, Consultation,
    ConsultationFilter, ConsultationListing, Error, SearchTerm,
};

fn map_admin_repository_error(error: AdminRepositoryError) -> Error {
    match error {
        AdminRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("admin repository unavailable: {message}"))
        }
        AdminRepositoryError::Query { message } => {
            Error::internal(format!("admin repository error: {message}"))
        }
    }
}

fn account_not_found(id: AccountId) -> Error {
    Error::not_found(format!("account {id} not found"))
}

/// Admin service implementing the admin driving ports.
#[derive(Clone)]
pub struct AdminService<R, A, P, C> {
    admin_repo: Arc<R>,
    account_repo: Arc<A>,
    pet_repo: Arc<P>,
    consultation_repo: Arc<C>,
    clock: Arc<dyn Clock>,
}

impl<R, A, P, C> AdminService<R, A, P, C> {
    pub fn new(
        admin_repo: Arc<R>,
        account_repo: Arc<A>,
        pet_repo: Arc<P>,
        consultation_repo: Arc<C>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            admin_repo,
            account_repo,
            pet_repo,
            consultation_repo,
            clock,
        }
    }
}

impl<R, A, P, C> AdminService<R, A, P, C>
where
    A: AccountRepository,
{
    async fn existing_account(&self, id: AccountId) -> Result<Account, Error> {
        self.account_repo
            .find_by_id(id)
            .await
            .map_err(map_account_repository_error)?
            .ok_or_else(|| account_not_found(id))
    }
}

#[async_trait]
impl<R, A, P, C> AdminQuery for AdminService<R, A, P, C>
where
    R: AdminRepository,
    A: AccountRepository,
    P: PetRepository,
    C: ConsultationRepository,
{
    async fn stats(&self) -> Result<AdminStats, Error> {
        let today = self.clock.utc().date_naive();
        self.admin_repo
            .stats(today)
            .await
            .map_err(map_admin_repository_error)
    }

    async fn search_accounts(
        &self,
        search: SearchTerm,
        page: PageRequest,
    ) -> Result<Page<AccountSummary>, Error> {
        let counted = self
            .admin_repo
            .search_accounts(&search, page)
            .await
            .map_err(map_admin_repository_error)?;
        Ok(Page::new(counted.rows, page, counted.total))
    }

    async fn account_detail(&self, id: AccountId) -> Result<AccountDetail, Error> {
        let account = self.existing_account(id).await?;
        let pets = self
            .pet_repo
            .list_for_owner(id)
            .await
            .map_err(map_pet_repository_error)?;
        let consultations = self
            .consultation_repo
            .list_all_for_account(id)
            .await
            .map_err(map_consultation_repository_error)?;
        Ok(AccountDetail {
            account,
            pets,
            consultations,
        })
    }

    async fn account_consultations(&self, id: AccountId) -> Result<Vec<Consultation>, Error> {
        self.existing_account(id).await?;
        self.consultation_repo
            .list_all_for_account(id)
            .await
            .map_err(map_consultation_repository_error)
    }

    async fn search_consultations(
        &self,
        filter: ConsultationFilter,
        page: PageRequest,
    ) -> Result<Page<ConsultationListing>, Error> {
        let counted = self
            .admin_repo
            .search_consultations(&filter, page)
            .await
            .map_err(map_admin_repository_error)?;
        Ok(Page::new(counted.rows, page, counted.total))
    }
}

#[async_trait]
impl<R, A, P, C> AdminCommand for AdminService<R, A, P, C>
where
    R: AdminRepository,
    A: AccountRepository,
    P: PetRepository,
    C: ConsultationRepository,
{
    async fn delete_account(&self, id: AccountId) -> Result<(), Error> {
        let deleted = self
            .account_repo
            .delete(id)
            .await
            .map_err(map_account_repository_error)?;
        if !deleted {
            return Err(account_not_found(id));
        }
        info!(account_id = %id, "account deleted by administrator");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{
        CountedRows, MockAccountRepository, MockAdminRepository, MockConsultationRepository,
        MockPetRepository,
    };
    use crate::domain::{ErrorCode, MobileNumber, PersonName};
    use crate::test_support::clock::{fixture_clock, fixture_timestamp};
    use rstest::rstest;

    type Service = AdminService<
        MockAdminRepository,
        MockAccountRepository,
        MockPetRepository,
        MockConsultationRepository,
    >;

    fn service(admin: MockAdminRepository, accounts: MockAccountRepository) -> Service {
        AdminService::new(
            Arc::new(admin),
            Arc::new(accounts),
            Arc::new(MockPetRepository::new()),
            Arc::new(MockConsultationRepository::new()),
            fixture_clock(),
        )
    }

    fn account() -> Account {
        Account::new(
            AccountId::random(),
            PersonName::new("Reza", "Moradi").expect("name"),
            MobileNumber::new("09125550000").expect("mobile"),
            fixture_timestamp(),
        )
    }

    #[tokio::test]
    async fn stats_are_computed_for_the_clock_date() {
        let mut admin = MockAdminRepository::new();
        admin
            .expect_stats()
            .withf(|today| *today == fixture_timestamp().date_naive())
            .return_once(|_| {
                Ok(AdminStats {
                    total_accounts: 3,
                    total_consultations: 5,
                    pending_consultations: 2,
                    accounts_today: 1,
                    consultations_by_status: Vec::new(),
                    recent_registrations: Vec::new(),
                })
            });

        let stats = service(admin, MockAccountRepository::new())
            .stats()
            .await
            .expect("stats");

        assert_eq!(stats.total_accounts, 3);
        assert_eq!(stats.pending_consultations, 2);
    }

    #[tokio::test]
    async fn search_accounts_wraps_rows_in_a_page() {
        let mut admin = MockAdminRepository::new();
        admin
            .expect_search_accounts()
            .withf(|search, _| search.as_deref() == Some("reza"))
            .return_once(|_, _| {
                Ok(CountedRows {
                    rows: vec![AccountSummary {
                        account: account(),
                        pet_count: 1,
                        consultation_count: 0,
                        last_consultation_at: None,
                    }],
                    total: 21,
                })
            });

        let page = service(admin, MockAccountRepository::new())
            .search_accounts(
                SearchTerm::new(Some(" reza ")),
                PageRequest::new(1, 10).expect("page"),
            )
            .await
            .expect("search");

        assert_eq!(page.items.len(), 1);
        assert_eq!(page.pagination.pages, 3);
    }

    #[rstest]
    #[case(true, None)]
    #[case(false, Some(ErrorCode::NotFound))]
    #[tokio::test]
    async fn delete_account_reports_missing_accounts(
        #[case] deleted: bool,
        #[case] expected: Option<ErrorCode>,
    ) {
        let mut accounts = MockAccountRepository::new();
        accounts.expect_delete().return_once(move |_| Ok(deleted));

        let result = service(MockAdminRepository::new(), accounts)
            .delete_account(AccountId::random())
            .await;

        assert_eq!(result.err().map(|err| err.code()), expected);
    }

    #[tokio::test]
    async fn account_detail_of_missing_account_is_not_found() {
        let mut accounts = MockAccountRepository::new();
        accounts.expect_find_by_id().return_once(|_| Ok(None));

        let err = service(MockAdminRepository::new(), accounts)
            .account_detail(AccountId::random())
            .await
            .expect_err("missing");

        assert_eq!(err.code(), ErrorCode::NotFound);
    }
}
