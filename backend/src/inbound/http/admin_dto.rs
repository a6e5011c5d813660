//! Request and response payloads for the admin dashboard.

use pagination::{Page, PageParams};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{
    AccountDetail, AccountSummary, AdminStats, ConsultationFilter, ConsultationListing,
    ConsultationSort, ConsultationStatus, DailyCount, Error, SearchTerm, SortOrder, StatusChange,
    StatusCount,
};

use super::dto::{AccountResponse, ConsultationResponse, PaginationResponse, PetResponse};
use super::validation::{FieldName, invalid_value_error, missing_field_error};

/// Query string of `GET /api/admin/users`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AccountSearchQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    /// Case-insensitive match on first name, last name, or mobile.
    pub search: Option<String>,
}

impl AccountSearchQuery {
    pub(crate) fn split(self) -> (SearchTerm, PageParams) {
        (
            SearchTerm::new(self.search.as_deref()),
            PageParams {
                page: self.page,
                limit: self.limit,
            },
        )
    }
}

/// Query string of `GET /api/admin/consultations`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
pub struct ConsultationSearchQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    /// `pending`, `in_review`, `resolved`, or `cancelled`; `all` for no filter.
    pub status: Option<String>,
    /// Case-insensitive match on holder name, mobile, or pet name.
    pub search: Option<String>,
    /// `created_at`, `updated_at`, `status`, or `appointment_date`.
    pub sort_by: Option<String>,
    /// `asc` or `desc`.
    pub sort_order: Option<String>,
}

impl ConsultationSearchQuery {
    pub(crate) fn split(self) -> Result<(ConsultationFilter, PageParams), Error> {
        let status = self
            .status
            .filter(|raw| !raw.trim().is_empty() && !raw.trim().eq_ignore_ascii_case("all"))
            .map(|raw| parse_status(&raw, "status"))
            .transpose()?;
        let sort = match self.sort_by.as_deref() {
            None => ConsultationSort::default(),
            Some(raw) => ConsultationSort::parse(raw).ok_or_else(|| {
                invalid_value_error(
                    FieldName::new("sortBy"),
                    "sortBy must be created_at, updated_at, status, or appointment_date",
                    raw,
                )
            })?,
        };
        let order = match self.sort_order.as_deref() {
            None => SortOrder::default(),
            Some(raw) => SortOrder::parse(raw).ok_or_else(|| {
                invalid_value_error(FieldName::new("sortOrder"), "sortOrder must be asc or desc", raw)
            })?,
        };
        let filter = ConsultationFilter {
            status,
            search: SearchTerm::new(self.search.as_deref()),
            sort,
            order,
        };
        Ok((
            filter,
            PageParams {
                page: self.page,
                limit: self.limit,
            },
        ))
    }
}

fn parse_status(raw: &str, field: &'static str) -> Result<ConsultationStatus, Error> {
    raw.parse().map_err(|_| {
        invalid_value_error(
            FieldName::new(field),
            "status must be pending, in_review, resolved, or cancelled",
            raw,
        )
    })
}

/// Status change body for `PATCH .../status` and `PUT .../{id}`.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusChangeRequest {
    #[schema(example = "in_review")]
    pub status: Option<String>,
    /// Reply shown to the account holder; omitted keeps the current reply.
    pub admin_response: Option<String>,
}

impl StatusChangeRequest {
    pub(crate) fn into_change(self) -> Result<StatusChange, Error> {
        let raw = self
            .status
            .filter(|raw| !raw.trim().is_empty())
            .ok_or_else(|| missing_field_error(FieldName::new("status")))?;
        Ok(StatusChange {
            status: parse_status(&raw, "status")?,
            admin_response: self.admin_response,
        })
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StatusCountResponse {
    pub status: ConsultationStatus,
    pub count: u64,
}

impl From<StatusCount> for StatusCountResponse {
    fn from(value: StatusCount) -> Self {
        Self {
            status: value.status,
            count: value.count,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DailyCountResponse {
    #[schema(example = "2025-01-10")]
    pub date: String,
    pub count: u64,
}

impl From<DailyCount> for DailyCountResponse {
    fn from(value: DailyCount) -> Self {
        Self {
            date: value.date.format("%Y-%m-%d").to_string(),
            count: value.count,
        }
    }
}

/// Dashboard counters.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub total_accounts: u64,
    pub total_consultations: u64,
    pub pending_consultations: u64,
    pub accounts_today: u64,
    pub consultations_by_status: Vec<StatusCountResponse>,
    pub recent_registrations: Vec<DailyCountResponse>,
}

impl From<AdminStats> for StatsResponse {
    fn from(value: AdminStats) -> Self {
        Self {
            total_accounts: value.total_accounts,
            total_consultations: value.total_consultations,
            pending_consultations: value.pending_consultations,
            accounts_today: value.accounts_today,
            consultations_by_status: value
                .consultations_by_status
                .into_iter()
                .map(Into::into)
                .collect(),
            recent_registrations: value
                .recent_registrations
                .into_iter()
                .map(Into::into)
                .collect(),
        }
    }
}

/// Account row of the admin user list.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountSummaryResponse {
    #[serde(flatten)]
    pub account: AccountResponse,
    pub pet_count: u64,
    pub consultation_count: u64,
    pub last_consultation_at: Option<String>,
}

impl From<AccountSummary> for AccountSummaryResponse {
    fn from(value: AccountSummary) -> Self {
        Self {
            account: value.account.into(),
            pet_count: value.pet_count,
            consultation_count: value.consultation_count,
            last_consultation_at: value.last_consultation_at.map(|at| at.to_rfc3339()),
        }
    }
}

/// One page of the admin user list.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AccountPageResponse {
    pub items: Vec<AccountSummaryResponse>,
    pub pagination: PaginationResponse,
}

impl From<Page<AccountSummary>> for AccountPageResponse {
    fn from(value: Page<AccountSummary>) -> Self {
        Self {
            items: value.items.into_iter().map(Into::into).collect(),
            pagination: value.pagination.into(),
        }
    }
}

/// Account with its pets and consultations.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AccountDetailResponse {
    pub account: AccountResponse,
    pub pets: Vec<PetResponse>,
    pub consultations: Vec<ConsultationResponse>,
}

impl From<AccountDetail> for AccountDetailResponse {
    fn from(value: AccountDetail) -> Self {
        Self {
            account: value.account.into(),
            pets: value.pets.into_iter().map(Into::into).collect(),
            consultations: value.consultations.into_iter().map(Into::into).collect(),
        }
    }
}

/// Consultation row of the admin list, with holder and pet names.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConsultationListingResponse {
    #[serde(flatten)]
    pub consultation: ConsultationResponse,
    pub user_name: String,
    pub user_mobile: String,
    pub pet_name: Option<String>,
}

impl From<ConsultationListing> for ConsultationListingResponse {
    fn from(value: ConsultationListing) -> Self {
        Self {
            consultation: value.consultation.into(),
            user_name: value.owner_name,
            user_mobile: value.owner_mobile,
            pet_name: value.pet_name,
        }
    }
}

/// One page of the admin consultation list.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ConsultationListingPageResponse {
    pub items: Vec<ConsultationListingResponse>,
    pub pagination: PaginationResponse,
}

impl From<Page<ConsultationListing>> for ConsultationListingPageResponse {
    fn from(value: Page<ConsultationListing>) -> Self {
        Self {
            items: value.items.into_iter().map(Into::into).collect(),
            pagination: value.pagination.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use rstest::rstest;

    #[rstest]
    #[case(None, None)]
    #[case(Some("all"), None)]
    #[case(Some("in_review"), Some(ConsultationStatus::InReview))]
    #[case(Some("Completed"), Some(ConsultationStatus::Resolved))]
    fn status_filter_accepts_known_values(
        #[case] raw: Option<&str>,
        #[case] expected: Option<ConsultationStatus>,
    ) {
        let (filter, _) = ConsultationSearchQuery {
            status: raw.map(str::to_owned),
            ..ConsultationSearchQuery::default()
        }
        .split()
        .expect("valid query");

        assert_eq!(filter.status, expected);
    }

    #[rstest]
    #[case(ConsultationSearchQuery { status: Some("archived".into()), ..Default::default() }, "status")]
    #[case(ConsultationSearchQuery { sort_by: Some("price".into()), ..Default::default() }, "sortBy")]
    #[case(ConsultationSearchQuery { sort_order: Some("up".into()), ..Default::default() }, "sortOrder")]
    fn unknown_filter_values_are_rejected(
        #[case] query: ConsultationSearchQuery,
        #[case] field: &str,
    ) {
        let err = query.split().expect_err("invalid query");

        assert_eq!(err.code(), ErrorCode::InvalidRequest);
        assert_eq!(
            err.details()
                .and_then(|d| d.get("field"))
                .and_then(|v| v.as_str()),
            Some(field)
        );
    }

    #[rstest]
    fn status_change_requires_status() {
        let err = StatusChangeRequest {
            status: None,
            admin_response: Some("Please book a call".into()),
        }
        .into_change()
        .expect_err("missing status");

        assert_eq!(err.code(), ErrorCode::InvalidRequest);
    }
}
