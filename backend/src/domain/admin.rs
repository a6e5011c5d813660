//! Read projections used by the admin dashboard.

use chrono::{DateTime, NaiveDate, Utc};

use crate::domain::{Account, Consultation, ConsultationStatus, Pet};

/// Number of days covered by the recent registrations series.
pub const RECENT_REGISTRATION_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusCount {
    pub status: ConsultationStatus,
    pub count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub count: u64,
}

/// Dashboard counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminStats {
    pub total_accounts: u64,
    pub total_consultations: u64,
    pub pending_consultations: u64,
    pub accounts_today: u64,
    /// Ordered by count, highest first.
    pub consultations_by_status: Vec<StatusCount>,
    /// Registrations per day over the last week, newest first.
    pub recent_registrations: Vec<DailyCount>,
}

/// Account row plus aggregate counts for the admin user list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountSummary {
    pub account: Account,
    pub pet_count: u64,
    pub consultation_count: u64,
    pub last_consultation_at: Option<DateTime<Utc>>,
}

/// Everything the admin sees for one account.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountDetail {
    pub account: Account,
    pub pets: Vec<Pet>,
    pub consultations: Vec<Consultation>,
}

/// Case-insensitive substring search term.
///
/// Blank input means no filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchTerm(Option<String>);

impl SearchTerm {
    pub fn new(raw: Option<&str>) -> Self {
        Self(
            raw.map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_owned),
        )
    }

    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }

    /// `%term%` with LIKE metacharacters escaped.
    pub fn like_pattern(&self) -> Option<String> {
        self.0.as_ref().map(|term| {
            let escaped = term
                .replace('\\', "\\\\")
                .replace('%', "\\%")
                .replace('_', "\\_");
            format!("%{escaped}%")
        })
    }

    /// In-memory equivalent of the SQL filter.
    pub fn matches(&self, haystacks: &[&str]) -> bool {
        match &self.0 {
            None => true,
            Some(term) => {
                let needle = term.to_lowercase();
                haystacks
                    .iter()
                    .any(|h| h.to_lowercase().contains(&needle))
            }
        }
    }
}

/// Sortable columns of the admin consultation list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConsultationSort {
    #[default]
    CreatedAt,
    UpdatedAt,
    Status,
    AppointmentDate,
}

impl ConsultationSort {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "created_at" | "createdAt" => Some(Self::CreatedAt),
            "updated_at" | "updatedAt" => Some(Self::UpdatedAt),
            "status" => Some(Self::Status),
            "appointment_date" | "appointmentDate" => Some(Self::AppointmentDate),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }
}

/// Filters for the admin consultation list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsultationFilter {
    pub status: Option<ConsultationStatus>,
    /// Matches holder name, mobile, or pet name.
    pub search: SearchTerm,
    pub sort: ConsultationSort,
    pub order: SortOrder,
}

/// Consultation joined with the names the admin list displays.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsultationListing {
    pub consultation: Consultation,
    pub owner_name: String,
    pub owner_mobile: String,
    pub pet_name: Option<String>,
}
