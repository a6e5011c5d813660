//! PostgreSQL-backed `AdminRepository`.
//!
//! Dashboard counters use the query builder. The account list needs
//! correlated sub-selects for its aggregates and is written in SQL.

use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Nullable, Text, Timestamptz};
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use pagination::PageRequest;

use crate::domain::ports::{AdminRepository, AdminRepositoryError, CountedRows};
use crate::domain::{
    AccountSummary, AdminStats, ConsultationFilter, ConsultationListing, ConsultationSort,
    ConsultationStatus, DailyCount, RECENT_REGISTRATION_DAYS, SearchTerm, SortOrder, StatusCount,
};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::{AccountRow, AccountSummaryRow, ConsultationRow, CountRow, DailyCountRow};
use super::pool::{DbPool, PoolError};
use super::row_conversions::{account_from_row, consultation_from_row};
use super::schema::{accounts, consultations, pets};

const ACCOUNT_SEARCH_FILTER: &str = "\
WHERE $1::text IS NULL \
   OR a.first_name ILIKE $1 \
   OR a.last_name ILIKE $1 \
   OR a.mobile ILIKE $1 \
   OR (a.first_name || ' ' || a.last_name) ILIKE $1";

const ACCOUNT_SUMMARY_COLUMNS: &str = "\
SELECT a.id, a.first_name, a.last_name, a.mobile, a.created_at, \
       (SELECT COUNT(*) FROM pets p WHERE p.account_id = a.id) AS pet_count, \
       (SELECT COUNT(*) FROM consultations c WHERE c.account_id = a.id) AS consultation_count, \
       (SELECT MAX(c.created_at) FROM consultations c WHERE c.account_id = a.id) \
           AS last_consultation_at \
FROM accounts a";

const RECENT_REGISTRATIONS_SQL: &str = "\
SELECT (created_at AT TIME ZONE 'UTC')::date AS day, COUNT(*) AS count \
FROM accounts \
WHERE created_at >= $1 \
GROUP BY day \
ORDER BY day DESC";

/// Diesel-backed implementation of the admin repository port.
#[derive(Clone)]
pub struct DieselAdminRepository {
    pool: DbPool,
}

impl DieselAdminRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> AdminRepositoryError {
    map_basic_pool_error(error, AdminRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> AdminRepositoryError {
    map_basic_diesel_error(
        error,
        AdminRepositoryError::query,
        AdminRepositoryError::connection,
    )
}

fn to_count(value: i64) -> u64 {
    u64::try_from(value).unwrap_or_default()
}

fn page_bounds(page: PageRequest) -> Result<(i64, i64), AdminRepositoryError> {
    let offset = i64::try_from(page.offset())
        .map_err(|_| AdminRepositoryError::query("page offset out of range"))?;
    Ok((offset, i64::from(page.limit())))
}

/// First instant of `day` and of the following day, in UTC.
fn day_bounds(
    day: NaiveDate,
) -> Result<(chrono::DateTime<chrono::Utc>, chrono::DateTime<chrono::Utc>), AdminRepositoryError> {
    let next = day
        .checked_add_days(Days::new(1))
        .ok_or_else(|| AdminRepositoryError::query("date out of range"))?;
    Ok((
        day.and_time(chrono::NaiveTime::MIN).and_utc(),
        next.and_time(chrono::NaiveTime::MIN).and_utc(),
    ))
}

fn registration_window_start(today: NaiveDate) -> Result<NaiveDate, AdminRepositoryError> {
    let span = u64::try_from(RECENT_REGISTRATION_DAYS - 1).unwrap_or_default();
    today
        .checked_sub_days(Days::new(span))
        .ok_or_else(|| AdminRepositoryError::query("date out of range"))
}

fn summary_from_row(row: AccountSummaryRow) -> Result<AccountSummary, AdminRepositoryError> {
    let account = account_from_row(AccountRow {
        id: row.id,
        first_name: row.first_name,
        last_name: row.last_name,
        mobile: row.mobile,
        created_at: row.created_at,
    })
    .map_err(AdminRepositoryError::query)?;
    Ok(AccountSummary {
        account,
        pet_count: to_count(row.pet_count),
        consultation_count: to_count(row.consultation_count),
        last_consultation_at: row.last_consultation_at,
    })
}

type ListingRow = (ConsultationRow, String, String, String, Option<String>);

fn listing_from_row(row: ListingRow) -> Result<ConsultationListing, AdminRepositoryError> {
    let (consultation, first_name, last_name, mobile, pet_name) = row;
    Ok(ConsultationListing {
        consultation: consultation_from_row(consultation).map_err(AdminRepositoryError::query)?,
        owner_name: format!("{first_name} {last_name}"),
        owner_mobile: mobile,
        pet_name,
    })
}

/// Joined consultation listing with the filter applied.
fn filtered_listings<'a>(
    filter: &ConsultationFilter,
    pattern: Option<&'a str>,
) -> consultation_listing::BoxedQuery<'a> {
    let mut query = consultation_listing::source().into_boxed::<Pg>();
    if let Some(status) = filter.status {
        query = query.filter(consultations::status.eq(status.as_str()));
    }
    if let Some(pattern) = pattern {
        query = query.filter(
            accounts::first_name
                .ilike(pattern)
                .or(accounts::last_name.ilike(pattern))
                .or(accounts::mobile.ilike(pattern))
                .or(pets::name.nullable().ilike(pattern)),
        );
    }
    query
}

mod consultation_listing {
    //! Join used by the admin consultation list.
    use diesel::dsl::{InnerJoin, IntoBoxed, LeftJoin};
    use diesel::pg::Pg;
    use diesel::prelude::*;

    use super::super::schema::{accounts, consultations, pets};

    pub(super) type Source = LeftJoin<InnerJoin<consultations::table, accounts::table>, pets::table>;
    pub(super) type BoxedQuery<'a> = IntoBoxed<'a, Source, Pg>;

    pub(super) fn source() -> Source {
        consultations::table
            .inner_join(accounts::table)
            .left_join(pets::table)
    }
}

impl DieselAdminRepository {
    async fn status_counts(
        conn: &mut AsyncPgConnection,
    ) -> Result<Vec<StatusCount>, AdminRepositoryError> {
        let rows: Vec<(String, i64)> = consultations::table
            .group_by(consultations::status)
            .select((consultations::status, diesel::dsl::count_star()))
            .order(diesel::dsl::count_star().desc())
            .load(conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter()
            .map(|(status, count)| {
                let status = status
                    .parse::<ConsultationStatus>()
                    .map_err(|err| AdminRepositoryError::query(err.to_string()))?;
                Ok(StatusCount {
                    status,
                    count: to_count(count),
                })
            })
            .collect()
    }
}

#[async_trait]
impl AdminRepository for DieselAdminRepository {
    async fn stats(&self, today: NaiveDate) -> Result<AdminStats, AdminRepositoryError> {
        let (day_start, day_end) = day_bounds(today)?;
        let window_start = registration_window_start(today)?
            .and_time(chrono::NaiveTime::MIN)
            .and_utc();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let total_accounts: i64 = accounts::table
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let total_consultations: i64 = consultations::table
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let pending: i64 = consultations::table
            .filter(consultations::status.eq(ConsultationStatus::Pending.as_str()))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let accounts_today: i64 = accounts::table
            .filter(accounts::created_at.ge(day_start))
            .filter(accounts::created_at.lt(day_end))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let consultations_by_status = Self::status_counts(&mut conn).await?;
        let recent: Vec<DailyCountRow> = diesel::sql_query(RECENT_REGISTRATIONS_SQL)
            .bind::<Timestamptz, _>(window_start)
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(AdminStats {
            total_accounts: to_count(total_accounts),
            total_consultations: to_count(total_consultations),
            pending_consultations: to_count(pending),
            accounts_today: to_count(accounts_today),
            consultations_by_status,
            recent_registrations: recent
                .into_iter()
                .map(|row| DailyCount {
                    date: row.day,
                    count: to_count(row.count),
                })
                .collect(),
        })
    }

    async fn search_accounts(
        &self,
        search: &SearchTerm,
        page: PageRequest,
    ) -> Result<CountedRows<AccountSummary>, AdminRepositoryError> {
        let (offset, limit) = page_bounds(page)?;
        let pattern = search.like_pattern();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let total: CountRow = diesel::sql_query(format!(
            "SELECT COUNT(*) AS count FROM accounts a {ACCOUNT_SEARCH_FILTER}"
        ))
        .bind::<Nullable<Text>, _>(pattern.as_deref())
        .get_result(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        let rows: Vec<AccountSummaryRow> = diesel::sql_query(format!(
            "{ACCOUNT_SUMMARY_COLUMNS} {ACCOUNT_SEARCH_FILTER} \
             ORDER BY a.created_at DESC, a.id DESC LIMIT $2 OFFSET $3"
        ))
        .bind::<Nullable<Text>, _>(pattern.as_deref())
        .bind::<BigInt, _>(limit)
        .bind::<BigInt, _>(offset)
        .load(&mut conn)
        .await
        .map_err(map_diesel_error)?;

        Ok(CountedRows {
            rows: rows
                .into_iter()
                .map(summary_from_row)
                .collect::<Result<_, _>>()?,
            total: to_count(total.count),
        })
    }

    async fn search_consultations(
        &self,
        filter: &ConsultationFilter,
        page: PageRequest,
    ) -> Result<CountedRows<ConsultationListing>, AdminRepositoryError> {
        let (offset, limit) = page_bounds(page)?;
        let pattern = filter.search.like_pattern();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let total: i64 = filtered_listings(filter, pattern.as_deref())
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let mut query = filtered_listings(filter, pattern.as_deref());
        query = match (filter.sort, filter.order) {
            (ConsultationSort::CreatedAt, SortOrder::Asc) => {
                query.order(consultations::created_at.asc())
            }
            (ConsultationSort::CreatedAt, SortOrder::Desc) => {
                query.order(consultations::created_at.desc())
            }
            (ConsultationSort::UpdatedAt, SortOrder::Asc) => {
                query.order(consultations::updated_at.asc())
            }
            (ConsultationSort::UpdatedAt, SortOrder::Desc) => {
                query.order(consultations::updated_at.desc())
            }
            (ConsultationSort::Status, SortOrder::Asc) => query.order(consultations::status.asc()),
            (ConsultationSort::Status, SortOrder::Desc) => {
                query.order(consultations::status.desc())
            }
            (ConsultationSort::AppointmentDate, SortOrder::Asc) => query.order((
                consultations::appointment_date.asc().nulls_last(),
                consultations::appointment_time.asc().nulls_last(),
            )),
            (ConsultationSort::AppointmentDate, SortOrder::Desc) => query.order((
                consultations::appointment_date.desc().nulls_last(),
                consultations::appointment_time.desc().nulls_last(),
            )),
        };
        let rows: Vec<ListingRow> = query
            .then_order_by(consultations::id.desc())
            .select((
                ConsultationRow::as_select(),
                accounts::first_name,
                accounts::last_name,
                accounts::mobile,
                pets::name.nullable(),
            ))
            .offset(offset)
            .limit(limit)
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(CountedRows {
            rows: rows
                .into_iter()
                .map(listing_from_row)
                .collect::<Result<_, _>>()?,
            total: to_count(total),
        })
    }
}
