//! PostgreSQL-backed `SlotRepository`.
//!
//! Reservation is a single `INSERT ... ON CONFLICT DO UPDATE ... WHERE
//! is_available` statement. The unique `(slot_date, time_slot)` constraint
//! serialises concurrent writers, and the guarded update only flips a row
//! that is still free, so exactly one caller observes an affected row.
//!
//! Release is the mirror image: the `UPDATE` only matches a held row whose
//! holder is the caller (any holder for administrators), so a reservation
//! taken over between a caller's read and write is never cleared.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::sql_types::{Date, Nullable, Text, Uuid as SqlUuid};
use diesel_async::RunQueryDsl;
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{SlotRelease, SlotRepository, SlotRepositoryError};
use crate::domain::{
    AccountId, BookedSlot, ConsultationId, SlotDate, SlotRecord, SlotReservation, TimeSlot,
};

use super::diesel_basic_error_mapping::{
    foreign_key_violation, map_basic_diesel_error, map_basic_pool_error, unique_violation,
};
use super::models::{BookedSlotRow, SlotRow};
use super::pool::{DbPool, PoolError};
use super::schema::appointment_slots;

const RESERVE_SQL: &str = "\
INSERT INTO appointment_slots \
    (id, slot_date, time_slot, is_available, account_id, consultation_id) \
VALUES ($1, $2, $3, FALSE, $4, $5) \
ON CONFLICT (slot_date, time_slot) DO UPDATE \
SET is_available = FALSE, \
    account_id = EXCLUDED.account_id, \
    consultation_id = EXCLUDED.consultation_id, \
    updated_at = now() \
WHERE appointment_slots.is_available";

const RELEASE_SQL: &str = "\
UPDATE appointment_slots \
SET is_available = TRUE, \
    account_id = NULL, \
    consultation_id = NULL, \
    updated_at = now() \
WHERE slot_date = $1 \
  AND time_slot = $2 \
  AND NOT is_available \
  AND ($3::uuid IS NULL OR account_id = $3)";

const BOOKED_SQL: &str = "\
SELECT s.slot_date, s.time_slot, s.account_id, s.consultation_id, \
       a.first_name || ' ' || a.last_name AS holder_name, \
       a.mobile AS holder_mobile, \
       p.name AS pet_name \
FROM appointment_slots s \
LEFT JOIN accounts a ON a.id = s.account_id \
LEFT JOIN consultations c ON c.id = s.consultation_id \
LEFT JOIN pets p ON p.id = c.pet_id \
WHERE NOT s.is_available \
ORDER BY s.slot_date, s.time_slot";

/// Diesel-backed implementation of the slot repository port.
#[derive(Clone)]
pub struct DieselSlotRepository {
    pool: DbPool,
}

impl DieselSlotRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> SlotRepositoryError {
    map_basic_pool_error(error, SlotRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> SlotRepositoryError {
    if let Some(constraint) = foreign_key_violation(&error) {
        return SlotRepositoryError::missing_reference(constraint);
    }
    map_basic_diesel_error(
        error,
        SlotRepositoryError::query,
        SlotRepositoryError::connection,
    )
}

fn parse_time(raw: &str) -> Result<TimeSlot, SlotRepositoryError> {
    TimeSlot::parse(raw)
        .map_err(|_| SlotRepositoryError::query(format!("stored time slot {raw:?} is off the grid")))
}

fn row_to_record(row: SlotRow) -> Result<SlotRecord, SlotRepositoryError> {
    Ok(SlotRecord {
        date: SlotDate::from_naive(row.slot_date),
        time: parse_time(&row.time_slot)?,
        available: row.is_available,
        account_id: row.account_id.map(AccountId::from_uuid),
        consultation_id: row.consultation_id.map(ConsultationId::from_uuid),
    })
}

fn row_to_booked(row: BookedSlotRow) -> Result<BookedSlot, SlotRepositoryError> {
    Ok(BookedSlot {
        date: SlotDate::from_naive(row.slot_date),
        time: parse_time(&row.time_slot)?,
        account_id: row.account_id.map(AccountId::from_uuid),
        consultation_id: row.consultation_id.map(ConsultationId::from_uuid),
        holder_name: row.holder_name,
        holder_mobile: row.holder_mobile,
        pet_name: row.pet_name,
    })
}

#[async_trait]
impl SlotRepository for DieselSlotRepository {
    async fn find_for_date(&self, date: SlotDate) -> Result<Vec<SlotRecord>, SlotRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<SlotRow> = appointment_slots::table
            .filter(appointment_slots::slot_date.eq(date.as_naive()))
            .order(appointment_slots::time_slot.asc())
            .select(SlotRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter().map(row_to_record).collect()
    }

    async fn find(
        &self,
        date: SlotDate,
        time: TimeSlot,
    ) -> Result<Option<SlotRecord>, SlotRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<SlotRow> = appointment_slots::table
            .filter(appointment_slots::slot_date.eq(date.as_naive()))
            .filter(appointment_slots::time_slot.eq(time.to_string()))
            .select(SlotRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_record).transpose()
    }

    async fn try_reserve(&self, reservation: &SlotReservation) -> Result<(), SlotRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let date = reservation.date.to_string();
        let time = reservation.time.to_string();
        let outcome = diesel::sql_query(RESERVE_SQL)
            .bind::<SqlUuid, _>(Uuid::new_v4())
            .bind::<Date, _>(reservation.date.as_naive())
            .bind::<Text, _>(time.as_str())
            .bind::<SqlUuid, _>(*reservation.account_id.as_uuid())
            .bind::<Nullable<SqlUuid>, _>(reservation.consultation_id.map(|id| *id.as_uuid()))
            .execute(&mut conn)
            .await;

        match outcome {
            Ok(0) => Err(SlotRepositoryError::taken(date, time)),
            Ok(_) => Ok(()),
            Err(error) if unique_violation(&error).is_some() => {
                debug!(%date, %time, "slot reservation lost on unique constraint");
                Err(SlotRepositoryError::taken(date, time))
            }
            Err(error) => Err(map_diesel_error(error)),
        }
    }

    async fn release(
        &self,
        date: SlotDate,
        time: TimeSlot,
        holder: Option<AccountId>,
    ) -> Result<SlotRelease, SlotRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::sql_query(RELEASE_SQL)
            .bind::<Date, _>(date.as_naive())
            .bind::<Text, _>(time.to_string())
            .bind::<Nullable<SqlUuid>, _>(holder.map(|id| *id.as_uuid()))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        if updated > 0 {
            return Ok(SlotRelease::Released);
        }

        let current: Option<SlotRow> = appointment_slots::table
            .filter(appointment_slots::slot_date.eq(date.as_naive()))
            .filter(appointment_slots::time_slot.eq(time.to_string()))
            .select(SlotRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(match current {
            None => SlotRelease::NotFound,
            Some(row) if row.is_available => SlotRelease::AlreadyAvailable,
            Some(_) => {
                debug!(%date, %time, "slot release refused: held by another account");
                SlotRelease::HeldByOther
            }
        })
    }

    async fn booked(&self) -> Result<Vec<BookedSlot>, SlotRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<BookedSlotRow> = diesel::sql_query(BOOKED_SQL)
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter().map(row_to_booked).collect()
    }
}
