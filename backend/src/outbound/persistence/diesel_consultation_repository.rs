//! PostgreSQL-backed `ConsultationRepository`.
//!
//! Status updates are compare-and-set on the current status, so two
//! administrators acting on the same consultation cannot both win. A move to
//! `cancelled` frees the consultation's slots in the same transaction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection as _, RunQueryDsl};
use pagination::PageRequest;
use tracing::info;
use uuid::Uuid;

use crate::domain::ports::{ConsultationRepository, ConsultationRepositoryError, CountedRows};
use crate::domain::{
    AccountId, CONSULTATION_PRICE, Consultation, ConsultationId, ConsultationStatus, Description,
    NewConsultation, StatusChange,
};

use super::diesel_basic_error_mapping::{
    foreign_key_violation, map_basic_diesel_error, map_basic_pool_error,
};
use super::models::{ConsultationRow, NewConsultationRow};
use super::pool::{DbPool, PoolError};
use super::row_conversions::{attachment_columns, consultation_from_row};
use super::schema::{appointment_slots, consultations};

/// Diesel-backed implementation of the consultation repository port.
#[derive(Clone)]
pub struct DieselConsultationRepository {
    pool: DbPool,
}

impl DieselConsultationRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> ConsultationRepositoryError {
    map_basic_pool_error(error, ConsultationRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> ConsultationRepositoryError {
    if let Some(constraint) = foreign_key_violation(&error) {
        return ConsultationRepositoryError::missing_reference(constraint);
    }
    map_basic_diesel_error(
        error,
        ConsultationRepositoryError::query,
        ConsultationRepositoryError::connection,
    )
}

fn row_to_consultation(row: ConsultationRow) -> Result<Consultation, ConsultationRepositoryError> {
    consultation_from_row(row).map_err(ConsultationRepositoryError::query)
}

fn page_bounds(page: PageRequest) -> Result<(i64, i64), ConsultationRepositoryError> {
    let offset = i64::try_from(page.offset())
        .map_err(|_| ConsultationRepositoryError::query("page offset out of range"))?;
    Ok((offset, i64::from(page.limit())))
}

#[async_trait]
impl ConsultationRepository for DieselConsultationRepository {
    async fn insert(
        &self,
        consultation: &NewConsultation,
    ) -> Result<Consultation, ConsultationRepositoryError> {
        let (audio, video, document) = attachment_columns(&consultation.attachments)
            .map_err(ConsultationRepositoryError::query)?;
        let now = Utc::now();
        let row = NewConsultationRow {
            id: *consultation.id.as_uuid(),
            account_id: *consultation.account_id.as_uuid(),
            pet_id: consultation.pet_id.map(|id| *id.as_uuid()),
            description: consultation
                .description
                .as_ref()
                .map_or("", Description::as_str),
            price: CONSULTATION_PRICE,
            status: ConsultationStatus::Pending.as_str(),
            appointment_date: consultation.appointment.map(|a| a.date.as_naive()),
            appointment_time: consultation.appointment.map(|a| a.time.to_string()),
            audio_files: &audio,
            video_files: &video,
            document_files: &document,
            created_at: now,
            updated_at: now,
        };

        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let stored = diesel::insert_into(consultations::table)
            .values(&row)
            .returning(ConsultationRow::as_returning())
            .get_result::<ConsultationRow>(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        row_to_consultation(stored)
    }

    async fn find(
        &self,
        id: ConsultationId,
    ) -> Result<Option<Consultation>, ConsultationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = consultations::table
            .filter(consultations::id.eq(id.as_uuid()))
            .select(ConsultationRow::as_select())
            .first::<ConsultationRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_consultation).transpose()
    }

    async fn list_for_account(
        &self,
        account: AccountId,
        page: PageRequest,
    ) -> Result<CountedRows<Consultation>, ConsultationRepositoryError> {
        let (offset, limit) = page_bounds(page)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let total: i64 = consultations::table
            .filter(consultations::account_id.eq(account.as_uuid()))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let rows: Vec<ConsultationRow> = consultations::table
            .filter(consultations::account_id.eq(account.as_uuid()))
            .order((consultations::created_at.desc(), consultations::id.desc()))
            .offset(offset)
            .limit(limit)
            .select(ConsultationRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(CountedRows {
            rows: rows
                .into_iter()
                .map(row_to_consultation)
                .collect::<Result<_, _>>()?,
            total: u64::try_from(total).unwrap_or_default(),
        })
    }

    async fn list_all_for_account(
        &self,
        account: AccountId,
    ) -> Result<Vec<Consultation>, ConsultationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<ConsultationRow> = consultations::table
            .filter(consultations::account_id.eq(account.as_uuid()))
            .order((consultations::created_at.desc(), consultations::id.desc()))
            .select(ConsultationRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter().map(row_to_consultation).collect()
    }

    async fn update_status(
        &self,
        id: ConsultationId,
        expected: ConsultationStatus,
        change: &StatusChange,
        at: DateTime<Utc>,
    ) -> Result<Option<Consultation>, ConsultationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let (row, freed) = conn
            .transaction(|conn| {
                async move {
                    let target = consultations::table
                        .filter(consultations::id.eq(*id.as_uuid()))
                        .filter(consultations::status.eq(expected.as_str()));
                    let row = match change.admin_response.as_deref() {
                        Some(response) => {
                            diesel::update(target)
                                .set((
                                    consultations::status.eq(change.status.as_str()),
                                    consultations::admin_response.eq(response),
                                    consultations::responded_at.eq(at),
                                    consultations::updated_at.eq(at),
                                ))
                                .returning(ConsultationRow::as_returning())
                                .get_result::<ConsultationRow>(conn)
                                .await
                        }
                        None => {
                            diesel::update(target)
                                .set((
                                    consultations::status.eq(change.status.as_str()),
                                    consultations::updated_at.eq(at),
                                ))
                                .returning(ConsultationRow::as_returning())
                                .get_result::<ConsultationRow>(conn)
                                .await
                        }
                    }
                    .optional()?;

                    let cancelled = row.is_some()
                        && change.status == ConsultationStatus::Cancelled
                        && expected != ConsultationStatus::Cancelled;
                    if !cancelled {
                        return Ok((row, 0));
                    }
                    let freed = diesel::update(
                        appointment_slots::table
                            .filter(appointment_slots::consultation_id.eq(*id.as_uuid())),
                    )
                    .set((
                        appointment_slots::is_available.eq(true),
                        appointment_slots::account_id.eq(None::<Uuid>),
                        appointment_slots::consultation_id.eq(None::<Uuid>),
                        appointment_slots::updated_at.eq(at),
                    ))
                    .execute(conn)
                    .await?;
                    Ok::<_, diesel::result::Error>((row, freed))
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;

        if freed > 0 {
            info!(consultation_id = %id, freed, "released slots of cancelled consultation");
        }
        row.map(row_to_consultation).transpose()
    }

    async fn delete(&self, id: ConsultationId) -> Result<bool, ConsultationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(consultations::table.filter(consultations::id.eq(id.as_uuid())))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(deleted > 0)
    }
}
