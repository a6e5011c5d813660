//! Appointment slot booking service.
//!
//! Booking is check-then-reserve. The pre-check only turns the common case
//! into an early conflict; the repository's constrained write is what
//! decides between concurrent callers, and its `Taken` outcome is mapped to
//! the same conflict.
//!
//! Release has no pre-check: the caller's account is handed to the
//! repository, whose guarded write refuses a slot held by anyone else.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, info};

use crate::domain::account_service::missing_reference;
use crate::domain::consultation_service::map_consultation_repository_error;
use crate::domain::ports::{
    ConsultationRepository, SlotAvailabilityQuery, SlotBookingCommand, SlotRelease,
    SlotRepository, SlotRepositoryError,
};
use crate::domain::{
    BookedSlot, Error, Identity, SlotAvailability, SlotDate, SlotRecord, SlotReservation, TimeSlot,
    overlay_availability,
};

pub(crate) fn map_slot_repository_error(error: SlotRepositoryError) -> Error {
    match error {
        SlotRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("slot repository unavailable: {message}"))
        }
        SlotRepositoryError::Query { message } => {
            Error::internal(format!("slot repository error: {message}"))
        }
        SlotRepositoryError::Taken { date, time } => slot_taken(&date, &time),
        SlotRepositoryError::MissingReference { constraint } => missing_reference(&constraint),
    }
}

pub(crate) fn slot_taken(date: &str, time: &str) -> Error {
    Error::conflict(format!("the {time} slot on {date} is already booked"))
        .with_details(json!({ "date": date, "timeSlot": time, "code": "slot_taken" }))
}

fn slot_not_found() -> Error {
    Error::not_found("slot not found")
}

/// Reserve a slot through `repo`, treating the write as authoritative.
pub(crate) async fn reserve<S>(repo: &S, reservation: &SlotReservation) -> Result<SlotRecord, Error>
where
    S: SlotRepository + ?Sized,
{
    let date = reservation.date.to_string();
    let time = reservation.time.to_string();

    let existing = repo
        .find(reservation.date, reservation.time)
        .await
        .map_err(map_slot_repository_error)?;
    if existing.is_some_and(|row| !row.available) {
        debug!(%date, %time, "slot pre-check found an existing booking");
        return Err(slot_taken(&date, &time));
    }

    repo.try_reserve(reservation)
        .await
        .map_err(map_slot_repository_error)?;

    info!(
        %date,
        %time,
        account_id = %reservation.account_id,
        consultation_id = ?reservation.consultation_id,
        "slot booked"
    );
    Ok(SlotRecord {
        date: reservation.date,
        time: reservation.time,
        available: false,
        account_id: Some(reservation.account_id),
        consultation_id: reservation.consultation_id,
    })
}

/// Slot grid service implementing the booking and availability ports.
#[derive(Clone)]
pub struct SlotBookingService<S, C> {
    slot_repo: Arc<S>,
    consultation_repo: Arc<C>,
}

impl<S, C> SlotBookingService<S, C> {
    /// Create a service over the slot and consultation repositories.
    pub fn new(slot_repo: Arc<S>, consultation_repo: Arc<C>) -> Self {
        Self {
            slot_repo,
            consultation_repo,
        }
    }
}

#[async_trait]
impl<S, C> SlotBookingCommand for SlotBookingService<S, C>
where
    S: SlotRepository,
    C: ConsultationRepository,
{
    async fn book(&self, reservation: SlotReservation) -> Result<SlotRecord, Error> {
        if let Some(consultation_id) = reservation.consultation_id {
            let owned = self
                .consultation_repo
                .find(consultation_id)
                .await
                .map_err(map_consultation_repository_error)?
                .is_some_and(|consultation| consultation.account_id == reservation.account_id);
            if !owned {
                return Err(Error::not_found(format!(
                    "consultation {consultation_id} not found"
                )));
            }
        }

        reserve(self.slot_repo.as_ref(), &reservation).await
    }

    async fn release(
        &self,
        date: SlotDate,
        time: TimeSlot,
        caller: &Identity,
    ) -> Result<(), Error> {
        let holder = if caller.is_admin() {
            None
        } else {
            caller.account_id()
        };

        match self
            .slot_repo
            .release(date, time, holder)
            .await
            .map_err(map_slot_repository_error)?
        {
            SlotRelease::Released => {
                info!(%date, %time, admin = caller.is_admin(), "slot released");
                Ok(())
            }
            SlotRelease::AlreadyAvailable => {
                debug!(%date, %time, "slot already available");
                Ok(())
            }
            SlotRelease::NotFound => Err(slot_not_found()),
            SlotRelease::HeldByOther => Err(Error::forbidden("slot is held by another account")),
        }
    }
}

#[async_trait]
impl<S, C> SlotAvailabilityQuery for SlotBookingService<S, C>
where
    S: SlotRepository,
    C: ConsultationRepository,
{
    async fn available_slots(&self, date: SlotDate) -> Result<Vec<SlotAvailability>, Error> {
        let rows = self
            .slot_repo
            .find_for_date(date)
            .await
            .map_err(map_slot_repository_error)?;
        Ok(overlay_availability(date, &rows))
    }

    async fn booked_slots(&self) -> Result<Vec<BookedSlot>, Error> {
        self.slot_repo
            .booked()
            .await
            .map_err(map_slot_repository_error)
    }
}

#[cfg(test)]
#[path = "slot_booking_service_tests.rs"]
mod tests;
