//! Port abstraction for appointment slot storage.
//!
//! Adapters must back `try_reserve` with a store-level uniqueness constraint on
//! `(date, time)`: the write itself decides the winner of concurrent
//! reservations, so callers may treat any pre-check as advisory.
use async_trait::async_trait;

use crate::domain::{AccountId, BookedSlot, SlotDate, SlotRecord, SlotReservation, TimeSlot};

use super::define_port_error;

define_port_error! {
    /// Errors raised by slot repository adapters.
    pub enum SlotRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "slot repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "slot repository query failed: {message}",
        /// The slot is held by another reservation.
        Taken { date: String, time: String } => "slot {date} {time} is already booked",
        /// A referenced row (usually the owning account) no longer exists.
        MissingReference { constraint: String } => "referenced row is missing: {constraint}",
    }
}

/// Result of clearing a slot row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotRelease {
    /// The row was held and is now available.
    Released,
    /// The row exists but was already available; nothing changed.
    AlreadyAvailable,
    /// No row exists for the slot.
    NotFound,
    /// The row is held by an account other than the requested holder.
    HeldByOther,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SlotRepository: Send + Sync {
    /// Stored rows for one date, in any order.
    async fn find_for_date(&self, date: SlotDate) -> Result<Vec<SlotRecord>, SlotRepositoryError>;

    async fn find(
        &self,
        date: SlotDate,
        time: TimeSlot,
    ) -> Result<Option<SlotRecord>, SlotRepositoryError>;

    /// Create or take over the row for `(date, time)` if it is free.
    ///
    /// Fails with [`SlotRepositoryError::Taken`] when the row is held,
    /// including when a concurrent writer won the race.
    async fn try_reserve(&self, reservation: &SlotReservation) -> Result<(), SlotRepositoryError>;

    /// Mark the slot available and clear its references.
    ///
    /// With `holder` set, only a row held by that account is cleared and a
    /// row held by anyone else yields [`SlotRelease::HeldByOther`]. `None`
    /// clears the row whoever holds it. The holder test is part of the
    /// write, not a prior read.
    async fn release(
        &self,
        date: SlotDate,
        time: TimeSlot,
        holder: Option<AccountId>,
    ) -> Result<SlotRelease, SlotRepositoryError>;

    /// Held slots joined with holder details, ordered by date then time.
    async fn booked(&self) -> Result<Vec<BookedSlot>, SlotRepositoryError>;
}
