//! Driving ports for the appointment slot grid.

use async_trait::async_trait;

use crate::domain::{
    BookedSlot, Error, Identity, SlotAvailability, SlotDate, SlotRecord, SlotReservation, TimeSlot,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SlotBookingCommand: Send + Sync {
    /// Reserve a free slot. Exactly one of any set of concurrent calls for
    /// the same slot succeeds; the rest fail with a conflict.
    async fn book(&self, reservation: SlotReservation) -> Result<SlotRecord, Error>;

    /// Free a slot. Missing rows are not found; already available rows are a
    /// successful no-op; slots held by another account need an admin caller.
    async fn release(
        &self,
        date: SlotDate,
        time: TimeSlot,
        caller: &Identity,
    ) -> Result<(), Error>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SlotAvailabilityQuery: Send + Sync {
    /// The full 24-entry grid for the date in time order.
    async fn available_slots(&self, date: SlotDate) -> Result<Vec<SlotAvailability>, Error>;

    async fn booked_slots(&self) -> Result<Vec<BookedSlot>, Error>;
}
