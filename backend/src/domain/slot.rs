//! Appointment slots: a fixed half-hour grid per calendar date.
//!
//! A slot row exists in the store only once someone books or releases it.
//! Any grid time without a row is available.

use std::fmt;

use chrono::{NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{AccountId, ConsultationId};

/// First bookable time of day (08:00).
const GRID_START_MINUTES: u16 = 8 * 60;
/// Spacing between slots.
const GRID_STEP_MINUTES: u16 = 30;
/// Number of slots per day: 08:00 through 19:30 inclusive.
pub const SLOTS_PER_DAY: usize = 24;

/// Validation errors for slot coordinates.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SlotValidationError {
    #[error("date must be a calendar date formatted as YYYY-MM-DD")]
    InvalidDate { value: String },
    #[error("time slot must be a half-hour mark between 08:00 and 19:30")]
    InvalidTime { value: String },
}

impl SlotValidationError {
    pub fn field(&self) -> &'static str {
        match self {
            Self::InvalidDate { .. } => "date",
            Self::InvalidTime { .. } => "timeSlot",
        }
    }

    pub fn value(&self) -> &str {
        match self {
            Self::InvalidDate { value } | Self::InvalidTime { value } => value,
        }
    }
}

/// Calendar date of a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "String", into = "String")]
#[schema(value_type = String, example = "2025-01-10")]
pub struct SlotDate(NaiveDate);

impl SlotDate {
    pub fn parse(raw: &str) -> Result<Self, SlotValidationError> {
        NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
            .map(Self)
            .map_err(|_| SlotValidationError::InvalidDate {
                value: raw.to_owned(),
            })
    }

    pub const fn from_naive(date: NaiveDate) -> Self {
        Self(date)
    }

    pub const fn as_naive(&self) -> NaiveDate {
        self.0
    }
}

impl fmt::Display for SlotDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl From<SlotDate> for String {
    fn from(value: SlotDate) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for SlotDate {
    type Error = SlotValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

/// A half-hour mark on the daily grid, stored as minutes after midnight.
///
/// ## Invariants
/// - `08:00 <= time <= 19:30` and `minutes % 30 == 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "String", into = "String")]
#[schema(value_type = String, example = "14:00")]
pub struct TimeSlot(u16);

impl TimeSlot {
    /// Parse an `HH:MM` string and check it lies on the grid.
    ///
    /// # Examples
    /// ```
    /// use vetconsult::domain::TimeSlot;
    ///
    /// assert_eq!(TimeSlot::parse("14:00").expect("on grid").to_string(), "14:00");
    /// assert!(TimeSlot::parse("14:15").is_err());
    /// assert!(TimeSlot::parse("20:00").is_err());
    /// ```
    pub fn parse(raw: &str) -> Result<Self, SlotValidationError> {
        let invalid = || SlotValidationError::InvalidTime {
            value: raw.to_owned(),
        };
        let time = NaiveTime::parse_from_str(raw.trim(), "%H:%M").map_err(|_| invalid())?;
        let minutes = u16::try_from(time.hour() * 60 + time.minute()).map_err(|_| invalid())?;
        Self::from_minutes(minutes).ok_or_else(invalid)
    }

    fn from_minutes(minutes: u16) -> Option<Self> {
        let offset = minutes.checked_sub(GRID_START_MINUTES)?;
        let index = usize::from(offset / GRID_STEP_MINUTES);
        (offset % GRID_STEP_MINUTES == 0 && index < SLOTS_PER_DAY).then_some(Self(minutes))
    }

    /// The full grid in chronological order.
    pub fn grid() -> impl Iterator<Item = Self> {
        (0..SLOTS_PER_DAY).filter_map(|index| {
            u16::try_from(index)
                .ok()
                .map(|i| Self(GRID_START_MINUTES + i * GRID_STEP_MINUTES))
        })
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}

impl From<TimeSlot> for String {
    fn from(value: TimeSlot) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for TimeSlot {
    type Error = SlotValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

/// Availability of one grid entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct SlotAvailability {
    pub time: TimeSlot,
    pub available: bool,
}

/// Stored state of a slot row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotRecord {
    pub date: SlotDate,
    pub time: TimeSlot,
    pub available: bool,
    pub account_id: Option<AccountId>,
    pub consultation_id: Option<ConsultationId>,
}

/// A reservation request that has passed validation and ownership checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotReservation {
    pub date: SlotDate,
    pub time: TimeSlot,
    pub account_id: AccountId,
    pub consultation_id: Option<ConsultationId>,
}

/// Booked slot joined with holder details for the admin listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookedSlot {
    pub date: SlotDate,
    pub time: TimeSlot,
    pub account_id: Option<AccountId>,
    pub consultation_id: Option<ConsultationId>,
    pub holder_name: Option<String>,
    pub holder_mobile: Option<String>,
    pub pet_name: Option<String>,
}

/// Overlay stored rows for one date onto the fixed grid.
///
/// Rows for other dates or for times off the grid are ignored; every grid
/// time without a row is reported available.
pub fn overlay_availability(date: SlotDate, rows: &[SlotRecord]) -> Vec<SlotAvailability> {
    TimeSlot::grid()
        .map(|time| {
            let available = rows
                .iter()
                .find(|row| row.date == date && row.time == time)
                .is_none_or(|row| row.available);
            SlotAvailability { time, available }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn date() -> SlotDate {
        SlotDate::parse("2025-01-10").expect("valid date")
    }

    fn record(date: SlotDate, time: &str, available: bool) -> SlotRecord {
        SlotRecord {
            date,
            time: TimeSlot::parse(time).expect("grid time"),
            available,
            account_id: None,
            consultation_id: None,
        }
    }

    #[rstest]
    fn grid_has_24_half_hour_marks() {
        let grid: Vec<String> = TimeSlot::grid().map(|t| t.to_string()).collect();
        assert_eq!(grid.len(), SLOTS_PER_DAY);
        assert_eq!(grid.first().map(String::as_str), Some("08:00"));
        assert_eq!(grid.get(1).map(String::as_str), Some("08:30"));
        assert_eq!(grid.last().map(String::as_str), Some("19:30"));
    }

    #[rstest]
    #[case("07:30")]
    #[case("08:15")]
    #[case("20:00")]
    #[case("8am")]
    #[case("25:00")]
    fn rejects_off_grid_times(#[case] raw: &str) {
        let err = TimeSlot::parse(raw).expect_err("off grid");
        assert_eq!(err.field(), "timeSlot");
        assert_eq!(err.value(), raw);
    }

    #[rstest]
    #[case("2025-02-30")]
    #[case("10/01/2025")]
    #[case("")]
    fn rejects_bad_dates(#[case] raw: &str) {
        assert!(matches!(
            SlotDate::parse(raw),
            Err(SlotValidationError::InvalidDate { .. })
        ));
    }

    #[rstest]
    fn empty_store_reports_every_slot_available(date: SlotDate) {
        let slots = overlay_availability(date, &[]);
        assert_eq!(slots.len(), SLOTS_PER_DAY);
        assert!(slots.iter().all(|s| s.available));
    }

    #[rstest]
    fn booked_rows_mark_only_their_time(date: SlotDate) {
        let other_day = SlotDate::parse("2025-01-11").expect("valid date");
        let rows = [
            record(date, "14:00", false),
            record(date, "15:00", true),
            record(other_day, "09:00", false),
        ];
        let slots = overlay_availability(date, &rows);
        let unavailable: Vec<String> = slots
            .iter()
            .filter(|s| !s.available)
            .map(|s| s.time.to_string())
            .collect();
        assert_eq!(unavailable, vec!["14:00".to_owned()]);
    }

    #[rstest]
    fn serde_uses_wire_strings(date: SlotDate) {
        let value = serde_json::to_value(SlotAvailability {
            time: TimeSlot::parse("09:30").expect("grid time"),
            available: true,
        })
        .expect("serialise");
        assert_eq!(value, serde_json::json!({ "time": "09:30", "available": true }));
        assert_eq!(
            serde_json::to_value(date).expect("serialise"),
            serde_json::json!("2025-01-10")
        );
    }
}
