//! Appointment slot handlers.
//!
//! ```text
//! GET    /api/appointments/available-slots/{date}
//! POST   /api/appointments/book-slot {"date":"2025-01-10","timeSlot":"14:00"}
//! DELETE /api/appointments/cancel-slot/{date}/{timeSlot}
//! GET    /api/appointments/admin/booked-slots
//! ```

use actix_web::{delete, get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{
    AccountId, BookedSlot, ConsultationId, Error, SlotAvailability, SlotDate, SlotRecord,
    SlotReservation, TimeSlot,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::{AdminIdentity, AuthenticatedAccount, Caller};
use crate::inbound::http::dto::MessageResponse;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_id, require, slot_error};

/// Slot booking request body.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookSlotRequest {
    #[schema(example = "2025-01-10")]
    pub date: Option<String>,
    #[schema(example = "14:00")]
    pub time_slot: Option<String>,
    /// Consultation the slot is for; must belong to the caller.
    pub consultation_id: Option<String>,
    /// Accepted for compatibility; must match the caller when present.
    pub user_id: Option<String>,
}

/// Availability grid for one date.
#[derive(Debug, Serialize, ToSchema)]
pub struct AvailableSlotsResponse {
    pub date: SlotDate,
    pub slots: Vec<SlotAvailability>,
}

/// A reserved slot.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SlotResponse {
    pub date: SlotDate,
    pub time_slot: TimeSlot,
    pub available: bool,
    pub user_id: Option<AccountId>,
    pub consultation_id: Option<ConsultationId>,
}

impl From<SlotRecord> for SlotResponse {
    fn from(value: SlotRecord) -> Self {
        Self {
            date: value.date,
            time_slot: value.time,
            available: value.available,
            user_id: value.account_id,
            consultation_id: value.consultation_id,
        }
    }
}

/// Booked slot with holder details for the admin calendar.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookedSlotResponse {
    pub date: SlotDate,
    pub time_slot: TimeSlot,
    pub user_id: Option<AccountId>,
    pub consultation_id: Option<ConsultationId>,
    pub user_name: Option<String>,
    pub user_mobile: Option<String>,
    pub pet_name: Option<String>,
}

impl From<BookedSlot> for BookedSlotResponse {
    fn from(value: BookedSlot) -> Self {
        Self {
            date: value.date,
            time_slot: value.time,
            user_id: value.account_id,
            consultation_id: value.consultation_id,
            user_name: value.holder_name,
            user_mobile: value.holder_mobile,
            pet_name: value.pet_name,
        }
    }
}

fn parse_reservation(
    payload: BookSlotRequest,
    account: &AuthenticatedAccount,
) -> ApiResult<SlotReservation> {
    let date = require(payload.date, FieldName::new("date"))?;
    let time = require(payload.time_slot, FieldName::new("timeSlot"))?;
    let date = SlotDate::parse(&date).map_err(slot_error)?;
    let time = TimeSlot::parse(&time).map_err(slot_error)?;

    if let Some(raw) = payload.user_id.filter(|raw| !raw.trim().is_empty()) {
        let user_id: AccountId = parse_id(&raw, FieldName::new("userId"))?;
        if user_id != account.id {
            return Err(Error::forbidden("slots can only be booked for yourself"));
        }
    }
    let consultation_id = payload
        .consultation_id
        .filter(|raw| !raw.trim().is_empty())
        .map(|raw| parse_id(&raw, FieldName::new("consultationId")))
        .transpose()?;

    Ok(SlotReservation {
        date,
        time,
        account_id: account.id,
        consultation_id,
    })
}

/// Availability of every half-hour slot on a date.
#[utoipa::path(
    get,
    path = "/api/appointments/available-slots/{date}",
    params(("date" = String, Path, description = "Calendar date, YYYY-MM-DD")),
    responses(
        (status = 200, description = "Slot grid", body = AvailableSlotsResponse),
        (status = 400, description = "Invalid date", body = ErrorSchema)
    ),
    tags = ["appointments"],
    operation_id = "availableSlots",
    security([])
)]
#[get("/appointments/available-slots/{date}")]
pub async fn available_slots(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<AvailableSlotsResponse>> {
    let date = SlotDate::parse(&path).map_err(slot_error)?;
    let slots = state.slots_query.available_slots(date).await?;
    Ok(web::Json(AvailableSlotsResponse { date, slots }))
}

/// Reserve a slot for the caller.
#[utoipa::path(
    post,
    path = "/api/appointments/book-slot",
    request_body = BookSlotRequest,
    responses(
        (status = 200, description = "Slot reserved", body = SlotResponse),
        (status = 400, description = "Invalid request or slot already booked", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema)
    ),
    tags = ["appointments"],
    operation_id = "bookSlot"
)]
#[post("/appointments/book-slot")]
pub async fn book_slot(
    state: web::Data<HttpState>,
    account: AuthenticatedAccount,
    payload: web::Json<BookSlotRequest>,
) -> ApiResult<web::Json<SlotResponse>> {
    let reservation = parse_reservation(payload.into_inner(), &account)?;
    let record = state.slots.book(reservation).await?;
    Ok(web::Json(record.into()))
}

/// Release a slot held by the caller, or any slot for an admin.
#[utoipa::path(
    delete,
    path = "/api/appointments/cancel-slot/{date}/{timeSlot}",
    params(
        ("date" = String, Path, description = "Calendar date, YYYY-MM-DD"),
        ("timeSlot" = String, Path, description = "Half-hour mark, HH:MM")
    ),
    responses(
        (status = 200, description = "Slot released", body = MessageResponse),
        (status = 400, description = "Invalid slot", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Slot held by another account", body = ErrorSchema),
        (status = 404, description = "Slot not found", body = ErrorSchema)
    ),
    tags = ["appointments"],
    operation_id = "cancelSlot"
)]
#[delete("/appointments/cancel-slot/{date}/{time_slot}")]
pub async fn cancel_slot(
    state: web::Data<HttpState>,
    caller: Caller,
    path: web::Path<(String, String)>,
) -> ApiResult<web::Json<MessageResponse>> {
    let (date, time) = path.into_inner();
    let date = SlotDate::parse(&date).map_err(slot_error)?;
    let time = TimeSlot::parse(&time).map_err(slot_error)?;
    state.slots.release(date, time, caller.identity()).await?;
    Ok(web::Json(MessageResponse::new("slot released")))
}

/// Every booked slot with holder details, ordered by date and time.
#[utoipa::path(
    get,
    path = "/api/appointments/admin/booked-slots",
    responses(
        (status = 200, description = "Booked slots", body = [BookedSlotResponse]),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema)
    ),
    tags = ["appointments", "admin"],
    operation_id = "bookedSlots"
)]
#[get("/appointments/admin/booked-slots")]
pub async fn booked_slots(
    state: web::Data<HttpState>,
    _admin: AdminIdentity,
) -> ApiResult<web::Json<Vec<BookedSlotResponse>>> {
    let slots = state.slots_query.booked_slots().await?;
    Ok(web::Json(
        slots.into_iter().map(BookedSlotResponse::from).collect(),
    ))
}
