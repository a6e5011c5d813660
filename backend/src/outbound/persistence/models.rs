//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. Conversions into domain types validate
//! through the domain constructors.

use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Date, Nullable, Text, Timestamptz, Uuid as SqlUuid};
use uuid::Uuid;

use super::schema::{accounts, appointment_slots, consultations, pets};

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = accounts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct AccountRow {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub mobile: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = accounts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct AccountCredentialsRow {
    #[diesel(embed)]
    pub account: AccountRow,
    pub password_hash: String,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = accounts)]
pub(crate) struct NewAccountRow<'a> {
    pub id: Uuid,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub mobile: &'a str,
    pub password_hash: &'a str,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Pets
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = pets)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct PetRow {
    pub id: Uuid,
    pub account_id: Uuid,
    pub name: String,
    pub species: String,
    pub breed: Option<String>,
    pub age_years: Option<i16>,
    pub gender: Option<String>,
    pub is_neutered: bool,
    pub weight_kg: Option<f64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = pets)]
pub(crate) struct NewPetRow<'a> {
    pub id: Uuid,
    pub account_id: Uuid,
    pub name: &'a str,
    pub species: &'a str,
    pub breed: Option<&'a str>,
    pub age_years: Option<i16>,
    pub gender: Option<&'a str>,
    pub is_neutered: bool,
    pub weight_kg: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Every profile column is written, so clearing an optional field sets NULL.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = pets, treat_none_as_null = true)]
pub(crate) struct PetProfileUpdate<'a> {
    pub name: &'a str,
    pub species: &'a str,
    pub breed: Option<&'a str>,
    pub age_years: Option<i16>,
    pub gender: Option<&'a str>,
    pub is_neutered: bool,
    pub weight_kg: Option<f64>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Consultations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = consultations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ConsultationRow {
    pub id: Uuid,
    pub account_id: Uuid,
    pub pet_id: Option<Uuid>,
    pub description: String,
    pub price: i64,
    pub status: String,
    pub admin_response: Option<String>,
    pub responded_at: Option<DateTime<Utc>>,
    pub appointment_date: Option<NaiveDate>,
    pub appointment_time: Option<String>,
    pub audio_files: serde_json::Value,
    pub video_files: serde_json::Value,
    pub document_files: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = consultations)]
pub(crate) struct NewConsultationRow<'a> {
    pub id: Uuid,
    pub account_id: Uuid,
    pub pet_id: Option<Uuid>,
    pub description: &'a str,
    pub price: i64,
    pub status: &'a str,
    pub appointment_date: Option<NaiveDate>,
    pub appointment_time: Option<String>,
    pub audio_files: &'a serde_json::Value,
    pub video_files: &'a serde_json::Value,
    pub document_files: &'a serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Appointment slots
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = appointment_slots)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct SlotRow {
    pub slot_date: NaiveDate,
    pub time_slot: String,
    pub is_available: bool,
    pub account_id: Option<Uuid>,
    pub consultation_id: Option<Uuid>,
}

/// Held slot joined with holder details.
#[derive(Debug, Clone, QueryableByName)]
pub(crate) struct BookedSlotRow {
    #[diesel(sql_type = Date)]
    pub slot_date: NaiveDate,
    #[diesel(sql_type = Text)]
    pub time_slot: String,
    #[diesel(sql_type = Nullable<SqlUuid>)]
    pub account_id: Option<Uuid>,
    #[diesel(sql_type = Nullable<SqlUuid>)]
    pub consultation_id: Option<Uuid>,
    #[diesel(sql_type = Nullable<Text>)]
    pub holder_name: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    pub holder_mobile: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    pub pet_name: Option<String>,
}

// ---------------------------------------------------------------------------
// Admin aggregates
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, QueryableByName)]
pub(crate) struct DailyCountRow {
    #[diesel(sql_type = Date)]
    pub day: NaiveDate,
    #[diesel(sql_type = BigInt)]
    pub count: i64,
}

#[derive(Debug, Clone, QueryableByName)]
pub(crate) struct CountRow {
    #[diesel(sql_type = BigInt)]
    pub count: i64,
}

/// Account with the per-account aggregates shown in the admin list.
#[derive(Debug, Clone, QueryableByName)]
pub(crate) struct AccountSummaryRow {
    #[diesel(sql_type = SqlUuid)]
    pub id: Uuid,
    #[diesel(sql_type = Text)]
    pub first_name: String,
    #[diesel(sql_type = Text)]
    pub last_name: String,
    #[diesel(sql_type = Text)]
    pub mobile: String,
    #[diesel(sql_type = Timestamptz)]
    pub created_at: DateTime<Utc>,
    #[diesel(sql_type = BigInt)]
    pub pet_count: i64,
    #[diesel(sql_type = BigInt)]
    pub consultation_count: i64,
    #[diesel(sql_type = Nullable<Timestamptz>)]
    pub last_consultation_at: Option<DateTime<Utc>>,
}
