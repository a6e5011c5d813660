//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. Regenerate with
//! `diesel print-schema` after changing a migration.

diesel::table! {
    /// Registered accounts. `mobile` is unique.
    accounts (id) {
        id -> Uuid,
        first_name -> Varchar,
        last_name -> Varchar,
        mobile -> Varchar,
        password_hash -> Text,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Pets, each owned by one account.
    pets (id) {
        id -> Uuid,
        account_id -> Uuid,
        name -> Varchar,
        species -> Varchar,
        breed -> Nullable<Varchar>,
        age_years -> Nullable<Int2>,
        gender -> Nullable<Varchar>,
        is_neutered -> Bool,
        weight_kg -> Nullable<Float8>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Consultation requests. Attachments are stored as JSON arrays per kind.
    consultations (id) {
        id -> Uuid,
        account_id -> Uuid,
        pet_id -> Nullable<Uuid>,
        description -> Text,
        price -> Int8,
        /// One of `pending`, `in_review`, `resolved`, `cancelled`.
        status -> Varchar,
        admin_response -> Nullable<Text>,
        responded_at -> Nullable<Timestamptz>,
        appointment_date -> Nullable<Date>,
        appointment_time -> Nullable<Varchar>,
        audio_files -> Jsonb,
        video_files -> Jsonb,
        document_files -> Jsonb,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Lazily created slot rows, unique per `(slot_date, time_slot)`.
    appointment_slots (id) {
        id -> Uuid,
        slot_date -> Date,
        /// `HH:MM` on the half-hour grid.
        time_slot -> Varchar,
        is_available -> Bool,
        account_id -> Nullable<Uuid>,
        consultation_id -> Nullable<Uuid>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::joinable!(pets -> accounts (account_id));
diesel::joinable!(consultations -> accounts (account_id));
diesel::joinable!(consultations -> pets (pet_id));
diesel::joinable!(appointment_slots -> accounts (account_id));
diesel::joinable!(appointment_slots -> consultations (consultation_id));

diesel::allow_tables_to_appear_in_same_query!(accounts, pets, consultations, appointment_slots);
