//! Conversions between Diesel rows and validated domain types.
//!
//! Loading goes through the domain constructors so a row that violates an
//! invariant surfaces as a query error instead of an invalid value. Errors
//! are plain messages; each repository wraps them in its own error type.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::domain::{
    Account, AccountId, Appointment, Attachment, AttachmentKind, Consultation, ConsultationId,
    ConsultationStatus, MobileNumber, PersonName, Pet, PetGender, PetId, PetProfile,
    PetProfileDraft, SlotDate, TimeSlot,
};

use super::models::{AccountRow, ConsultationRow, NewPetRow, PetProfileUpdate, PetRow};

pub(crate) fn account_from_row(row: AccountRow) -> Result<Account, String> {
    let name = PersonName::new(&row.first_name, &row.last_name)
        .map_err(|err| format!("stored account {}: {err}", row.id))?;
    let mobile =
        MobileNumber::new(&row.mobile).map_err(|err| format!("stored account {}: {err}", row.id))?;
    Ok(Account::new(
        AccountId::from_uuid(row.id),
        name,
        mobile,
        row.created_at,
    ))
}

pub(crate) fn pet_from_row(row: PetRow) -> Result<Pet, String> {
    let age_years = row
        .age_years
        .map(u16::try_from)
        .transpose()
        .map_err(|_| format!("stored pet {} has a negative age", row.id))?;
    let gender = match row.gender.as_deref() {
        None => None,
        Some(raw) => Some(
            PetGender::parse(raw).ok_or_else(|| format!("stored pet {} gender {raw:?}", row.id))?,
        ),
    };
    let profile = PetProfile::try_new(PetProfileDraft {
        name: row.name,
        species: row.species,
        breed: row.breed,
        age_years,
        gender,
        is_neutered: row.is_neutered,
        weight_kg: row.weight_kg,
    })
    .map_err(|err| format!("stored pet {}: {err}", row.id))?;
    Ok(Pet {
        id: PetId::from_uuid(row.id),
        owner: AccountId::from_uuid(row.account_id),
        profile,
        created_at: row.created_at,
    })
}

fn age_column(profile: &PetProfile) -> Result<Option<i16>, String> {
    profile
        .age_years()
        .map(i16::try_from)
        .transpose()
        .map_err(|_| "pet age does not fit the age column".to_owned())
}

pub(crate) fn new_pet_row(pet: &Pet) -> Result<NewPetRow<'_>, String> {
    let profile = &pet.profile;
    Ok(NewPetRow {
        id: *pet.id.as_uuid(),
        account_id: *pet.owner.as_uuid(),
        name: profile.name(),
        species: profile.species(),
        breed: profile.breed(),
        age_years: age_column(profile)?,
        gender: profile.gender().map(PetGender::as_str),
        is_neutered: profile.is_neutered(),
        weight_kg: profile.weight_kg(),
        created_at: pet.created_at,
        updated_at: pet.created_at,
    })
}

pub(crate) fn pet_profile_update(
    profile: &PetProfile,
    at: DateTime<Utc>,
) -> Result<PetProfileUpdate<'_>, String> {
    Ok(PetProfileUpdate {
        name: profile.name(),
        species: profile.species(),
        breed: profile.breed(),
        age_years: age_column(profile)?,
        gender: profile.gender().map(PetGender::as_str),
        is_neutered: profile.is_neutered(),
        weight_kg: profile.weight_kg(),
        updated_at: at,
    })
}

/// Attachment columns in `(audio, video, document)` order.
pub(crate) fn attachment_columns(
    attachments: &[Attachment],
) -> Result<(Value, Value, Value), String> {
    let column = |kind: AttachmentKind| {
        let selected: Vec<&Attachment> = attachments.iter().filter(|a| a.kind == kind).collect();
        serde_json::to_value(selected).map_err(|err| format!("serialise {kind:?} files: {err}"))
    };
    Ok((
        column(AttachmentKind::Audio)?,
        column(AttachmentKind::Video)?,
        column(AttachmentKind::Document)?,
    ))
}

fn decode_attachments(value: Value, column: &str) -> Result<Vec<Attachment>, String> {
    serde_json::from_value(value).map_err(|err| format!("decode {column}: {err}"))
}

pub(crate) fn consultation_from_row(row: ConsultationRow) -> Result<Consultation, String> {
    let status = row
        .status
        .parse::<ConsultationStatus>()
        .map_err(|err| format!("stored consultation {}: {err}", row.id))?;
    let appointment = match (row.appointment_date, row.appointment_time.as_deref()) {
        (Some(date), Some(time)) => Some(Appointment {
            date: SlotDate::from_naive(date),
            time: TimeSlot::parse(time)
                .map_err(|_| format!("stored consultation {} time {time:?}", row.id))?,
        }),
        (None, None) => None,
        _ => {
            return Err(format!(
                "stored consultation {} has half an appointment",
                row.id
            ));
        }
    };

    let mut attachments = decode_attachments(row.audio_files, "audio_files")?;
    attachments.extend(decode_attachments(row.video_files, "video_files")?);
    attachments.extend(decode_attachments(row.document_files, "document_files")?);

    Ok(Consultation {
        id: ConsultationId::from_uuid(row.id),
        account_id: AccountId::from_uuid(row.account_id),
        pet_id: row.pet_id.map(PetId::from_uuid),
        description: row.description,
        price: row.price,
        status,
        admin_response: row.admin_response,
        responded_at: row.responded_at,
        appointment,
        attachments,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rstest::{fixture, rstest};
    use serde_json::json;
    use uuid::Uuid;

    use crate::test_support::clock::fixture_timestamp;

    fn attachment(kind: AttachmentKind, name: &str) -> Attachment {
        Attachment {
            kind,
            stored_name: name.to_owned(),
            original_name: None,
            content_type: "application/octet-stream".to_owned(),
            size_bytes: 3,
            sha256: "ab".repeat(32),
        }
    }

    #[fixture]
    fn consultation_row() -> ConsultationRow {
        ConsultationRow {
            id: Uuid::new_v4(),
            account_id: Uuid::new_v4(),
            pet_id: None,
            description: "limping".to_owned(),
            price: 280_000,
            status: "in_review".to_owned(),
            admin_response: None,
            responded_at: None,
            appointment_date: NaiveDate::from_ymd_opt(2025, 1, 11),
            appointment_time: Some("09:30".to_owned()),
            audio_files: json!([]),
            video_files: json!([]),
            document_files: json!([]),
            created_at: fixture_timestamp(),
            updated_at: fixture_timestamp(),
        }
    }

    #[rstest]
    fn attachments_are_split_by_kind_and_merged_back(mut consultation_row: ConsultationRow) {
        let files = vec![
            attachment(AttachmentKind::Document, "scan.pdf"),
            attachment(AttachmentKind::Audio, "cough.mp3"),
        ];
        let (audio, video, document) = attachment_columns(&files).expect("columns");
        assert_eq!(audio.as_array().map(Vec::len), Some(1));
        assert_eq!(video, json!([]));

        consultation_row.audio_files = audio;
        consultation_row.document_files = document;
        let consultation = consultation_from_row(consultation_row).expect("row");

        assert_eq!(consultation.status, ConsultationStatus::InReview);
        assert_eq!(consultation.attachments.len(), 2);
        assert_eq!(
            consultation
                .appointment
                .map(|a| a.time.to_string())
                .as_deref(),
            Some("09:30")
        );
    }

    #[rstest]
    #[case(Some("archived"), None)]
    #[case(None, Some("09:00"))]
    fn invalid_rows_are_rejected(
        mut consultation_row: ConsultationRow,
        #[case] status: Option<&str>,
        #[case] only_time: Option<&str>,
    ) {
        if let Some(status) = status {
            consultation_row.status = status.to_owned();
        }
        if let Some(time) = only_time {
            consultation_row.appointment_date = None;
            consultation_row.appointment_time = Some(time.to_owned());
        }
        assert!(consultation_from_row(consultation_row).is_err());
    }

    #[rstest]
    fn pet_rows_validate_through_profile() {
        let row = PetRow {
            id: Uuid::new_v4(),
            account_id: Uuid::new_v4(),
            name: "Rex".to_owned(),
            species: "dog".to_owned(),
            breed: None,
            age_years: Some(-1),
            gender: Some("male".to_owned()),
            is_neutered: false,
            weight_kg: None,
            created_at: fixture_timestamp(),
        };
        assert!(pet_from_row(row.clone()).is_err());

        let pet = pet_from_row(PetRow {
            age_years: Some(3),
            ..row
        })
        .expect("valid row");
        assert_eq!(pet.profile.age_years(), Some(3));
        assert_eq!(pet.profile.gender(), Some(PetGender::Male));
    }
}
