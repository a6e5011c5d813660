//! Response and request payloads shared by several handler modules.

use pagination::{Page, PageInfo};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{
    Account, AccountId, Attachment, AttachmentKind, Consultation, ConsultationId,
    ConsultationStatus, Error, Pet, PetGender, PetId, PetProfile, PetProfileDraft,
};

use super::validation::{FieldName, invalid_value_error, pet_error};

/// Public view of an account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    pub id: AccountId,
    #[schema(example = "Sara")]
    pub first_name: String,
    #[schema(example = "Ahmadi")]
    pub last_name: String,
    #[schema(example = "Sara Ahmadi")]
    pub full_name: String,
    #[schema(example = "09121234567")]
    pub mobile: String,
    pub created_at: String,
}

impl From<Account> for AccountResponse {
    fn from(value: Account) -> Self {
        Self {
            id: value.id(),
            first_name: value.name().first().to_owned(),
            last_name: value.name().last().to_owned(),
            full_name: value.full_name(),
            mobile: value.mobile().to_string(),
            created_at: value.created_at().to_rfc3339(),
        }
    }
}

/// Pet fields as sent by clients.
///
/// Example JSON:
/// `{"name":"Rex","type":"dog","breed":"Terrier","age":3,"gender":"male","isNeutered":true,"weight":8.5}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PetRequest {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub species: Option<String>,
    pub breed: Option<String>,
    pub age: Option<u16>,
    pub gender: Option<String>,
    #[serde(default)]
    pub is_neutered: bool,
    pub weight: Option<f64>,
}

impl PetRequest {
    /// Validate into a [`PetProfile`].
    pub(crate) fn into_profile(self) -> Result<PetProfile, Error> {
        let gender = self
            .gender
            .filter(|raw| !raw.trim().is_empty())
            .map(|raw| {
                PetGender::parse(&raw).ok_or_else(|| {
                    invalid_value_error(
                        FieldName::new("pet.gender"),
                        "pet gender must be male or female",
                        &raw,
                    )
                })
            })
            .transpose()?;
        PetProfile::try_new(PetProfileDraft {
            name: self.name.unwrap_or_default(),
            species: self.species.unwrap_or_default(),
            breed: self.breed,
            age_years: self.age,
            gender,
            is_neutered: self.is_neutered,
            weight_kg: self.weight,
        })
        .map_err(pet_error)
    }
}

/// Stored pet profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PetResponse {
    pub id: PetId,
    pub name: String,
    #[serde(rename = "type")]
    pub species: String,
    pub breed: Option<String>,
    pub age: Option<u16>,
    pub gender: Option<PetGender>,
    pub is_neutered: bool,
    pub weight: Option<f64>,
    pub created_at: String,
}

impl From<Pet> for PetResponse {
    fn from(value: Pet) -> Self {
        let profile = value.profile;
        Self {
            id: value.id,
            name: profile.name().to_owned(),
            species: profile.species().to_owned(),
            breed: profile.breed().map(str::to_owned),
            age: profile.age_years(),
            gender: profile.gender(),
            is_neutered: profile.is_neutered(),
            weight: profile.weight_kg(),
            created_at: value.created_at.to_rfc3339(),
        }
    }
}

/// A consultation as returned to its owner and to admins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConsultationResponse {
    pub id: ConsultationId,
    pub account_id: AccountId,
    pub pet_id: Option<PetId>,
    pub description: String,
    #[schema(example = 280_000)]
    pub price: i64,
    pub status: ConsultationStatus,
    pub admin_response: Option<String>,
    pub responded_at: Option<String>,
    #[schema(example = "2025-01-10")]
    pub appointment_date: Option<String>,
    #[schema(example = "14:00")]
    pub appointment_time: Option<String>,
    pub audio_files: Vec<Attachment>,
    pub video_files: Vec<Attachment>,
    pub document_files: Vec<Attachment>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Consultation> for ConsultationResponse {
    fn from(value: Consultation) -> Self {
        let files = |kind: AttachmentKind| value.attachments_of(kind).cloned().collect();
        let audio_files = files(AttachmentKind::Audio);
        let video_files = files(AttachmentKind::Video);
        let document_files = files(AttachmentKind::Document);
        Self {
            id: value.id,
            account_id: value.account_id,
            pet_id: value.pet_id,
            description: value.description,
            price: value.price,
            status: value.status,
            admin_response: value.admin_response,
            responded_at: value.responded_at.map(|at| at.to_rfc3339()),
            appointment_date: value.appointment.map(|a| a.date.to_string()),
            appointment_time: value.appointment.map(|a| a.time.to_string()),
            audio_files,
            video_files,
            document_files,
            created_at: value.created_at.to_rfc3339(),
            updated_at: value.updated_at.to_rfc3339(),
        }
    }
}

/// Totals for a paginated listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaginationResponse {
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 10)]
    pub limit: u32,
    #[schema(example = 42)]
    pub total: u64,
    #[schema(example = 5)]
    pub pages: u64,
}

impl From<PageInfo> for PaginationResponse {
    fn from(value: PageInfo) -> Self {
        Self {
            page: value.page,
            limit: value.limit,
            total: value.total,
            pages: value.pages,
        }
    }
}

/// One page of consultations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConsultationPageResponse {
    pub items: Vec<ConsultationResponse>,
    pub pagination: PaginationResponse,
}

impl From<Page<Consultation>> for ConsultationPageResponse {
    fn from(value: Page<Consultation>) -> Self {
        Self {
            items: value.items.into_iter().map(Into::into).collect(),
            pagination: value.pagination.into(),
        }
    }
}

/// Confirmation body for mutations without a natural payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        Appointment, CONSULTATION_PRICE, ErrorCode, SlotDate, TimeSlot,
    };
    use crate::inbound::http::test_utils::{account, account_id, timestamp};
    use rstest::rstest;
    use serde_json::{Value, json};

    fn attachment(kind: AttachmentKind, name: &str) -> Attachment {
        Attachment {
            kind,
            stored_name: name.to_owned(),
            original_name: None,
            content_type: "application/octet-stream".to_owned(),
            size_bytes: 3,
            sha256: "00".repeat(32),
        }
    }

    #[rstest]
    fn pet_request_reads_the_type_field() {
        let request: PetRequest = serde_json::from_value(json!({
            "name": "Rex",
            "type": "dog",
            "gender": "Male",
            "isNeutered": true,
        }))
        .expect("pet request");

        let profile = request.into_profile().expect("valid pet");

        assert_eq!(profile.species(), "dog");
        assert_eq!(profile.gender(), Some(PetGender::Male));
        assert!(profile.is_neutered());
    }

    #[rstest]
    #[case(json!({"type": "dog"}), "pet.name")]
    #[case(json!({"name": "Rex"}), "pet.type")]
    #[case(json!({"name": "Rex", "type": "dog", "gender": "robot"}), "pet.gender")]
    #[case(json!({"name": "Rex", "type": "dog", "age": 400}), "pet.age")]
    fn invalid_pets_name_the_offending_field(#[case] body: Value, #[case] field: &str) {
        let request: PetRequest = serde_json::from_value(body).expect("pet request");

        let err = request.into_profile().expect_err("invalid pet");

        assert_eq!(err.code(), ErrorCode::InvalidRequest);
        assert_eq!(
            err.details().and_then(|d| d.get("field")).and_then(Value::as_str),
            Some(field)
        );
    }

    #[rstest]
    fn consultation_response_splits_attachments_by_kind() {
        let consultation = Consultation {
            id: ConsultationId::random(),
            account_id: account_id(),
            pet_id: None,
            description: "limping".to_owned(),
            price: CONSULTATION_PRICE,
            status: ConsultationStatus::InReview,
            admin_response: None,
            responded_at: None,
            appointment: Some(Appointment {
                date: SlotDate::parse("2025-01-10").expect("date"),
                time: TimeSlot::parse("14:00").expect("time"),
            }),
            attachments: vec![
                attachment(AttachmentKind::Audio, "a.mp3"),
                attachment(AttachmentKind::Document, "b.pdf"),
                attachment(AttachmentKind::Document, "c.png"),
            ],
            created_at: timestamp(),
            updated_at: timestamp(),
        };

        let body = serde_json::to_value(ConsultationResponse::from(consultation)).expect("json");

        assert_eq!(body["status"], "in_review");
        assert_eq!(body["appointmentTime"], "14:00");
        assert_eq!(body["audioFiles"].as_array().map(Vec::len), Some(1));
        assert_eq!(body["videoFiles"].as_array().map(Vec::len), Some(0));
        assert_eq!(body["documentFiles"].as_array().map(Vec::len), Some(2));
    }

    #[rstest]
    fn account_response_uses_camel_case() {
        let body = serde_json::to_value(AccountResponse::from(account())).expect("json");

        assert_eq!(body["firstName"], "Sara");
        assert_eq!(body["fullName"], "Sara Ahmadi");
        assert_eq!(body["mobile"], "09121234567");
    }
}
