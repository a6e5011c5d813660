//! Parsing of consultation submissions sent as JSON or multipart forms.
//!
//! Multipart text fields mirror the JSON body (`description`, `petId`,
//! `pet`, `appointmentDate`, `appointmentTime`) and also accept the flat
//! `petName`/`petType`/... fields older clients send. Every part carrying a
//! file name is treated as an upload and checked against [`UploadLimits`].

use actix_multipart::{Field, Multipart, MultipartError};
use actix_web::error::PayloadError;
use actix_web::web::{Bytes, BytesMut};
use futures_util::{Stream, StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;
use utoipa::ToSchema;

use crate::domain::ports::{ConsultationSubmission, PetSelection, Upload};
use crate::domain::{
    AccountId, Appointment, AttachmentKind, Description, Error, SlotDate, TimeSlot,
};

use super::dto::PetRequest;
use super::state::UploadLimits;
use super::validation::{
    FieldName, description_error, invalid_value_error, missing_field_error, parse_id, slot_error,
};

const MAX_TEXT_FIELD_BYTES: usize = 64 * 1024;

/// Consultation submission body.
///
/// Example JSON:
/// `{"description":"Coughing at night","petId":"3fa85f64-5717-4562-b3fc-2c963f66afa6","appointmentDate":"2025-01-10","appointmentTime":"14:00"}`
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConsultationRequest {
    pub description: Option<String>,
    /// One of the caller's stored pets.
    pub pet_id: Option<String>,
    /// A new pet to store with the consultation; ignored when `petId` is set.
    pub pet: Option<PetRequest>,
    #[schema(example = "2025-01-10")]
    pub appointment_date: Option<String>,
    #[schema(example = "14:00")]
    pub appointment_time: Option<String>,
}

impl ConsultationRequest {
    /// Validate the body and attach `uploads`.
    ///
    /// The description may be omitted only when at least one file is
    /// uploaded.
    pub(crate) fn into_submission(
        self,
        account_id: AccountId,
        uploads: Vec<Upload>,
    ) -> Result<ConsultationSubmission, Error> {
        // A voice or video message can stand in for the written description.
        let description = match self.description.filter(|raw| !raw.trim().is_empty()) {
            Some(raw) => Some(Description::new(&raw).map_err(description_error)?),
            None if uploads.is_empty() => {
                return Err(missing_field_error(FieldName::new("description")));
            }
            None => None,
        };

        let pet = match (self.pet_id.filter(|id| !id.trim().is_empty()), self.pet) {
            (Some(id), _) => PetSelection::Existing(parse_id(&id, FieldName::new("petId"))?),
            (None, Some(pet)) => PetSelection::New(pet.into_profile()?),
            (None, None) => PetSelection::Unspecified,
        };

        let appointment = parse_appointment(self.appointment_date, self.appointment_time)?;

        Ok(ConsultationSubmission {
            account_id,
            pet,
            description,
            appointment,
            uploads,
        })
    }
}

fn parse_appointment(
    date: Option<String>,
    time: Option<String>,
) -> Result<Option<Appointment>, Error> {
    let present = |value: Option<String>| value.filter(|raw| !raw.trim().is_empty());
    match (present(date), present(time)) {
        (None, None) => Ok(None),
        (Some(date), Some(time)) => Ok(Some(Appointment {
            date: SlotDate::parse(&date).map_err(slot_error)?,
            time: TimeSlot::parse(&time).map_err(slot_error)?,
        })),
        (Some(_), None) => Err(missing_field_error(FieldName::new("appointmentTime"))),
        (None, Some(_)) => Err(missing_field_error(FieldName::new("appointmentDate"))),
    }
}

/// A parsed submission before it is bound to the caller.
#[derive(Debug, Default)]
pub(crate) struct SubmissionForm {
    pub request: ConsultationRequest,
    pub uploads: Vec<Upload>,
}

fn upload_error(message: String, code: &str, file: Option<&str>) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": "files",
        "code": code,
        "value": file,
    }))
}

fn map_multipart_error(error: MultipartError) -> Error {
    debug!(%error, "multipart body rejected");
    Error::invalid_request("malformed multipart body")
        .with_details(json!({ "field": "body", "code": "malformed_multipart" }))
}

fn map_payload_error(error: PayloadError) -> Error {
    debug!(%error, "request body could not be read");
    Error::invalid_request("request body could not be read")
}

/// Read a JSON submission, enforcing `limit` bytes.
pub(crate) async fn read_json<S>(mut payload: S, limit: usize) -> Result<SubmissionForm, Error>
where
    S: Stream<Item = Result<Bytes, PayloadError>> + Unpin,
{
    let mut body = BytesMut::new();
    while let Some(chunk) = payload.next().await {
        let chunk = chunk.map_err(map_payload_error)?;
        if body.len() + chunk.len() > limit {
            return Err(Error::invalid_request(format!(
                "request body exceeds {limit} bytes"
            )));
        }
        body.extend_from_slice(&chunk);
    }
    let request = serde_json::from_slice(&body).map_err(|error| {
        Error::invalid_request(format!("malformed JSON body: {error}"))
            .with_details(json!({ "field": "body", "code": "malformed_json" }))
    })?;
    Ok(SubmissionForm {
        request,
        uploads: Vec::new(),
    })
}

/// Read a multipart submission, enforcing the upload limits.
pub(crate) async fn read_multipart(
    mut multipart: Multipart,
    limits: UploadLimits,
) -> Result<SubmissionForm, Error> {
    let mut form = SubmissionForm::default();
    let mut flat_pet = PetRequest::default();
    let mut has_flat_pet = false;

    while let Some(field) = multipart.try_next().await.map_err(map_multipart_error)? {
        let name = field.name().unwrap_or_default().to_owned();
        let file_name = field
            .content_disposition()
            .and_then(|disposition| disposition.get_filename())
            .map(str::to_owned);

        if let Some(file_name) = file_name {
            if form.uploads.len() >= limits.max_files {
                return Err(upload_error(
                    format!("at most {} files may be uploaded", limits.max_files),
                    "too_many_files",
                    Some(&file_name),
                ));
            }
            form.uploads.push(read_upload(field, file_name, limits).await?);
            continue;
        }

        let value = read_text(field).await?;
        has_flat_pet |= apply_text_field(&mut form.request, &mut flat_pet, &name, value)?;
    }

    if form.request.pet.is_none() && has_flat_pet {
        form.request.pet = Some(flat_pet);
    }
    Ok(form)
}

async fn read_upload(
    mut field: Field,
    file_name: String,
    limits: UploadLimits,
) -> Result<Upload, Error> {
    let content_type = field
        .content_type()
        .map(ToString::to_string)
        .unwrap_or_else(|| "application/octet-stream".to_owned());
    let Some(kind) = AttachmentKind::classify(&content_type) else {
        return Err(upload_error(
            format!("{content_type} files are not accepted; upload images, video, audio, or PDF"),
            "unsupported_file_type",
            Some(&file_name),
        ));
    };

    let mut bytes = Vec::new();
    while let Some(chunk) = field.try_next().await.map_err(map_multipart_error)? {
        if bytes.len() + chunk.len() > limits.max_file_bytes {
            return Err(upload_error(
                format!("files must be at most {} bytes", limits.max_file_bytes),
                "file_too_large",
                Some(&file_name),
            ));
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(Upload {
        kind,
        content_type,
        original_name: Some(file_name),
        bytes,
    })
}

async fn read_text(mut field: Field) -> Result<String, Error> {
    let mut bytes = Vec::new();
    while let Some(chunk) = field.try_next().await.map_err(map_multipart_error)? {
        if bytes.len() + chunk.len() > MAX_TEXT_FIELD_BYTES {
            return Err(Error::invalid_request(format!(
                "form fields must be at most {MAX_TEXT_FIELD_BYTES} bytes"
            )));
        }
        bytes.extend_from_slice(&chunk);
    }
    String::from_utf8(bytes).map_err(|_| Error::invalid_request("form fields must be UTF-8"))
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn parse_number<T: std::str::FromStr>(raw: &str, field: &'static str) -> Result<T, Error> {
    raw.trim()
        .parse()
        .map_err(|_| invalid_value_error(FieldName::new(field), "must be a number", raw))
}

/// Apply one text part. Returns whether it was a flat pet field.
fn apply_text_field(
    request: &mut ConsultationRequest,
    flat_pet: &mut PetRequest,
    name: &str,
    value: String,
) -> Result<bool, Error> {
    match name {
        "description" => request.description = Some(value),
        "symptoms" => {
            if request.description.is_none() {
                request.description = Some(value);
            }
        }
        "petId" => request.pet_id = Some(value),
        "pet" => {
            let pet = serde_json::from_str(&value).map_err(|_| {
                invalid_value_error(FieldName::new("pet"), "pet must be a JSON object", &value)
            })?;
            request.pet = Some(pet);
        }
        "appointmentDate" => request.appointment_date = Some(value),
        "appointmentTime" | "timeSlot" => request.appointment_time = Some(value),
        "petName" => flat_pet.name = Some(value),
        "petType" => flat_pet.species = Some(value),
        "petBreed" => flat_pet.breed = Some(value),
        "petGender" => flat_pet.gender = Some(value),
        "petAge" => flat_pet.age = Some(parse_number(&value, "petAge")?),
        "petWeight" => flat_pet.weight = Some(parse_number(&value, "petWeight")?),
        "petIsNeutered" => flat_pet.is_neutered = parse_flag(&value),
        other => {
            debug!(field = other, "ignoring unknown form field");
            return Ok(false);
        }
    }
    Ok(name.starts_with("pet") && name != "petId" && name != "pet")
}
