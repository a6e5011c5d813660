//! Consultation submission and history handlers for account holders.
//!
//! ```text
//! POST /api/consultations          JSON or multipart/form-data
//! GET  /api/consultations?page=1&limit=10
//! GET  /api/consultations/{id}
//! ```

use actix_multipart::Multipart;
use actix_web::http::header::CONTENT_TYPE;
use actix_web::{HttpRequest, HttpResponse, get, post, web};
use pagination::PageParams;
use tracing::info;

use crate::domain::ConsultationId;
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AuthenticatedAccount;
use crate::inbound::http::consultation_form::{
    ConsultationRequest, SubmissionForm, read_json, read_multipart,
};
use crate::inbound::http::dto::{ConsultationPageResponse, ConsultationResponse};
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, page_request, parse_id};

fn is_multipart(request: &HttpRequest) -> bool {
    request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| {
            value
                .trim_start()
                .to_ascii_lowercase()
                .starts_with("multipart/form-data")
        })
}

/// Submit a consultation, optionally with files and an appointment.
///
/// Files may be sent as any number of multipart parts with a file name, up
/// to the configured count and size. The requested slot is reserved as part
/// of the submission; a taken slot fails the whole request.
#[utoipa::path(
    post,
    path = "/api/consultations",
    request_body(
        content = ConsultationRequest,
        description = "JSON body, or the same fields as multipart/form-data plus file parts"
    ),
    responses(
        (status = 201, description = "Consultation created", body = ConsultationResponse),
        (status = 400, description = "Invalid request or slot taken", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Pet not found", body = ErrorSchema)
    ),
    tags = ["consultations"],
    operation_id = "submitConsultation"
)]
#[post("/consultations")]
pub async fn submit_consultation(
    state: web::Data<HttpState>,
    account: AuthenticatedAccount,
    request: HttpRequest,
    payload: web::Payload,
) -> ApiResult<HttpResponse> {
    let SubmissionForm { request: body, uploads } = if is_multipart(&request) {
        read_multipart(Multipart::new(request.headers(), payload), state.uploads).await?
    } else {
        read_json(payload, state.uploads.max_json_bytes).await?
    };
    let submission = body.into_submission(account.id, uploads)?;
    let consultation = state.consultations.submit(submission).await?;
    info!(
        consultation_id = %consultation.id,
        account_id = %consultation.account_id,
        attachments = consultation.attachments.len(),
        "consultation submitted"
    );
    Ok(HttpResponse::Created().json(ConsultationResponse::from(consultation)))
}

/// Page through the caller's consultations, newest first.
#[utoipa::path(
    get,
    path = "/api/consultations",
    params(
        ("page" = Option<u32>, Query, description = "1-based page number, default 1"),
        ("limit" = Option<u32>, Query, description = "Page size, default 10")
    ),
    responses(
        (status = 200, description = "Consultations", body = ConsultationPageResponse),
        (status = 400, description = "Invalid paging", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema)
    ),
    tags = ["consultations"],
    operation_id = "listConsultations"
)]
#[get("/consultations")]
pub async fn list_consultations(
    state: web::Data<HttpState>,
    account: AuthenticatedAccount,
    query: web::Query<PageParams>,
) -> ApiResult<web::Json<ConsultationPageResponse>> {
    let page = page_request(query.into_inner())?;
    let consultations = state
        .consultations_query
        .list_for_account(account.id, page)
        .await?;
    Ok(web::Json(consultations.into()))
}

/// Fetch one of the caller's consultations.
#[utoipa::path(
    get,
    path = "/api/consultations/{id}",
    params(("id" = String, Path, description = "Consultation identifier")),
    responses(
        (status = 200, description = "Consultation", body = ConsultationResponse),
        (status = 400, description = "Invalid identifier", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["consultations"],
    operation_id = "getConsultation"
)]
#[get("/consultations/{id}")]
pub async fn get_consultation(
    state: web::Data<HttpState>,
    account: AuthenticatedAccount,
    path: web::Path<String>,
) -> ApiResult<web::Json<ConsultationResponse>> {
    let id: ConsultationId = parse_id(&path, FieldName::new("id"))?;
    let consultation = state
        .consultations_query
        .get_for_account(account.id, id)
        .await?;
    Ok(web::Json(consultation.into()))
}

#[cfg(test)]
#[path = "consultations_tests.rs"]
mod tests;
