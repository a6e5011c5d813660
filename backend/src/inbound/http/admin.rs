//! Admin dashboard handlers.
//!
//! ```text
//! GET    /api/admin/stats
//! GET    /api/admin/users?page=1&limit=10&search=ahmadi
//! GET    /api/admin/users/{id}
//! DELETE /api/admin/users/{id}
//! GET    /api/admin/users/{id}/consultations
//! GET    /api/admin/consultations?status=pending&sortBy=created_at&sortOrder=desc
//! PUT    /api/admin/consultations/{id}        {"status":"resolved","adminResponse":"..."}
//! PATCH  /api/admin/consultations/{id}/status {"status":"in_review"}
//! ```

use actix_web::{delete, get, patch, put, web};
use tracing::info;

use crate::domain::{AccountId, ConsultationId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::admin_dto::{
    AccountDetailResponse, AccountPageResponse, AccountSearchQuery,
    ConsultationListingPageResponse, ConsultationSearchQuery, StatsResponse, StatusChangeRequest,
};
use crate::inbound::http::auth::AdminIdentity;
use crate::inbound::http::dto::{ConsultationResponse, MessageResponse};
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, page_request, parse_id};

fn account_id(raw: &str) -> ApiResult<AccountId> {
    parse_id(raw, FieldName::new("id"))
}

fn consultation_id(raw: &str) -> ApiResult<ConsultationId> {
    parse_id(raw, FieldName::new("id"))
}

/// Dashboard counters.
#[utoipa::path(
    get,
    path = "/api/admin/stats",
    responses(
        (status = 200, description = "Counters", body = StatsResponse),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "adminStats"
)]
#[get("/admin/stats")]
pub async fn stats(
    state: web::Data<HttpState>,
    _admin: AdminIdentity,
) -> ApiResult<web::Json<StatsResponse>> {
    let stats = state.admin_query.stats().await?;
    Ok(web::Json(stats.into()))
}

/// Search accounts with pet and consultation counts.
#[utoipa::path(
    get,
    path = "/api/admin/users",
    params(AccountSearchQuery),
    responses(
        (status = 200, description = "Accounts", body = AccountPageResponse),
        (status = 400, description = "Invalid paging", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "adminListUsers"
)]
#[get("/admin/users")]
pub async fn list_users(
    state: web::Data<HttpState>,
    _admin: AdminIdentity,
    query: web::Query<AccountSearchQuery>,
) -> ApiResult<web::Json<AccountPageResponse>> {
    let (search, params) = query.into_inner().split();
    let page = page_request(params)?;
    let accounts = state.admin_query.search_accounts(search, page).await?;
    Ok(web::Json(accounts.into()))
}

/// One account with its pets and consultations.
#[utoipa::path(
    get,
    path = "/api/admin/users/{id}",
    params(("id" = String, Path, description = "Account identifier")),
    responses(
        (status = 200, description = "Account detail", body = AccountDetailResponse),
        (status = 400, description = "Invalid identifier", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Account not found", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "adminGetUser"
)]
#[get("/admin/users/{id}")]
pub async fn get_user(
    state: web::Data<HttpState>,
    _admin: AdminIdentity,
    path: web::Path<String>,
) -> ApiResult<web::Json<AccountDetailResponse>> {
    let id = account_id(&path)?;
    let detail = state.admin_query.account_detail(id).await?;
    Ok(web::Json(detail.into()))
}

/// Delete an account with its pets and consultations.
#[utoipa::path(
    delete,
    path = "/api/admin/users/{id}",
    params(("id" = String, Path, description = "Account identifier")),
    responses(
        (status = 200, description = "Account deleted", body = MessageResponse),
        (status = 400, description = "Invalid identifier", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Account not found", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "adminDeleteUser"
)]
#[delete("/admin/users/{id}")]
pub async fn delete_user(
    state: web::Data<HttpState>,
    admin: AdminIdentity,
    path: web::Path<String>,
) -> ApiResult<web::Json<MessageResponse>> {
    let id = account_id(&path)?;
    state.admin.delete_account(id).await?;
    info!(account_id = %id, admin = %admin.mobile, "account deleted");
    Ok(web::Json(MessageResponse::new("account deleted")))
}

/// An account's consultations, newest first.
#[utoipa::path(
    get,
    path = "/api/admin/users/{id}/consultations",
    params(("id" = String, Path, description = "Account identifier")),
    responses(
        (status = 200, description = "Consultations", body = [ConsultationResponse]),
        (status = 400, description = "Invalid identifier", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Account not found", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "adminUserConsultations"
)]
#[get("/admin/users/{id}/consultations")]
pub async fn user_consultations(
    state: web::Data<HttpState>,
    _admin: AdminIdentity,
    path: web::Path<String>,
) -> ApiResult<web::Json<Vec<ConsultationResponse>>> {
    let id = account_id(&path)?;
    let consultations = state.admin_query.account_consultations(id).await?;
    Ok(web::Json(
        consultations
            .into_iter()
            .map(ConsultationResponse::from)
            .collect(),
    ))
}

/// Filter, sort, and page through every consultation.
#[utoipa::path(
    get,
    path = "/api/admin/consultations",
    params(ConsultationSearchQuery),
    responses(
        (status = 200, description = "Consultations", body = ConsultationListingPageResponse),
        (status = 400, description = "Invalid filter or paging", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "adminListConsultations"
)]
#[get("/admin/consultations")]
pub async fn list_consultations(
    state: web::Data<HttpState>,
    _admin: AdminIdentity,
    query: web::Query<ConsultationSearchQuery>,
) -> ApiResult<web::Json<ConsultationListingPageResponse>> {
    let (filter, params) = query.into_inner().split()?;
    let page = page_request(params)?;
    let listings = state.admin_query.search_consultations(filter, page).await?;
    Ok(web::Json(listings.into()))
}

async fn apply_status_change(
    state: &HttpState,
    admin: &AdminIdentity,
    raw_id: &str,
    payload: StatusChangeRequest,
) -> ApiResult<ConsultationResponse> {
    let id = consultation_id(raw_id)?;
    let change = payload.into_change()?;
    let status = change.status;
    let updated = state.consultations.change_status(id, change).await?;
    info!(consultation_id = %id, %status, admin = %admin.mobile, "consultation status changed");
    Ok(updated.into())
}

/// Set status and reply.
#[utoipa::path(
    put,
    path = "/api/admin/consultations/{id}",
    params(("id" = String, Path, description = "Consultation identifier")),
    request_body = StatusChangeRequest,
    responses(
        (status = 200, description = "Updated consultation", body = ConsultationResponse),
        (status = 400, description = "Invalid request or disallowed transition", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Consultation not found", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "adminUpdateConsultation"
)]
#[put("/admin/consultations/{id}")]
pub async fn update_consultation(
    state: web::Data<HttpState>,
    admin: AdminIdentity,
    path: web::Path<String>,
    payload: web::Json<StatusChangeRequest>,
) -> ApiResult<web::Json<ConsultationResponse>> {
    let updated = apply_status_change(&state, &admin, &path, payload.into_inner()).await?;
    Ok(web::Json(updated))
}

/// Change status only; any existing reply is kept.
#[utoipa::path(
    patch,
    path = "/api/admin/consultations/{id}/status",
    params(("id" = String, Path, description = "Consultation identifier")),
    request_body = StatusChangeRequest,
    responses(
        (status = 200, description = "Updated consultation", body = ConsultationResponse),
        (status = 400, description = "Invalid request or disallowed transition", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Consultation not found", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "adminChangeConsultationStatus"
)]
#[patch("/admin/consultations/{id}/status")]
pub async fn change_consultation_status(
    state: web::Data<HttpState>,
    admin: AdminIdentity,
    path: web::Path<String>,
    payload: web::Json<StatusChangeRequest>,
) -> ApiResult<web::Json<ConsultationResponse>> {
    let StatusChangeRequest { status, .. } = payload.into_inner();
    let request = StatusChangeRequest {
        status,
        admin_response: None,
    };
    let updated = apply_status_change(&state, &admin, &path, request).await?;
    Ok(web::Json(updated))
}

#[cfg(test)]
#[path = "admin_tests.rs"]
mod tests;
