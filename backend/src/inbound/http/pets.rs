//! Pet profile handlers for the authenticated account.
//!
//! ```text
//! GET    /api/users/pets
//! POST   /api/users/pets      {"name":"Rex","type":"dog"}
//! PUT    /api/users/pets/{id} {"name":"Rex","type":"dog","age":4}
//! DELETE /api/users/pets/{id}
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};

use crate::domain::PetId;
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AuthenticatedAccount;
use crate::inbound::http::dto::{MessageResponse, PetRequest, PetResponse};
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_id};

fn pet_id(raw: &str) -> ApiResult<PetId> {
    parse_id(raw, FieldName::new("id"))
}

/// List the caller's pets.
#[utoipa::path(
    get,
    path = "/api/users/pets",
    responses(
        (status = 200, description = "Pets owned by the caller", body = [PetResponse]),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema)
    ),
    tags = ["pets"],
    operation_id = "listPets"
)]
#[get("/users/pets")]
pub async fn list_pets(
    state: web::Data<HttpState>,
    account: AuthenticatedAccount,
) -> ApiResult<web::Json<Vec<PetResponse>>> {
    let pets = state.pets_query.list_pets(account.id).await?;
    Ok(web::Json(pets.into_iter().map(PetResponse::from).collect()))
}

/// Add a pet to the caller's account.
#[utoipa::path(
    post,
    path = "/api/users/pets",
    request_body = PetRequest,
    responses(
        (status = 201, description = "Pet created", body = PetResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema)
    ),
    tags = ["pets"],
    operation_id = "addPet"
)]
#[post("/users/pets")]
pub async fn add_pet(
    state: web::Data<HttpState>,
    account: AuthenticatedAccount,
    payload: web::Json<PetRequest>,
) -> ApiResult<HttpResponse> {
    let profile = payload.into_inner().into_profile()?;
    let pet = state.pets.add_pet(account.id, profile).await?;
    Ok(HttpResponse::Created().json(PetResponse::from(pet)))
}

/// Replace a pet's profile.
#[utoipa::path(
    put,
    path = "/api/users/pets/{id}",
    params(("id" = String, Path, description = "Pet identifier")),
    request_body = PetRequest,
    responses(
        (status = 200, description = "Updated pet", body = PetResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Pet not found", body = ErrorSchema)
    ),
    tags = ["pets"],
    operation_id = "updatePet"
)]
#[put("/users/pets/{id}")]
pub async fn update_pet(
    state: web::Data<HttpState>,
    account: AuthenticatedAccount,
    path: web::Path<String>,
    payload: web::Json<PetRequest>,
) -> ApiResult<web::Json<PetResponse>> {
    let id = pet_id(&path)?;
    let profile = payload.into_inner().into_profile()?;
    let pet = state.pets.update_pet(account.id, id, profile).await?;
    Ok(web::Json(pet.into()))
}

/// Remove a pet.
#[utoipa::path(
    delete,
    path = "/api/users/pets/{id}",
    params(("id" = String, Path, description = "Pet identifier")),
    responses(
        (status = 200, description = "Pet removed", body = MessageResponse),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Pet not found", body = ErrorSchema)
    ),
    tags = ["pets"],
    operation_id = "deletePet"
)]
#[delete("/users/pets/{id}")]
pub async fn delete_pet(
    state: web::Data<HttpState>,
    account: AuthenticatedAccount,
    path: web::Path<String>,
) -> ApiResult<web::Json<MessageResponse>> {
    let id = pet_id(&path)?;
    state.pets.remove_pet(account.id, id).await?;
    Ok(web::Json(MessageResponse::new("pet removed")))
}
