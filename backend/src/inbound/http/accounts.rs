//! Registration, login, and profile handlers.
//!
//! ```text
//! POST /api/auth/register {"firstName":"Sara","lastName":"Ahmadi","mobile":"09121234567","password":"hunter22"}
//! POST /api/auth/login    {"mobile":"09121234567","password":"hunter22"}
//! GET  /api/auth/verify
//! GET  /api/users/profile
//! PUT  /api/users/profile {"firstName":"Sara","lastName":"Karimi"}
//! ```

use actix_web::{HttpResponse, get, post, put, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{
    AuthSession, Error, ErrorCode, Identity, LoginCredentials, PersonName, RegistrationDraft,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::{AuthenticatedAccount, Caller};
use crate::inbound::http::dto::{AccountResponse, PetRequest};
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, account_error, credential_error, require};

/// Registration request body.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub mobile: Option<String>,
    pub password: Option<String>,
    /// Optional first pet stored with the account.
    pub pet: Option<PetRequest>,
}

/// Login request body.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub mobile: Option<String>,
    pub password: Option<String>,
}

/// Profile update request body.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Issued bearer token with the caller it represents.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub expires_at: String,
    pub is_admin: bool,
    pub account: Option<AccountResponse>,
}

impl From<AuthSession> for AuthResponse {
    fn from(value: AuthSession) -> Self {
        Self {
            token: value.token.token,
            expires_at: value.token.expires_at.to_rfc3339(),
            is_admin: value.identity.is_admin(),
            account: value.account.map(AccountResponse::from),
        }
    }
}

/// Result of verifying the presented bearer token.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    pub valid: bool,
    pub is_admin: bool,
    pub mobile: String,
    pub account: Option<AccountResponse>,
}

fn parse_registration(payload: RegisterRequest) -> ApiResult<RegistrationDraft> {
    let first_name = require(payload.first_name, FieldName::new("firstName"))?;
    let last_name = require(payload.last_name, FieldName::new("lastName"))?;
    let mobile = require(payload.mobile, FieldName::new("mobile"))?;
    let password = require(payload.password, FieldName::new("password"))?;
    let pet = payload.pet.map(PetRequest::into_profile).transpose()?;
    RegistrationDraft::try_new(&first_name, &last_name, &mobile, &password, pet)
        .map_err(credential_error)
}

fn parse_login(payload: LoginRequest) -> ApiResult<LoginCredentials> {
    let mobile = require(payload.mobile, FieldName::new("mobile"))?;
    let password = require(payload.password, FieldName::new("password"))?;
    LoginCredentials::try_from_parts(&mobile, &password).map_err(credential_error)
}

/// Register a new account and issue its bearer token.
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Invalid request or duplicate mobile", body = ErrorSchema),
        (status = 429, description = "Too many requests", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["auth"],
    operation_id = "register",
    security([])
)]
#[post("/auth/register")]
pub async fn register(
    state: web::Data<HttpState>,
    payload: web::Json<RegisterRequest>,
) -> ApiResult<HttpResponse> {
    let draft = parse_registration(payload.into_inner())?;
    let session = state.accounts.register(draft).await?;
    Ok(HttpResponse::Created().json(AuthResponse::from(session)))
}

/// Exchange mobile and password for a bearer token.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login success", body = AuthResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Invalid credentials", body = ErrorSchema),
        (status = 429, description = "Too many requests", body = ErrorSchema)
    ),
    tags = ["auth"],
    operation_id = "login",
    security([])
)]
#[post("/auth/login")]
pub async fn login(
    state: web::Data<HttpState>,
    payload: web::Json<LoginRequest>,
) -> ApiResult<web::Json<AuthResponse>> {
    let credentials = parse_login(payload.into_inner())?;
    let session = state.accounts.login(credentials).await?;
    Ok(web::Json(AuthResponse::from(session)))
}

/// Check the presented token and describe its holder.
#[utoipa::path(
    get,
    path = "/api/auth/verify",
    responses(
        (status = 200, description = "Token is valid", body = VerifyResponse),
        (status = 401, description = "Missing, invalid, or expired token", body = ErrorSchema)
    ),
    tags = ["auth"],
    operation_id = "verifyToken"
)]
#[get("/auth/verify")]
pub async fn verify(
    state: web::Data<HttpState>,
    caller: Caller,
) -> ApiResult<web::Json<VerifyResponse>> {
    let Caller(identity) = caller;
    let account = match &identity {
        Identity::Account { id, .. } => {
            let account = state.accounts_query.profile(*id).await.map_err(|err| {
                if err.code() == ErrorCode::NotFound {
                    Error::unauthorized("account no longer exists")
                } else {
                    err
                }
            })?;
            Some(AccountResponse::from(account))
        }
        Identity::Admin { .. } => None,
    };
    Ok(web::Json(VerifyResponse {
        valid: true,
        is_admin: identity.is_admin(),
        mobile: identity.mobile().to_string(),
        account,
    }))
}

/// Fetch the caller's profile.
#[utoipa::path(
    get,
    path = "/api/users/profile",
    responses(
        (status = 200, description = "Account profile", body = AccountResponse),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Account not found", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "getProfile"
)]
#[get("/users/profile")]
pub async fn get_profile(
    state: web::Data<HttpState>,
    account: AuthenticatedAccount,
) -> ApiResult<web::Json<AccountResponse>> {
    let profile = state.accounts_query.profile(account.id).await?;
    Ok(web::Json(profile.into()))
}

/// Rename the caller.
#[utoipa::path(
    put,
    path = "/api/users/profile",
    request_body = ProfileRequest,
    responses(
        (status = 200, description = "Updated profile", body = AccountResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "updateProfile"
)]
#[put("/users/profile")]
pub async fn update_profile(
    state: web::Data<HttpState>,
    account: AuthenticatedAccount,
    payload: web::Json<ProfileRequest>,
) -> ApiResult<web::Json<AccountResponse>> {
    let ProfileRequest {
        first_name,
        last_name,
    } = payload.into_inner();
    let first_name = require(first_name, FieldName::new("firstName"))?;
    let last_name = require(last_name, FieldName::new("lastName"))?;
    let name = PersonName::new(&first_name, &last_name).map_err(account_error)?;
    let updated = state.accounts.update_profile(account.id, name).await?;
    Ok(web::Json(updated.into()))
}

#[cfg(test)]
#[path = "accounts_tests.rs"]
mod tests;
