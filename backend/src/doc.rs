//! OpenAPI documentation configuration.
//!
//! This module defines the [`ApiDoc`] struct which generates the OpenAPI
//! specification for the REST API. It registers:
//!
//! - **Paths**: every HTTP endpoint from the inbound layer
//! - **Schemas**: request and response DTOs plus the error envelope
//!   ([`ErrorSchema`], [`ErrorCodeSchema`]), which mirrors the domain error
//!   without coupling it to utoipa
//! - **Security**: bearer token authentication scheme
//!
//! The generated specification is used by Swagger UI (debug builds) and
//! exported via `cargo run --bin openapi-dump` for external tooling.

use crate::inbound::http::accounts::{
    AuthResponse, LoginRequest, ProfileRequest, RegisterRequest, VerifyResponse,
};
use crate::inbound::http::admin_dto::{
    AccountDetailResponse, AccountPageResponse, AccountSummaryResponse,
    ConsultationListingPageResponse, ConsultationListingResponse, DailyCountResponse,
    StatsResponse, StatusChangeRequest, StatusCountResponse,
};
use crate::inbound::http::appointments::{
    AvailableSlotsResponse, BookSlotRequest, BookedSlotResponse, SlotResponse,
};
use crate::inbound::http::consultation_form::ConsultationRequest;
use crate::inbound::http::dto::{
    AccountResponse, ConsultationPageResponse, ConsultationResponse, MessageResponse,
    PaginationResponse, PetRequest, PetResponse,
};
use crate::inbound::http::health::HealthResponse;
use crate::inbound::http::schemas::{ErrorCodeSchema, ErrorSchema};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Name of the bearer security scheme referenced by protected operations.
pub const BEARER_SCHEME: &str = "BearerAuth";

/// Enrich the generated document with the bearer token security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            BEARER_SCHEME,
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .description(Some(
                        "Token issued by POST /api/auth/register or POST /api/auth/login.",
                    ))
                    .build(),
            ),
        );
    }
}

/// OpenAPI document for the REST API.
/// Swagger UI is enabled in debug builds only and used by tooling.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Veterinary consultation API",
        description = "Accounts, pets, consultations, appointment slots, and administration.",
        license(
            name = "Apache-2.0",
            url = "https://www.apache.org/licenses/LICENSE-2.0.html"
        )
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("BearerAuth" = [])),
    paths(
        crate::inbound::http::accounts::register,
        crate::inbound::http::accounts::login,
        crate::inbound::http::accounts::verify,
        crate::inbound::http::accounts::get_profile,
        crate::inbound::http::accounts::update_profile,
        crate::inbound::http::pets::list_pets,
        crate::inbound::http::pets::add_pet,
        crate::inbound::http::pets::update_pet,
        crate::inbound::http::pets::delete_pet,
        crate::inbound::http::consultations::submit_consultation,
        crate::inbound::http::consultations::list_consultations,
        crate::inbound::http::consultations::get_consultation,
        crate::inbound::http::appointments::available_slots,
        crate::inbound::http::appointments::book_slot,
        crate::inbound::http::appointments::cancel_slot,
        crate::inbound::http::appointments::booked_slots,
        crate::inbound::http::admin::stats,
        crate::inbound::http::admin::list_users,
        crate::inbound::http::admin::get_user,
        crate::inbound::http::admin::delete_user,
        crate::inbound::http::admin::user_consultations,
        crate::inbound::http::admin::list_consultations,
        crate::inbound::http::admin::update_consultation,
        crate::inbound::http::admin::change_consultation_status,
        crate::inbound::http::health::status,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        ErrorSchema,
        ErrorCodeSchema,
        RegisterRequest,
        LoginRequest,
        ProfileRequest,
        AuthResponse,
        VerifyResponse,
        AccountResponse,
        PetRequest,
        PetResponse,
        ConsultationRequest,
        ConsultationResponse,
        ConsultationPageResponse,
        PaginationResponse,
        MessageResponse,
        BookSlotRequest,
        AvailableSlotsResponse,
        SlotResponse,
        BookedSlotResponse,
        StatsResponse,
        StatusCountResponse,
        DailyCountResponse,
        AccountSummaryResponse,
        AccountPageResponse,
        AccountDetailResponse,
        ConsultationListingResponse,
        ConsultationListingPageResponse,
        StatusChangeRequest,
        HealthResponse,
    )),
    tags(
        (name = "auth", description = "Registration, login, and token verification"),
        (name = "users", description = "Profile of the authenticated account"),
        (name = "pets", description = "Pets owned by the authenticated account"),
        (name = "consultations", description = "Consultation requests and attachments"),
        (name = "appointments", description = "Half-hour appointment slots"),
        (name = "admin", description = "Administrator dashboard"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
