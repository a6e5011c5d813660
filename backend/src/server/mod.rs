//! Server construction and middleware wiring.

mod config;
mod state_builders;

pub use config::{RateLimits, ServerConfig};

use state_builders::build_http_state;

use std::sync::Arc;

use actix_web::body::MessageBody;
use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
use mockable::Clock;

use vetconsult::Trace;
#[cfg(debug_assertions)]
use vetconsult::doc::ApiDoc;
use vetconsult::inbound::http::accounts::{
    get_profile, login, register, update_profile, verify,
};
use vetconsult::inbound::http::admin::{
    change_consultation_status, delete_user, get_user, list_consultations as admin_consultations,
    list_users, stats, update_consultation, user_consultations,
};
use vetconsult::inbound::http::appointments::{
    available_slots, book_slot, booked_slots, cancel_slot,
};
use vetconsult::inbound::http::consultations::{
    get_consultation, list_consultations, submit_consultation,
};
use vetconsult::inbound::http::extractor_config::{
    json_config, path_config, query_config, route_not_found,
};
use vetconsult::inbound::http::health::{HealthState, live, ready, status};
use vetconsult::inbound::http::pets::{add_pet, delete_pet, list_pets, update_pet};
use vetconsult::inbound::http::state::HttpState;
use vetconsult::middleware::RateLimit;
use vetconsult::middleware::rate_limit::{DEFAULT_MAX_TRACKED_CLIENTS, RateLimiter};
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

/// Prefix receiving the stricter authentication allowance.
const AUTH_PREFIX: &str = "/api/auth";

#[derive(Clone)]
struct AppDependencies {
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
    rate_limit: RateLimit,
}

/// Build the global and authentication limiters shared by every worker.
fn build_rate_limit(limits: RateLimits, clock: Arc<dyn Clock>) -> RateLimit {
    let global = Arc::new(RateLimiter::new(
        limits.global,
        DEFAULT_MAX_TRACKED_CLIENTS,
        clock.clone(),
    ));
    let auth = Arc::new(RateLimiter::new(
        limits.auth,
        DEFAULT_MAX_TRACKED_CLIENTS,
        clock,
    ));
    RateLimit::new(global).with_prefix(AUTH_PREFIX, auth)
}

fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        http_state,
        rate_limit,
    } = deps;

    let json_limit = http_state.uploads.max_json_bytes;

    let api = web::scope("/api")
        .service(register)
        .service(login)
        .service(verify)
        .service(get_profile)
        .service(update_profile)
        .service(list_pets)
        .service(add_pet)
        .service(update_pet)
        .service(delete_pet)
        .service(submit_consultation)
        .service(list_consultations)
        .service(get_consultation)
        .service(available_slots)
        .service(book_slot)
        .service(cancel_slot)
        .service(booked_slots)
        .service(stats)
        .service(list_users)
        .service(get_user)
        .service(delete_user)
        .service(user_consultations)
        .service(admin_consultations)
        .service(update_consultation)
        .service(change_consultation_status)
        .service(status);

    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .app_data(json_config(json_limit))
        .app_data(query_config())
        .app_data(path_config())
        .wrap(rate_limit)
        .wrap(Trace)
        .service(api)
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()));

    app.default_service(web::to(route_not_found))
}

/// Construct an Actix HTTP server using the provided health state and configuration.
///
/// # Parameters
/// - `health_state`: shared readiness state updated once the server is initialised.
/// - `config`: pre-built [`ServerConfig`] containing adapters, limits, and the bind address.
///
/// # Returns
/// A spawned [`Server`] that must be awaited to drive the listener.
///
/// # Errors
/// Propagates [`std::io::Error`] when opening the upload directory, binding
/// the socket, or starting the server fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let server_health_state = health_state.clone();
    let http_state = build_http_state(&config)?;
    let rate_limit = build_rate_limit(config.rate_limits, config.clock.clone());
    let bind_addr = config.bind_addr();

    let server = HttpServer::new(move || {
        build_app(AppDependencies {
            health_state: server_health_state.clone(),
            http_state: http_state.clone(),
            rate_limit: rate_limit.clone(),
        })
    })
    .bind(bind_addr)?
    .run();

    health_state.mark_ready();
    Ok(server)
}

