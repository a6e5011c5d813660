//! Backend entry-point: loads settings, prepares the database, and serves
//! the REST API with OpenAPI docs in debug builds.

mod server;

use actix_web::web;
use color_eyre::eyre::{Result, WrapErr, eyre};
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};
use zeroize::Zeroizing;

use server::{ServerConfig, create_server};
use vetconsult::domain::{AdminCredentials, MobileNumber};
use vetconsult::inbound::http::error::expose_internal_error_detail;
use vetconsult::inbound::http::health::HealthState;
use vetconsult::outbound::persistence::{DbPool, run_pending_migrations};
use vetconsult::settings::AppSettings;

/// Application bootstrap.
#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = AppSettings::load_from_iter(std::env::args_os())
        .map_err(|err| eyre!("failed to load configuration: {err}"))?;
    expose_internal_error_detail(!settings.production);

    let pool_config = settings
        .pool_config()?
        .ok_or_else(|| eyre!("VETCONSULT_DATABASE_URL must be set"))?;
    let applied = run_pending_migrations(pool_config.database_url())
        .await
        .wrap_err("database migrations failed")?;
    info!(applied, "database schema is up to date");

    let pool = DbPool::new(pool_config)
        .await
        .wrap_err("failed to build database pool")?;

    let jwt_secret = signing_secret(&settings)?;
    let admin = admin_credentials(&settings)?;
    let config = ServerConfig::from_settings(&settings, pool, jwt_secret)?.with_admin(admin);
    info!(bind_addr = %config.bind_addr(), production = settings.production, "starting server");

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state.clone(), config)?;
    let outcome = server.await;
    health_state.mark_unhealthy();
    outcome.wrap_err("server terminated with an error")
}

/// Use the configured secret, or an ephemeral one outside production.
fn signing_secret(settings: &AppSettings) -> Result<Zeroizing<String>> {
    if let Some(secret) = settings.jwt_secret() {
        return Ok(secret);
    }
    if settings.production {
        return Err(eyre!("VETCONSULT_JWT_SECRET must be set in production"));
    }
    warn!("using temporary signing secret (dev only); tokens will not survive a restart");
    let bytes: [u8; 32] = rand::random();
    Ok(Zeroizing::new(hex::encode(bytes)))
}

/// Enable administrator login when both halves of the credentials are set.
fn admin_credentials(settings: &AppSettings) -> Result<Option<AdminCredentials>> {
    match (&settings.admin_mobile, &settings.admin_password) {
        (Some(mobile), Some(password)) if !password.is_empty() => {
            let mobile = MobileNumber::new(mobile)
                .map_err(|err| eyre!("invalid VETCONSULT_ADMIN_MOBILE: {err}"))?;
            Ok(Some(AdminCredentials::new(mobile, password.as_str())))
        }
        (None, None) => {
            warn!("administrator credentials not configured; admin login is disabled");
            Ok(None)
        }
        _ => Err(eyre!(
            "VETCONSULT_ADMIN_MOBILE and VETCONSULT_ADMIN_PASSWORD must be set together"
        )),
    }
}
