//! HTTP server configuration object and helpers.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use mockable::{Clock, DefaultClock};
use vetconsult::domain::AdminCredentials;
use vetconsult::inbound::http::state::UploadLimits;
use vetconsult::middleware::rate_limit::RateLimitPolicy;
use vetconsult::outbound::persistence::DbPool;
use vetconsult::outbound::security::TokenLifetimes;
use vetconsult::settings::{AppSettings, SettingsError};
use zeroize::Zeroizing;

/// Global and `/api/auth` request allowances.
#[derive(Debug, Clone, Copy)]
pub struct RateLimits {
    pub global: RateLimitPolicy,
    pub auth: RateLimitPolicy,
}

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) db_pool: DbPool,
    pub(crate) jwt_secret: Zeroizing<String>,
    pub(crate) token_lifetimes: TokenLifetimes,
    pub(crate) admin: Option<AdminCredentials>,
    pub(crate) upload_dir: PathBuf,
    pub(crate) upload_limits: UploadLimits,
    pub(crate) rate_limits: RateLimits,
    pub(crate) clock: Arc<dyn Clock>,
}

impl ServerConfig {
    /// Derive a server configuration from loaded settings.
    ///
    /// # Errors
    /// Returns [`SettingsError`] when a configured value is unusable.
    pub fn from_settings(
        settings: &AppSettings,
        db_pool: DbPool,
        jwt_secret: Zeroizing<String>,
    ) -> Result<Self, SettingsError> {
        Ok(Self {
            bind_addr: settings.bind_addr()?,
            db_pool,
            jwt_secret,
            token_lifetimes: settings.token_lifetimes()?,
            admin: None,
            upload_dir: settings.upload_dir(),
            upload_limits: settings.upload_limits()?,
            rate_limits: RateLimits {
                global: settings.global_rate_limit()?,
                auth: settings.auth_rate_limit()?,
            },
            clock: Arc::new(DefaultClock),
        })
    }

    /// Enable administrator login with the given credentials.
    #[must_use]
    pub fn with_admin(mut self, admin: Option<AdminCredentials>) -> Self {
        self.admin = admin;
        self
    }

    /// Return the socket address the server will bind to.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }
}
