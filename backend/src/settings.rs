//! Process configuration loaded via OrthoConfig.
//!
//! Values are layered from CLI arguments, `VETCONSULT_*` environment
//! variables, and an optional configuration file. Optional fields fall back
//! to the defaults exposed by the accessor methods.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use zeroize::Zeroizing;

use crate::inbound::http::state::{
    DEFAULT_JSON_LIMIT_BYTES, DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_MAX_UPLOAD_FILES, UploadLimits,
};
use crate::middleware::rate_limit::RateLimitPolicy;
use crate::outbound::persistence::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_MAX_CONNECTIONS, PoolConfig};
use crate::outbound::security::TokenLifetimes;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_UPLOAD_DIR: &str = "uploads";
const DEFAULT_RATE_LIMIT_MAX_REQUESTS: u32 = 1000;
const DEFAULT_RATE_LIMIT_WINDOW_SECS: u64 = 900;
const DEFAULT_AUTH_RATE_LIMIT_MAX_REQUESTS: u32 = 100;
const DEFAULT_ACCOUNT_TOKEN_TTL_HOURS: i64 = 168;
const DEFAULT_ADMIN_TOKEN_TTL_HOURS: i64 = 24;

/// Errors raised when a loaded configuration cannot be used.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("invalid bind address {value:?}: {message}")]
    BindAddr { value: String, message: String },
    #[error("{field} must be greater than zero")]
    NotPositive { field: &'static str },
}

/// Configuration for the API server process.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "VETCONSULT")]
pub struct AppSettings {
    /// Socket address the HTTP listener binds to.
    pub bind_addr: Option<String>,
    /// PostgreSQL connection string.
    pub database_url: Option<String>,
    pub db_max_connections: Option<u32>,
    pub db_connect_timeout_secs: Option<u64>,
    /// HS256 signing secret for bearer credentials.
    pub jwt_secret: Option<String>,
    /// Mobile number of the built-in administrator.
    pub admin_mobile: Option<String>,
    /// Password of the built-in administrator.
    pub admin_password: Option<String>,
    /// Production mode redacts internal errors and requires a JWT secret.
    #[ortho_config(default = false)]
    pub production: bool,
    /// Directory holding uploaded consultation attachments.
    pub upload_dir: Option<PathBuf>,
    pub max_upload_bytes: Option<usize>,
    pub max_upload_files: Option<usize>,
    pub json_limit_bytes: Option<usize>,
    pub rate_limit_max_requests: Option<u32>,
    pub rate_limit_window_secs: Option<u64>,
    /// Stricter allowance for `/api/auth` within the same window.
    pub auth_rate_limit_max_requests: Option<u32>,
    pub account_token_ttl_hours: Option<i64>,
    pub admin_token_ttl_hours: Option<i64>,
}

impl AppSettings {
    /// Parse the configured bind address, falling back to `0.0.0.0:8080`.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let raw = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        raw.parse().map_err(|err: std::net::AddrParseError| SettingsError::BindAddr {
            value: raw.to_owned(),
            message: err.to_string(),
        })
    }

    /// Return the signing secret, if one is configured and non-blank.
    pub fn jwt_secret(&self) -> Option<Zeroizing<String>> {
        self.jwt_secret
            .as_deref()
            .map(str::trim)
            .filter(|secret| !secret.is_empty())
            .map(|secret| Zeroizing::new(secret.to_owned()))
    }

    /// Pool settings for the configured database, if one is configured.
    pub fn pool_config(&self) -> Result<Option<PoolConfig>, SettingsError> {
        let Some(url) = self.database_url.as_deref() else {
            return Ok(None);
        };
        let max_size = positive(
            "db_max_connections",
            self.db_max_connections.unwrap_or(DEFAULT_MAX_CONNECTIONS),
        )?;
        let timeout = positive(
            "db_connect_timeout_secs",
            self.db_connect_timeout_secs
                .unwrap_or(DEFAULT_CONNECT_TIMEOUT.as_secs()),
        )?;
        Ok(Some(
            PoolConfig::new(url)
                .with_max_size(max_size)
                .with_connection_timeout(Duration::from_secs(timeout)),
        ))
    }

    pub fn upload_dir(&self) -> PathBuf {
        self.upload_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_UPLOAD_DIR))
    }

    /// Limits applied to consultation submissions.
    pub fn upload_limits(&self) -> Result<UploadLimits, SettingsError> {
        Ok(UploadLimits {
            max_file_bytes: positive(
                "max_upload_bytes",
                self.max_upload_bytes.unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            )?,
            max_files: positive(
                "max_upload_files",
                self.max_upload_files.unwrap_or(DEFAULT_MAX_UPLOAD_FILES),
            )?,
            max_json_bytes: positive(
                "json_limit_bytes",
                self.json_limit_bytes.unwrap_or(DEFAULT_JSON_LIMIT_BYTES),
            )?,
        })
    }

    fn rate_limit_window(&self) -> Result<Duration, SettingsError> {
        let secs = positive(
            "rate_limit_window_secs",
            self.rate_limit_window_secs
                .unwrap_or(DEFAULT_RATE_LIMIT_WINDOW_SECS),
        )?;
        Ok(Duration::from_secs(secs))
    }

    /// Allowance applied to every client across all routes.
    pub fn global_rate_limit(&self) -> Result<RateLimitPolicy, SettingsError> {
        Ok(RateLimitPolicy {
            max_requests: positive(
                "rate_limit_max_requests",
                self.rate_limit_max_requests
                    .unwrap_or(DEFAULT_RATE_LIMIT_MAX_REQUESTS),
            )?,
            window: self.rate_limit_window()?,
        })
    }

    /// Allowance applied to `/api/auth` routes.
    pub fn auth_rate_limit(&self) -> Result<RateLimitPolicy, SettingsError> {
        Ok(RateLimitPolicy {
            max_requests: positive(
                "auth_rate_limit_max_requests",
                self.auth_rate_limit_max_requests
                    .unwrap_or(DEFAULT_AUTH_RATE_LIMIT_MAX_REQUESTS),
            )?,
            window: self.rate_limit_window()?,
        })
    }

    /// Validity windows for account and administrator tokens.
    pub fn token_lifetimes(&self) -> Result<TokenLifetimes, SettingsError> {
        let account = positive(
            "account_token_ttl_hours",
            self.account_token_ttl_hours
                .unwrap_or(DEFAULT_ACCOUNT_TOKEN_TTL_HOURS),
        )?;
        let admin = positive(
            "admin_token_ttl_hours",
            self.admin_token_ttl_hours
                .unwrap_or(DEFAULT_ADMIN_TOKEN_TTL_HOURS),
        )?;
        Ok(TokenLifetimes {
            account: chrono::Duration::hours(account),
            admin: chrono::Duration::hours(admin),
        })
    }
}

fn positive<T>(field: &'static str, value: T) -> Result<T, SettingsError>
where
    T: PartialOrd + Default,
{
    if value > T::default() {
        Ok(value)
    } else {
        Err(SettingsError::NotPositive { field })
    }
}
