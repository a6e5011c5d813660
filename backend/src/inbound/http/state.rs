//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{
    AccountCommand, AccountQuery, AdminCommand, AdminQuery, ConsultationCommand,
    ConsultationQuery, PetCommand, PetQuery, SlotAvailabilityQuery, SlotBookingCommand,
    TokenCodec,
};

/// Default ceiling for a single uploaded file, in bytes.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
/// Default ceiling for the number of files in one submission.
pub const DEFAULT_MAX_UPLOAD_FILES: usize = 5;
/// Default ceiling for JSON request bodies, in bytes.
pub const DEFAULT_JSON_LIMIT_BYTES: usize = 10 * 1024 * 1024;

/// Limits applied to consultation submissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadLimits {
    /// Largest accepted file, in bytes.
    pub max_file_bytes: usize,
    /// Largest accepted number of files.
    pub max_files: usize,
    /// Largest accepted JSON submission body, in bytes.
    pub max_json_bytes: usize,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_file_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            max_files: DEFAULT_MAX_UPLOAD_FILES,
            max_json_bytes: DEFAULT_JSON_LIMIT_BYTES,
        }
    }
}

/// Parameter object bundling all port implementations for HTTP handlers.
#[derive(Clone)]
pub struct HttpStatePorts {
    pub accounts: Arc<dyn AccountCommand>,
    pub accounts_query: Arc<dyn AccountQuery>,
    pub pets: Arc<dyn PetCommand>,
    pub pets_query: Arc<dyn PetQuery>,
    pub consultations: Arc<dyn ConsultationCommand>,
    pub consultations_query: Arc<dyn ConsultationQuery>,
    pub slots: Arc<dyn SlotBookingCommand>,
    pub slots_query: Arc<dyn SlotAvailabilityQuery>,
    pub admin: Arc<dyn AdminCommand>,
    pub admin_query: Arc<dyn AdminQuery>,
    pub tokens: Arc<dyn TokenCodec>,
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub accounts: Arc<dyn AccountCommand>,
    pub accounts_query: Arc<dyn AccountQuery>,
    pub pets: Arc<dyn PetCommand>,
    pub pets_query: Arc<dyn PetQuery>,
    pub consultations: Arc<dyn ConsultationCommand>,
    pub consultations_query: Arc<dyn ConsultationQuery>,
    pub slots: Arc<dyn SlotBookingCommand>,
    pub slots_query: Arc<dyn SlotAvailabilityQuery>,
    pub admin: Arc<dyn AdminCommand>,
    pub admin_query: Arc<dyn AdminQuery>,
    /// Verifies bearer credentials for the auth extractors.
    pub tokens: Arc<dyn TokenCodec>,
    pub uploads: UploadLimits,
}

impl From<HttpStatePorts> for HttpState {
    fn from(ports: HttpStatePorts) -> Self {
        Self::new(ports)
    }
}

impl HttpState {
    /// Construct state from a ports bundle with default upload limits.
    pub fn new(ports: HttpStatePorts) -> Self {
        let HttpStatePorts {
            accounts,
            accounts_query,
            pets,
            pets_query,
            consultations,
            consultations_query,
            slots,
            slots_query,
            admin,
            admin_query,
            tokens,
        } = ports;
        Self {
            accounts,
            accounts_query,
            pets,
            pets_query,
            consultations,
            consultations_query,
            slots,
            slots_query,
            admin,
            admin_query,
            tokens,
            uploads: UploadLimits::default(),
        }
    }

    /// Replace the upload limits.
    #[must_use]
    pub fn with_upload_limits(mut self, uploads: UploadLimits) -> Self {
        self.uploads = uploads;
        self
    }
}
