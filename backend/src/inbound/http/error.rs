//! HTTP adapter mapping for domain errors.
//!
//! Purpose: keep the domain error type HTTP-agnostic while allowing Actix
//! handlers to turn domain failures into consistent JSON responses and status
//! codes. Conflicts are reported as `400 Bad Request` with a descriptive
//! message; internal errors are redacted unless detail exposure is enabled
//! for non-production runs.

use std::sync::atomic::{AtomicBool, Ordering};

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use tracing::error;

use crate::domain::{Error, ErrorCode, TRACE_ID_HEADER};

/// Convenient result alias for HTTP handlers.
pub type ApiResult<T> = Result<T, Error>;

const INTERNAL_MESSAGE: &str = "Internal server error";

static EXPOSE_INTERNAL_DETAIL: AtomicBool = AtomicBool::new(false);

/// Return internal error messages to clients instead of the generic text.
///
/// Called once at startup when the process runs outside production.
pub fn expose_internal_error_detail(enabled: bool) {
    EXPOSE_INTERNAL_DETAIL.store(enabled, Ordering::Release);
}

fn internal_detail_exposed() -> bool {
    EXPOSE_INTERNAL_DETAIL.load(Ordering::Acquire)
}

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::InvalidRequest | ErrorCode::Conflict => StatusCode::BAD_REQUEST,
        ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorCode::Forbidden => StatusCode::FORBIDDEN,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn client_payload(error: &Error, expose_internal: bool) -> Error {
    if matches!(error.code(), ErrorCode::InternalError) && !expose_internal {
        let mut redacted = Error::internal(INTERNAL_MESSAGE);
        if let Some(id) = error.trace_id() {
            redacted = redacted.with_trace_id(id.to_owned());
        }
        redacted
    } else {
        error.clone()
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        status_for(self.code())
    }

    fn error_response(&self) -> HttpResponse {
        if matches!(self.code(), ErrorCode::InternalError) {
            error!(
                trace_id = self.trace_id().unwrap_or_default(),
                message = self.message(),
                "request failed with internal error"
            );
        }

        let mut builder = HttpResponse::build(self.status_code());
        if let Some(id) = self.trace_id() {
            builder.insert_header((TRACE_ID_HEADER, id.to_owned()));
        }

        builder.json(client_payload(self, internal_detail_exposed()))
    }
}

impl From<actix_web::Error> for Error {
    fn from(err: actix_web::Error) -> Self {
        error!(error = %err, "actix error promoted to domain error");
        Error::internal(INTERNAL_MESSAGE)
    }
}
