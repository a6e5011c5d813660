//! Extractor configuration mapping Actix rejections onto the error envelope.
//!
//! Without these handlers Actix answers malformed bodies, query strings, and
//! paths with plain-text responses. Registering them keeps every failure in
//! the `{code, message, traceId, details}` shape.

use actix_web::error::{JsonPayloadError, PathError, QueryPayloadError};
use actix_web::{HttpRequest, HttpResponse, ResponseError, web};
use serde_json::json;

use crate::domain::Error;

/// JSON body extractor config with the given byte limit.
pub fn json_config(limit: usize) -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(limit)
        .error_handler(|err, _req| json_error(&err).into())
}

/// Query string extractor config.
pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| query_error(&err).into())
}

/// Path segment extractor config.
pub fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err, _req| path_error(&err).into())
}

fn json_error(err: &JsonPayloadError) -> Error {
    match err {
        JsonPayloadError::Overflow { limit } | JsonPayloadError::OverflowKnownLength { limit, .. } => {
            Error::invalid_request(format!("request body exceeds {limit} bytes"))
                .with_details(json!({ "field": "body", "code": "body_too_large" }))
        }
        JsonPayloadError::ContentType => Error::invalid_request("expected application/json body")
            .with_details(json!({ "field": "body", "code": "unsupported_media_type" })),
        other => Error::invalid_request(format!("malformed JSON body: {other}"))
            .with_details(json!({ "field": "body", "code": "malformed_json" })),
    }
}

fn query_error(err: &QueryPayloadError) -> Error {
    Error::invalid_request(format!("invalid query string: {err}"))
        .with_details(json!({ "field": "query", "code": "invalid_query" }))
}

fn path_error(err: &PathError) -> Error {
    Error::invalid_request(format!("invalid path parameter: {err}"))
        .with_details(json!({ "field": "path", "code": "invalid_path" }))
}

/// Fallback for unmatched routes.
pub async fn route_not_found(req: HttpRequest) -> HttpResponse {
    Error::not_found(format!("no route for {} {}", req.method(), req.path())).error_response()
}
