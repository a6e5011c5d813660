//! Tests for the domain error payload.

use super::*;
use crate::domain::TraceId;
use rstest::{fixture, rstest};
use serde_json::json;

const TRACE_ID: &str = "00000000-0000-0000-0000-000000000000";

#[fixture]
fn expected_trace_id() -> String {
    TRACE_ID.to_owned()
}

#[rstest]
#[case(Error::invalid_request("bad"), ErrorCode::InvalidRequest)]
#[case(Error::unauthorized("no token"), ErrorCode::Unauthorized)]
#[case(Error::forbidden("admins only"), ErrorCode::Forbidden)]
#[case(Error::not_found("missing"), ErrorCode::NotFound)]
#[case(Error::conflict("slot already booked"), ErrorCode::Conflict)]
#[case(Error::rate_limited("slow down"), ErrorCode::RateLimited)]
#[case(Error::service_unavailable("db down"), ErrorCode::ServiceUnavailable)]
#[case(Error::internal("boom"), ErrorCode::InternalError)]
fn constructors_set_code(#[case] error: Error, #[case] code: ErrorCode) {
    assert_eq!(error.code(), code);
}

#[rstest]
fn try_new_rejects_empty_messages() {
    let result = Error::try_new(ErrorCode::InvalidRequest, "   ");
    assert!(matches!(result, Err(ErrorValidationError::EmptyMessage)));
}

#[rstest]
fn new_substitutes_blank_messages() {
    let error = Error::new(ErrorCode::NotFound, " ");
    assert_eq!(error.message(), "not found");
}

#[rstest]
fn try_with_trace_id_rejects_empty_values() {
    let result = Error::invalid_request("bad").try_with_trace_id("   ");
    assert!(matches!(result, Err(ErrorValidationError::EmptyTraceId)));
}

#[rstest]
fn new_returns_none_when_trace_id_out_of_scope() {
    assert!(Error::internal("boom").trace_id().is_none());
}

#[rstest]
#[tokio::test]
async fn new_captures_trace_id_in_scope(expected_trace_id: String) {
    let trace_id: TraceId = expected_trace_id.parse().expect("valid UUID");
    let error = TraceId::scope(trace_id, async move { Error::internal("boom") }).await;
    assert_eq!(error.trace_id(), Some(expected_trace_id.as_str()));
}

#[rstest]
#[tokio::test]
async fn deserialising_keeps_payload_trace_id(expected_trace_id: String) {
    let ambient: TraceId = "11111111-1111-1111-1111-111111111111"
        .parse()
        .expect("valid UUID");
    let payload = json!({
        "code": "not_found",
        "message": "missing",
        "traceId": expected_trace_id,
    });
    let error: Error = TraceId::scope(ambient, async move {
        serde_json::from_value(payload).expect("valid payload")
    })
    .await;
    assert_eq!(error.trace_id(), Some(TRACE_ID));
}

#[rstest]
fn serialises_camel_case_and_skips_empty_fields() {
    let error = Error::invalid_request("bad")
        .with_trace_id("abc")
        .with_details(json!({ "field": "mobile", "code": "missing_field" }));
    let value = serde_json::to_value(&error).expect("serialise error");
    assert_eq!(
        value,
        json!({
            "code": "invalid_request",
            "message": "bad",
            "traceId": "abc",
            "details": { "field": "mobile", "code": "missing_field" },
        })
    );

    let bare = serde_json::to_value(Error::not_found("missing")).expect("serialise error");
    assert!(bare.get("traceId").is_none());
    assert!(bare.get("details").is_none());
}

#[rstest]
fn deserialising_rejects_blank_message() {
    let result: Result<Error, _> =
        serde_json::from_value(json!({ "code": "conflict", "message": "  " }));
    assert!(result.is_err());
}

#[rstest]
fn redacted_keeps_code_and_trace_only(expected_trace_id: String) {
    let error = Error::internal("connection string leaked")
        .with_trace_id(expected_trace_id.clone())
        .with_details(json!({ "secret": "x" }));
    let redacted = error.redacted();
    assert_eq!(redacted.code(), ErrorCode::InternalError);
    assert_eq!(redacted.message(), "Internal server error");
    assert_eq!(redacted.trace_id(), Some(expected_trace_id.as_str()));
    assert!(redacted.details().is_none());
}
