//! Shared validation helpers for inbound HTTP adapters.
//!
//! Every validation failure becomes `invalid_request` with a details object
//! of the form `{ "field": ..., "code": ..., "value"?: ... }`.

use std::str::FromStr;

use pagination::{PageParams, PageRequest, PaginationError};
use serde_json::json;

use crate::domain::{
    AccountValidationError, ConsultationValidationError, CredentialValidationError, Error,
    PetValidationError, SlotValidationError,
};

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    MissingField,
    InvalidUuid,
    InvalidValue,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            ErrorCode::MissingField => "missing_field",
            ErrorCode::InvalidUuid => "invalid_uuid",
            ErrorCode::InvalidValue => "invalid_value",
        }
    }
}

/// Newtype wrapper for HTTP field names to provide type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(&self) -> &str {
        self.0
    }
}

/// Builder for validation errors with field context.
struct ValidationError {
    field: String,
    message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    fn with_code(self, code: &str) -> Error {
        Error::invalid_request(self.message).with_details(json!({
            "field": self.field,
            "code": code,
        }))
    }

    fn with_value(self, code: &str, value: impl Into<String>) -> Error {
        Error::invalid_request(self.message).with_details(json!({
            "field": self.field,
            "value": value.into(),
            "code": code,
        }))
    }
}

pub(crate) fn missing_field_error(field: FieldName) -> Error {
    let field = field.as_str();
    ValidationError::new(field, format!("missing required field: {field}"))
        .with_code(ErrorCode::MissingField.as_str())
}

pub(crate) fn invalid_value_error(field: FieldName, message: &str, value: &str) -> Error {
    ValidationError::new(field.as_str(), message).with_value(ErrorCode::InvalidValue.as_str(), value)
}

pub(crate) fn invalid_uuid_error(field: FieldName, value: &str) -> Error {
    let field = field.as_str();
    ValidationError::new(field, format!("{field} must be a valid UUID"))
        .with_value(ErrorCode::InvalidUuid.as_str(), value)
}

/// Require an optional request field.
pub(crate) fn require<T>(value: Option<T>, field: FieldName) -> Result<T, Error> {
    value.ok_or_else(|| missing_field_error(field))
}

/// Parse one of the UUID-backed identifiers.
pub(crate) fn parse_id<T>(value: &str, field: FieldName) -> Result<T, Error>
where
    T: FromStr,
{
    T::from_str(value).map_err(|_| invalid_uuid_error(field, value))
}

pub(crate) fn account_error(err: AccountValidationError) -> Error {
    ValidationError::new(err.field(), err.to_string()).with_code(err.code())
}

pub(crate) fn credential_error(err: CredentialValidationError) -> Error {
    ValidationError::new(err.field(), err.to_string()).with_code(err.code())
}

pub(crate) fn pet_error(err: PetValidationError) -> Error {
    ValidationError::new(err.field(), err.to_string()).with_code(err.code())
}

pub(crate) fn slot_error(err: SlotValidationError) -> Error {
    let code = match err {
        SlotValidationError::InvalidDate { .. } => "invalid_date",
        SlotValidationError::InvalidTime { .. } => "invalid_time_slot",
    };
    let value = err.value().to_owned();
    ValidationError::new(err.field(), err.to_string()).with_value(code, value)
}

pub(crate) fn description_error(err: ConsultationValidationError) -> Error {
    let code = match err {
        ConsultationValidationError::EmptyDescription => ErrorCode::MissingField.as_str(),
        ConsultationValidationError::DescriptionTooLong { .. } => "too_long",
    };
    ValidationError::new("description", err.to_string()).with_code(code)
}

fn pagination_error(err: PaginationError) -> Error {
    let field = match err {
        PaginationError::ZeroPage => "page",
        PaginationError::ZeroLimit => "limit",
    };
    ValidationError::new(field, err.to_string()).with_code("out_of_range")
}

/// Validate raw `page`/`limit` query parameters.
pub(crate) fn page_request(params: PageParams) -> Result<PageRequest, Error> {
    PageRequest::try_from(params).map_err(pagination_error)
}
