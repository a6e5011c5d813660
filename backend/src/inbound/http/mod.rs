//! HTTP inbound adapter exposing REST endpoints.

pub mod accounts;
pub mod admin;
pub mod admin_dto;
pub mod appointments;
pub mod auth;
pub mod consultation_form;
pub mod consultations;
pub mod dto;
pub mod error;
pub mod extractor_config;
pub mod health;
pub mod pets;
pub mod schemas;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod validation;

pub use error::ApiResult;
