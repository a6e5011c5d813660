//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL-backed repositories using Diesel ORM
//! - **security**: JWT bearer tokens and Argon2id password hashing
//! - **storage**: capability-scoped filesystem store for uploads
//!
//! Adapters are thin translators that convert between domain types and
//! infrastructure-specific representations. They contain no business logic.

pub mod persistence;
pub mod security;
pub mod storage;
