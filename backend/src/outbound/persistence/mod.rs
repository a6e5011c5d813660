//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the domain repository ports backed by
//! PostgreSQL through `diesel-async` and a `bb8` connection pool.
//!
//! - **Thin adapters**: repositories only translate between Diesel rows and
//!   domain types. Business rules live in the domain services.
//! - **Internal models**: row structs (`models.rs`) and the table definitions
//!   (`schema.rs`) never leave this module.
//! - **Store-level arbitration**: slot reservations and mobile uniqueness are
//!   decided by unique constraints, not by application checks.
//!
//! # Example
//!
//! ```ignore
//! use vetconsult::outbound::persistence::{DbPool, DieselSlotRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/vetconsult")).await?;
//! let slots = DieselSlotRepository::new(pool);
//! ```

mod diesel_account_repository;
mod diesel_admin_repository;
mod diesel_basic_error_mapping;
mod diesel_consultation_repository;
mod diesel_pet_repository;
mod diesel_slot_repository;
mod migrations;
mod models;
mod pool;
mod row_conversions;
mod schema;

pub use diesel_account_repository::DieselAccountRepository;
pub use diesel_admin_repository::DieselAdminRepository;
pub use diesel_consultation_repository::DieselConsultationRepository;
pub use diesel_pet_repository::DieselPetRepository;
pub use diesel_slot_repository::DieselSlotRepository;
pub use migrations::{MigrationError, run_pending_migrations};
pub use pool::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_MAX_CONNECTIONS, DbPool, PoolConfig, PoolError};
