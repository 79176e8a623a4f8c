//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Each repository implements one domain port over a shared [`DbPool`] of
//! `diesel-async` connections. Row structs (`models.rs`) and the table
//! definitions (`schema.rs`) stay private to this module; adapters convert
//! rows into validated domain types and map driver failures into the port's
//! error enum.
//!
//! Multi-statement writes run inside one transaction and lock the rows they
//! check, so invariants such as "at least one admin" and "room is empty
//! before delete" hold under concurrent requests.
//!
//! # Example
//!
//! ```no_run
//! use fixtrack::outbound::persistence::{DbPool, DieselUserRepository, PoolConfig};
//!
//! # async fn connect() -> Result<(), fixtrack::outbound::persistence::PoolError> {
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/fixtrack")).await?;
//! let users = DieselUserRepository::new(pool);
//! # let _ = users;
//! # Ok(())
//! # }
//! ```

mod diesel_billing_period_repository;
mod diesel_bootstrap_repository;
pub(crate) mod diesel_helpers;
mod diesel_item_repository;
mod diesel_room_repository;
mod diesel_settings_repository;
mod diesel_stroke_repository;
mod diesel_user_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_billing_period_repository::DieselBillingPeriodRepository;
pub use diesel_bootstrap_repository::DieselBootstrapRepository;
pub use diesel_item_repository::DieselItemRepository;
pub use diesel_room_repository::DieselRoomRepository;
pub use diesel_settings_repository::DieselSettingsRepository;
pub use diesel_stroke_repository::DieselStrokeRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use migrations::{MIGRATIONS, MigrationError, run_migrations};
pub use pool::{DEFAULT_POOL_MAX_SIZE, DbPool, PoolConfig, PoolError};
