//! Record store layer for the Firewatch emergency registry (`PostgreSQL`).
//!
//! The registry keeps one row per emergency name in the `emergencies`
//! table. This crate owns the connection pool, the schema migrations, and
//! the two keyed write operations the reconciliation engine needs:
//!
//! - keyed **upsert** (started events -- create-if-absent, else update)
//! - keyed **update-only** (extinguished events -- no-op if absent)
//!
//! Both writes are single SQL statements, so concurrent updates to the
//! same name from the two intake channels cannot lose each other's effect.
//!
//! # Modules
//!
//! - [`postgres`] -- `PostgreSQL` connection pool and configuration
//! - [`emergency_store`] -- Keyed reads and writes on the `emergencies` table
//! - [`error`] -- Shared error types

pub mod emergency_store;
pub mod error;
pub mod postgres;

// Re-export primary types for convenience.
pub use emergency_store::EmergencyStore;
pub use error::DbError;
pub use postgres::{PostgresConfig, PostgresPool};
