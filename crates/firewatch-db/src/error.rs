//! Error types for the record store layer.
//!
//! All errors are propagated via [`DbError`], which wraps the underlying
//! [`sqlx`] errors with context about which operation failed. A store
//! failure is the registry's `StoreUnavailable` condition: the base design
//! does not retry it, so callers let it surface.

/// Errors that can occur in the record store layer.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A `PostgreSQL` operation failed.
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    /// A `PostgreSQL` migration failed.
    #[error("PostgreSQL migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A stored row could not be mapped back to an emergency record.
    #[error("corrupt record for {name}: {reason}")]
    Corrupt {
        /// The record's natural key.
        name: String,
        /// What about the row was unreadable.
        reason: String,
    },

    /// A configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}
