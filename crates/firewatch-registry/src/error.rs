//! Error types for the registry service.
//!
//! [`RegistryError`] is the top-level error type that `main` can propagate
//! with `?`. A store failure deliberately terminates the consuming loop:
//! the base design is at-most-once, with no retry or dead-letter path.

/// Errors that can occur during registry operation.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// Configuration is invalid or missing.
    #[error("config error: {0}")]
    Config(String),

    /// Failed to connect to or communicate with the NATS server.
    #[error("NATS error: {0}")]
    Nats(String),

    /// The record store failed; the event that triggered the write is lost.
    #[error("store error: {source}")]
    Store {
        /// The underlying store error.
        #[from]
        source: firewatch_db::DbError,
    },
}
