//! Shared type definitions for the Firewatch emergency registry.
//!
//! This crate is the single source of truth for the types that flow between
//! the intake adapter, the reconciliation engine, and the record store.
//!
//! # Modules
//!
//! - [`record`] -- The persisted per-name emergency record and its status
//! - [`event`] -- The transient events consumed from the two intake channels

pub mod event;
pub mod record;

// Re-export primary types at crate root for convenience.
pub use event::EmergencyEvent;
pub use record::{Attributes, EmergencyRecord, EmergencyStatus};
