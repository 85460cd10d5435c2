//! Transient events consumed from the two intake channels.
//!
//! An event is created by an upstream producer, consumed once by the
//! reconciliation engine, and discarded -- it leaves no trace except its
//! effect on the [`EmergencyRecord`](crate::record::EmergencyRecord).

use serde::{Deserialize, Serialize};

use crate::record::Attributes;

/// A typed event decoded from one of the two intake channels.
///
/// The two variants carry different information on purpose: an
/// extinguished payload only needs to identify the emergency, while a
/// started payload carries the full attribute set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EmergencyEvent {
    /// An emergency began, or was updated while ongoing.
    Started {
        /// Natural key of the emergency.
        name: String,
        /// Every payload field other than `name`, carried verbatim.
        attributes: Attributes,
    },
    /// An emergency was resolved.
    Extinguished {
        /// Natural key of the emergency.
        name: String,
    },
}

impl EmergencyEvent {
    /// The name of the emergency this event applies to.
    pub fn name(&self) -> &str {
        match self {
            Self::Started { name, .. } | Self::Extinguished { name } => name,
        }
    }
}
