//! The persisted emergency record and its status enumeration.
//!
//! A record is keyed by `name` (a natural key, not a generated id) and
//! carries only the fields the most recently applied event set on it. The
//! base model deliberately has no version counter, timestamp, or secondary
//! index.

use serde::{Deserialize, Serialize};

/// Open mapping of additional fields carried verbatim from the originating
/// started payload (everything except `name`).
pub type Attributes = serde_json::Map<String, serde_json::Value>;

/// Lifecycle status of an emergency.
///
/// Two values, no transition validation: a started event applied to an
/// extinguished record revives it to [`EmergencyStatus::InProgress`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmergencyStatus {
    /// The emergency is being responded to.
    InProgress,
    /// The emergency has been resolved.
    Extinguished,
}

impl EmergencyStatus {
    /// The string stored in the record store's `status` column.
    ///
    /// Matches the serde wire encoding so stored rows and published
    /// payloads agree.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InProgress => "in_progress",
            Self::Extinguished => "extinguished",
        }
    }

    /// Parse a stored status string back into the enum.
    ///
    /// Returns `None` for anything other than the two known encodings.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "in_progress" => Some(Self::InProgress),
            "extinguished" => Some(Self::Extinguished),
            _ => None,
        }
    }
}

/// The persisted, per-name state tracked by the registry.
///
/// Invariant: at most one record exists per `name` at any time. The record
/// reflects only the most recently applied event's effect on each field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyRecord {
    /// Unique identifier (natural key).
    pub name: String,
    /// Current lifecycle status.
    pub status: EmergencyStatus,
    /// Additional fields from the most recent started payload. Extinguish
    /// events never touch these.
    #[serde(default)]
    pub attributes: Attributes,
}

impl EmergencyRecord {
    /// Create a fresh in-progress record, as produced by a started event
    /// for a previously unseen name.
    pub const fn started(name: String, attributes: Attributes) -> Self {
        Self {
            name,
            status: EmergencyStatus::InProgress,
            attributes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_str() {
        for status in [EmergencyStatus::InProgress, EmergencyStatus::Extinguished] {
            assert_eq!(EmergencyStatus::parse(status.as_str()), Some(status));
        }
    }

    #[test]
    fn status_parse_rejects_unknown() {
        assert_eq!(EmergencyStatus::parse("on_fire"), None);
        assert_eq!(EmergencyStatus::parse(""), None);
    }

    #[test]
    fn status_serde_encoding_matches_as_str() {
        let json = serde_json::to_string(&EmergencyStatus::InProgress).unwrap_or_default();
        assert_eq!(json, "\"in_progress\"");
        let json = serde_json::to_string(&EmergencyStatus::Extinguished).unwrap_or_default();
        assert_eq!(json, "\"extinguished\"");
    }

    #[test]
    fn record_serializes_with_flat_shape() {
        let mut attributes = Attributes::new();
        attributes.insert("zone".to_owned(), serde_json::json!("North"));
        let record = EmergencyRecord::started("Fire-12".to_owned(), attributes);

        let value = serde_json::to_value(&record).unwrap_or_default();
        assert_eq!(value["name"], "Fire-12");
        assert_eq!(value["status"], "in_progress");
        assert_eq!(value["attributes"]["zone"], "North");
    }
}
