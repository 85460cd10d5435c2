//! The reconciliation engine: applies one typed event to the record store.
//!
//! The two event kinds get deliberately different treatment:
//!
//! - started events are an **upsert**: a previously unseen name creates a
//!   record, a known name is forced back to in-progress with its
//!   attributes shallow-merged.
//! - extinguished events are **update-only**: a known name has its status
//!   flipped, an unknown name is silently dropped. No record is ever
//!   created from an extinguish event.
//!
//! This asymmetry matches the observed behavior of the upstream producers
//! and must be preserved; whether extinguish-before-start data loss is
//! intentional is a stakeholder question, not something this engine
//! second-guesses. Both operations are idempotent under redelivery, and
//! there is no transition validation: an extinguished record receiving a
//! started event revives to in-progress.

use firewatch_db::{DbError, EmergencyStore};
use firewatch_types::{Attributes, EmergencyEvent};
use tracing::{debug, info};

/// The record store capability the engine consumes.
///
/// The production implementation is [`EmergencyStore`] over `PostgreSQL`;
/// tests use an in-process map. Implementations must make each per-key
/// operation atomic (a single read-modify-write), which is the engine's
/// only concurrency-correctness requirement.
pub trait RecordStore {
    /// Keyed upsert: create the record as in-progress if absent, else
    /// overwrite its status and shallow-merge `attributes` (event fields
    /// win, untouched existing fields survive).
    fn upsert_started(
        &self,
        name: &str,
        attributes: &Attributes,
    ) -> impl Future<Output = Result<(), DbError>> + Send;

    /// Keyed update-only: set the record's status to extinguished if it
    /// exists, leaving attributes untouched. Returns `false` (and changes
    /// nothing) if no record for `name` exists.
    fn mark_extinguished(&self, name: &str) -> impl Future<Output = Result<bool, DbError>> + Send;
}

impl RecordStore for EmergencyStore {
    async fn upsert_started(&self, name: &str, attributes: &Attributes) -> Result<(), DbError> {
        Self::upsert_started(self, name, attributes).await
    }

    async fn mark_extinguished(&self, name: &str) -> Result<bool, DbError> {
        Self::mark_extinguished(self, name).await
    }
}

/// Applies typed events to the record store, one at a time.
///
/// Holds the injected store instance; there is no ambient global state.
/// Cheap to clone when the store is.
#[derive(Debug, Clone)]
pub struct Reconciler<S> {
    store: S,
}

impl<S: RecordStore> Reconciler<S> {
    /// Create a reconciler over the given store.
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// Apply a single event, dispatching per event kind.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the store write fails. The caller does not
    /// retry: the triggering message was already consumed, so the event
    /// is lost (at-most-once contract).
    pub async fn apply(&self, event: &EmergencyEvent) -> Result<(), DbError> {
        match event {
            EmergencyEvent::Started { name, attributes } => {
                self.store.upsert_started(name, attributes).await?;
                info!(name, "registered in-progress emergency");
            }
            EmergencyEvent::Extinguished { name } => {
                if self.store.mark_extinguished(name).await? {
                    info!(name, "emergency extinguished");
                } else {
                    // Update-only: an extinguish for an unknown name is
                    // dropped without creating a record or signaling an
                    // error.
                    debug!(name, "extinguish for unknown emergency, dropped");
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use firewatch_types::{EmergencyRecord, EmergencyStatus};
    use serde_json::json;
    use tokio::sync::Mutex;

    use super::*;

    /// In-process record store with the same merge semantics as the
    /// `PostgreSQL` implementation.
    #[derive(Debug, Clone, Default)]
    struct MemoryStore {
        records: Arc<Mutex<BTreeMap<String, EmergencyRecord>>>,
    }

    impl MemoryStore {
        async fn get(&self, name: &str) -> Option<EmergencyRecord> {
            self.records.lock().await.get(name).cloned()
        }

        async fn len(&self) -> usize {
            self.records.lock().await.len()
        }
    }

    impl RecordStore for MemoryStore {
        async fn upsert_started(&self, name: &str, attributes: &Attributes) -> Result<(), DbError> {
            let mut records = self.records.lock().await;
            if let Some(record) = records.get_mut(name) {
                record.status = EmergencyStatus::InProgress;
                for (key, value) in attributes {
                    record.attributes.insert(key.clone(), value.clone());
                }
            } else {
                records.insert(
                    name.to_owned(),
                    EmergencyRecord::started(name.to_owned(), attributes.clone()),
                );
            }
            Ok(())
        }

        async fn mark_extinguished(&self, name: &str) -> Result<bool, DbError> {
            let mut records = self.records.lock().await;
            records.get_mut(name).map_or(Ok(false), |record| {
                record.status = EmergencyStatus::Extinguished;
                Ok(true)
            })
        }
    }

    fn attrs(pairs: &[(&str, serde_json::Value)]) -> Attributes {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), v.clone()))
            .collect()
    }

    fn started(name: &str, attributes: Attributes) -> EmergencyEvent {
        EmergencyEvent::Started {
            name: name.to_owned(),
            attributes,
        }
    }

    fn extinguished(name: &str) -> EmergencyEvent {
        EmergencyEvent::Extinguished {
            name: name.to_owned(),
        }
    }

    #[tokio::test]
    async fn started_creates_in_progress_record() {
        let store = MemoryStore::default();
        let reconciler = Reconciler::new(store.clone());

        reconciler
            .apply(&started("Fire-12", attrs(&[("zone", json!("North"))])))
            .await
            .unwrap();

        let record = store.get("Fire-12").await.unwrap();
        assert_eq!(record.status, EmergencyStatus::InProgress);
        assert_eq!(record.attributes, attrs(&[("zone", json!("North"))]));
    }

    #[tokio::test]
    async fn extinguish_before_start_leaves_store_empty() {
        let store = MemoryStore::default();
        let reconciler = Reconciler::new(store.clone());

        reconciler.apply(&extinguished("Fire-99")).await.unwrap();

        assert_eq!(store.len().await, 0, "extinguish must never create a record");
    }

    #[tokio::test]
    async fn started_is_idempotent() {
        let store = MemoryStore::default();
        let reconciler = Reconciler::new(store.clone());
        let event = started("Fire-1", attrs(&[("zone", json!("East"))]));

        reconciler.apply(&event).await.unwrap();
        let once = store.get("Fire-1").await;
        reconciler.apply(&event).await.unwrap();
        let twice = store.get("Fire-1").await;

        assert_eq!(once, twice);
    }

    #[tokio::test]
    async fn extinguish_is_idempotent() {
        let store = MemoryStore::default();
        let reconciler = Reconciler::new(store.clone());

        reconciler
            .apply(&started("Fire-2", Attributes::new()))
            .await
            .unwrap();
        reconciler.apply(&extinguished("Fire-2")).await.unwrap();
        let once = store.get("Fire-2").await;
        reconciler.apply(&extinguished("Fire-2")).await.unwrap();
        let twice = store.get("Fire-2").await;

        assert_eq!(once, twice);
        assert_eq!(twice.unwrap().status, EmergencyStatus::Extinguished);
    }

    #[tokio::test]
    async fn started_then_extinguished_preserves_attributes() {
        let store = MemoryStore::default();
        let reconciler = Reconciler::new(store.clone());

        reconciler
            .apply(&started("Fire-12", attrs(&[("zone", json!("North"))])))
            .await
            .unwrap();
        reconciler.apply(&extinguished("Fire-12")).await.unwrap();

        let record = store.get("Fire-12").await.unwrap();
        assert_eq!(record.status, EmergencyStatus::Extinguished);
        assert_eq!(record.attributes, attrs(&[("zone", json!("North"))]));
    }

    #[tokio::test]
    async fn reverse_order_yields_no_record_then_fresh_record() {
        let store = MemoryStore::default();
        let reconciler = Reconciler::new(store.clone());

        // The extinguish arrives first and is dropped entirely.
        reconciler.apply(&extinguished("Fire-7")).await.unwrap();
        assert!(store.get("Fire-7").await.is_none());

        // The late start then creates a fresh in-progress record.
        reconciler
            .apply(&started("Fire-7", Attributes::new()))
            .await
            .unwrap();
        let record = store.get("Fire-7").await.unwrap();
        assert_eq!(record.status, EmergencyStatus::InProgress);
    }

    #[tokio::test]
    async fn later_started_fields_win_shallow_merge() {
        let store = MemoryStore::default();
        let reconciler = Reconciler::new(store.clone());

        reconciler
            .apply(&started(
                "Fire-3",
                attrs(&[("zone", json!("North")), ("magnitude", json!(3))]),
            ))
            .await
            .unwrap();
        reconciler
            .apply(&started("Fire-3", attrs(&[("magnitude", json!(5))])))
            .await
            .unwrap();

        let record = store.get("Fire-3").await.unwrap();
        assert_eq!(
            record.attributes,
            attrs(&[("magnitude", json!(5)), ("zone", json!("North"))])
        );
    }

    #[tokio::test]
    async fn started_revives_extinguished_record() {
        let store = MemoryStore::default();
        let reconciler = Reconciler::new(store.clone());

        reconciler
            .apply(&started("Fire-4", Attributes::new()))
            .await
            .unwrap();
        reconciler.apply(&extinguished("Fire-4")).await.unwrap();
        reconciler
            .apply(&started("Fire-4", Attributes::new()))
            .await
            .unwrap();

        let record = store.get("Fire-4").await.unwrap();
        assert_eq!(record.status, EmergencyStatus::InProgress);
    }

    #[tokio::test]
    async fn concurrent_names_do_not_cross_contaminate() {
        let store = MemoryStore::default();
        let reconciler = Reconciler::new(store.clone());

        reconciler
            .apply(&started("Fire-a", attrs(&[("zone", json!("A"))])))
            .await
            .unwrap();

        // Drive both channels' events concurrently against distinct names.
        let event_a = extinguished("Fire-a");
        let event_b = started("Fire-b", attrs(&[("zone", json!("B"))]));
        let (left, right) = tokio::join!(
            reconciler.apply(&event_a),
            reconciler.apply(&event_b),
        );
        left.unwrap();
        right.unwrap();

        let record_a = store.get("Fire-a").await.unwrap();
        let record_b = store.get("Fire-b").await.unwrap();
        assert_eq!(record_a.status, EmergencyStatus::Extinguished);
        assert_eq!(record_a.attributes, attrs(&[("zone", json!("A"))]));
        assert_eq!(record_b.status, EmergencyStatus::InProgress);
        assert_eq!(record_b.attributes, attrs(&[("zone", json!("B"))]));
    }
}
