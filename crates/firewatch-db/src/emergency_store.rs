//! Keyed reads and writes on the `emergencies` table.
//!
//! One row per emergency name. The two write paths mirror the two event
//! kinds the registry consumes:
//!
//! - [`EmergencyStore::upsert_started`] -- create-if-absent, else force the
//!   status back to `in_progress` and shallow-merge the new attributes.
//! - [`EmergencyStore::mark_extinguished`] -- flip the status if the row
//!   exists; silently do nothing if it does not. This asymmetry is the
//!   observed contract of the registry, not an accident: an extinguish
//!   event must never create an orphan record.
//!
//! Each write is a single statement, so the per-name read-modify-write is
//! atomic and concurrent writers cannot lose updates.

use firewatch_types::{Attributes, EmergencyRecord, EmergencyStatus};
use sqlx::PgPool;

use crate::error::DbError;

/// Operations on the `emergencies` table.
///
/// Cheap to clone; holds a handle to the shared connection pool.
#[derive(Clone)]
pub struct EmergencyStore {
    pool: PgPool,
}

/// Raw row shape fetched from the `emergencies` table.
#[derive(Debug, sqlx::FromRow)]
struct EmergencyRow {
    name: String,
    status: String,
    attributes: serde_json::Value,
}

impl TryFrom<EmergencyRow> for EmergencyRecord {
    type Error = DbError;

    fn try_from(row: EmergencyRow) -> Result<Self, DbError> {
        let status = EmergencyStatus::parse(&row.status).ok_or_else(|| DbError::Corrupt {
            name: row.name.clone(),
            reason: format!("unknown status {:?}", row.status),
        })?;
        let attributes: Attributes = match row.attributes {
            serde_json::Value::Object(map) => map,
            other => {
                return Err(DbError::Corrupt {
                    name: row.name,
                    reason: format!("attributes is not a JSON object: {other}"),
                });
            }
        };
        Ok(Self {
            name: row.name,
            status,
            attributes,
        })
    }
}

impl EmergencyStore {
    /// Create a new store bound to a connection pool.
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply a started event: insert the record as `in_progress`, or if a
    /// row for this name already exists, overwrite its status and merge
    /// the attributes field-by-field (new fields win, untouched existing
    /// fields survive).
    ///
    /// JSONB `||` is a shallow merge, which is exactly the contract:
    /// later started events replace whole top-level fields, never deep
    /// structures inside them.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the write fails.
    pub async fn upsert_started(
        &self,
        name: &str,
        attributes: &Attributes,
    ) -> Result<(), DbError> {
        sqlx::query(
            r"INSERT INTO emergencies (name, status, attributes)
              VALUES ($1, $2, $3)
              ON CONFLICT (name) DO UPDATE SET
                status = EXCLUDED.status,
                attributes = emergencies.attributes || EXCLUDED.attributes",
        )
        .bind(name)
        .bind(EmergencyStatus::InProgress.as_str())
        .bind(serde_json::Value::Object(attributes.clone()))
        .execute(&self.pool)
        .await?;

        tracing::debug!(name, "Upserted in-progress emergency");
        Ok(())
    }

    /// Apply an extinguished event: set the status to `extinguished` if
    /// the row exists, leaving every attribute untouched.
    ///
    /// Returns `true` if a row was updated, `false` if no record for this
    /// name exists. The absent case is a no-op, never an insert.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the write fails.
    pub async fn mark_extinguished(&self, name: &str) -> Result<bool, DbError> {
        let result = sqlx::query(
            r"UPDATE emergencies
              SET status = $2
              WHERE name = $1",
        )
        .bind(name)
        .bind(EmergencyStatus::Extinguished.as_str())
        .execute(&self.pool)
        .await?;

        let updated = result.rows_affected() > 0;
        tracing::debug!(name, updated, "Marked emergency extinguished");
        Ok(updated)
    }

    /// Fetch the record for a single name.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails, or
    /// [`DbError::Corrupt`] if the stored row cannot be mapped back.
    pub async fn get(&self, name: &str) -> Result<Option<EmergencyRecord>, DbError> {
        let row = sqlx::query_as::<_, EmergencyRow>(
            r"SELECT name, status, attributes
              FROM emergencies
              WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        row.map(EmergencyRecord::try_from).transpose()
    }

    /// Fetch all records, ordered by name.
    ///
    /// Read path used by operators and tests; the registry's other
    /// consumers read the same table.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails, or
    /// [`DbError::Corrupt`] if a stored row cannot be mapped back.
    pub async fn list(&self) -> Result<Vec<EmergencyRecord>, DbError> {
        let rows = sqlx::query_as::<_, EmergencyRow>(
            r"SELECT name, status, attributes
              FROM emergencies
              ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(EmergencyRecord::try_from).collect()
    }

    /// Delete the record for a single name. Test cleanup helper.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the delete fails.
    pub async fn delete(&self, name: &str) -> Result<(), DbError> {
        sqlx::query(r"DELETE FROM emergencies WHERE name = $1")
            .bind(name)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

impl std::fmt::Debug for EmergencyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmergencyStore").finish_non_exhaustive()
    }
}
