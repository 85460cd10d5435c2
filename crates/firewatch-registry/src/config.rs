//! Configuration types for the registry service.
//!
//! All configuration is loaded from environment variables. The registry
//! needs to know how to reach NATS and `PostgreSQL`, plus the two intake
//! subject names (overridable for test deployments).

use crate::error::RegistryError;

/// Default subject for the "emergency in progress" channel.
const DEFAULT_STARTED_SUBJECT: &str = "emergency.started";

/// Default subject for the "emergency resolved" channel.
const DEFAULT_EXTINGUISHED_SUBJECT: &str = "emergency.extinguished";

/// Default maximum number of `PostgreSQL` connections.
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;

/// Complete registry configuration loaded from the environment.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// NATS server URL (e.g. `nats://localhost:4222`).
    pub nats_url: String,
    /// `PostgreSQL` connection URL.
    pub database_url: String,
    /// Subject the started channel subscribes to.
    pub started_subject: String,
    /// Subject the extinguished channel subscribes to.
    pub extinguished_subject: String,
    /// Maximum number of connections in the `PostgreSQL` pool.
    pub db_max_connections: u32,
}

impl RegistryConfig {
    /// Load configuration from environment variables.
    ///
    /// Required variables:
    /// - `NATS_URL` -- NATS server connection string
    /// - `DATABASE_URL` -- `PostgreSQL` connection string
    ///
    /// Optional variables:
    /// - `STARTED_SUBJECT` -- started channel subject (default `emergency.started`)
    /// - `EXTINGUISHED_SUBJECT` -- extinguished channel subject (default `emergency.extinguished`)
    /// - `DB_MAX_CONNECTIONS` -- `PostgreSQL` pool size (default 5)
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Config`] if a required variable is missing
    /// or an optional one fails to parse.
    pub fn from_env() -> Result<Self, RegistryError> {
        let nats_url = env_var("NATS_URL")?;
        let database_url = env_var("DATABASE_URL")?;

        let started_subject = std::env::var("STARTED_SUBJECT")
            .unwrap_or_else(|_| DEFAULT_STARTED_SUBJECT.to_owned());
        let extinguished_subject = std::env::var("EXTINGUISHED_SUBJECT")
            .unwrap_or_else(|_| DEFAULT_EXTINGUISHED_SUBJECT.to_owned());

        let db_max_connections: u32 = std::env::var("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| DEFAULT_DB_MAX_CONNECTIONS.to_string())
            .parse()
            .map_err(|e| RegistryError::Config(format!("invalid DB_MAX_CONNECTIONS: {e}")))?;

        Ok(Self {
            nats_url,
            database_url,
            started_subject,
            extinguished_subject,
            db_max_connections,
        })
    }
}

/// Read a required environment variable.
fn env_var(name: &str) -> Result<String, RegistryError> {
    std::env::var(name)
        .map_err(|e| RegistryError::Config(format!("missing required env var {name}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subject_defaults() {
        // Direct constant checks since from_env requires real env vars.
        assert_eq!(DEFAULT_STARTED_SUBJECT, "emergency.started");
        assert_eq!(DEFAULT_EXTINGUISHED_SUBJECT, "emergency.extinguished");
    }

    #[test]
    fn pool_size_default_parses() {
        let parsed: u32 = DEFAULT_DB_MAX_CONNECTIONS.to_string().parse().unwrap_or(0);
        assert_eq!(parsed, DEFAULT_DB_MAX_CONNECTIONS);
    }
}
