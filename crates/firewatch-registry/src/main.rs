//! Registry service entry point.
//!
//! The registry consumes two independent event streams -- emergencies
//! starting and emergencies being extinguished -- and reconciles them
//! into one persisted record per emergency name.
//!
//! # Architecture
//!
//! ```text
//! NATS (emergency.started) ------+
//!                                +--> decode --> Reconciler --> PostgreSQL
//! NATS (emergency.extinguished) -+
//! ```
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from environment variables
//! 3. Connect to `PostgreSQL` and run migrations
//! 4. Connect to NATS and subscribe to both intake subjects
//! 5. Drive the two channel loops until a store failure or a shutdown
//!    signal, then close the connections

mod config;
mod error;
mod intake;
mod reconcile;

use firewatch_db::{EmergencyStore, PostgresConfig, PostgresPool};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::RegistryConfig;
use crate::intake::{ChannelKind, IntakeClient, run_channel};
use crate::reconcile::Reconciler;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if initialization fails or a channel loop dies on a
/// store failure. A decode failure never reaches here -- malformed
/// messages are dropped inside the channel loop.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("firewatch-registry starting");

    // 2. Load configuration from environment.
    let config = RegistryConfig::from_env()?;
    info!(
        nats_url = config.nats_url,
        started_subject = config.started_subject,
        extinguished_subject = config.extinguished_subject,
        db_max_connections = config.db_max_connections,
        "configuration loaded"
    );

    // 3. Connect to PostgreSQL and provision the schema.
    let pg_config =
        PostgresConfig::new(&config.database_url).with_max_connections(config.db_max_connections);
    let pool = PostgresPool::connect(&pg_config).await?;
    pool.run_migrations().await?;

    let store = EmergencyStore::new(pool.pool().clone());
    let reconciler = Reconciler::new(store);

    // 4. Connect to NATS and subscribe to both intake subjects.
    let intake = IntakeClient::connect(&config.nats_url).await?;
    let started_sub = intake.subscribe(&config.started_subject).await?;
    let extinguished_sub = intake.subscribe(&config.extinguished_subject).await?;

    info!("registry initialized, consuming intake channels");

    // 5. Drive both channel loops concurrently. Either loop ending on a
    //    store failure terminates the service (no retry in the base
    //    design); a shutdown signal cancels both loops.
    let result = {
        let started_loop = run_channel(started_sub, ChannelKind::Started, &reconciler);
        let extinguished_loop =
            run_channel(extinguished_sub, ChannelKind::Extinguished, &reconciler);

        tokio::select! {
            result = started_loop => result,
            result = extinguished_loop => result,
            signal = tokio::signal::ctrl_c() => {
                signal?;
                info!("shutdown signal received");
                Ok(())
            }
        }
    };

    // Flush the NATS connection and close the pool before reporting the
    // loop outcome.
    intake.flush().await?;
    pool.close().await;

    result?;
    info!("firewatch-registry stopped");
    Ok(())
}
