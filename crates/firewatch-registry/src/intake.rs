//! NATS intake adapter: bridges the two raw message channels to typed
//! events and drives them through the reconciler.
//!
//! The registry listens on two independent subjects, by default
//! `emergency.started` and `emergency.extinguished`. No ordering exists
//! between the two channels and none is assumed; within one channel,
//! messages are processed one at a time in delivery order.
//!
//! Core NATS delivery is fire-and-forget: a message is consumed the
//! moment it is delivered, regardless of what decoding or reconciliation
//! do with it afterwards. That gives the registry its at-most-once
//! contract -- a malformed payload or a store failure after delivery
//! means the event is gone. Decode failures are logged and skipped;
//! store failures end the channel loop.

use firewatch_types::EmergencyEvent;
use futures::StreamExt;
use tracing::{debug, info, warn};

use crate::error::RegistryError;
use crate::reconcile::{Reconciler, RecordStore};

/// Which logical channel a raw message arrived on.
///
/// The channel, not the payload, decides which event kind to decode --
/// the two payload shapes are not self-describing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    /// The "emergency in progress" channel.
    Started,
    /// The "emergency resolved" channel.
    Extinguished,
}

impl ChannelKind {
    /// Lowercase label used in log fields.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::Extinguished => "extinguished",
        }
    }

    /// Decode a raw payload into the typed event for this channel.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] if the payload is malformed.
    pub fn decode(self, raw: &[u8]) -> Result<EmergencyEvent, DecodeError> {
        match self {
            Self::Started => decode_started(raw),
            Self::Extinguished => decode_extinguished(raw),
        }
    }
}

/// A raw payload could not be decoded into a typed event.
///
/// Decode failures are terminal for the message: it was already consumed,
/// so it is dropped without retry and without touching the store.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The payload is not valid JSON.
    #[error("payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The payload parsed, but is not a JSON object.
    #[error("payload is not a JSON object")]
    NotObject,

    /// The payload object has no string `name` field.
    #[error("payload has no string \"name\" field")]
    MissingName,
}

/// Decode a started payload: `{"name": <string>, ...other fields}`.
///
/// Every field other than `name` is carried verbatim into the event's
/// attributes; the payload is otherwise not validated.
///
/// # Errors
///
/// Returns [`DecodeError`] if the payload is malformed.
pub fn decode_started(raw: &[u8]) -> Result<EmergencyEvent, DecodeError> {
    let mut payload = parse_object(raw)?;
    let name = take_name(&mut payload)?;
    Ok(EmergencyEvent::Started {
        name,
        attributes: payload,
    })
}

/// Decode an extinguished payload: only the `name` field is read.
///
/// # Errors
///
/// Returns [`DecodeError`] if the payload is malformed.
pub fn decode_extinguished(raw: &[u8]) -> Result<EmergencyEvent, DecodeError> {
    let mut payload = parse_object(raw)?;
    let name = take_name(&mut payload)?;
    Ok(EmergencyEvent::Extinguished { name })
}

/// Parse raw bytes as a JSON object.
fn parse_object(raw: &[u8]) -> Result<serde_json::Map<String, serde_json::Value>, DecodeError> {
    match serde_json::from_slice(raw)? {
        serde_json::Value::Object(map) => Ok(map),
        _ => Err(DecodeError::NotObject),
    }
}

/// Remove and return the `name` field, which must be a string.
fn take_name(
    payload: &mut serde_json::Map<String, serde_json::Value>,
) -> Result<String, DecodeError> {
    match payload.remove("name") {
        Some(serde_json::Value::String(name)) => Ok(name),
        _ => Err(DecodeError::MissingName),
    }
}

/// NATS client wrapper for the intake adapter.
///
/// Owns a single connection, constructed at startup and injected into the
/// channel loops -- connections are never ambient globals.
pub struct IntakeClient {
    client: async_nats::Client,
}

impl IntakeClient {
    /// Connect to a NATS server.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Nats`] if the connection cannot be
    /// established.
    pub async fn connect(url: &str) -> Result<Self, RegistryError> {
        info!(url, "connecting to NATS server");
        let client = async_nats::connect(url)
            .await
            .map_err(|e| RegistryError::Nats(format!("failed to connect to {url}: {e}")))?;
        info!("NATS connection established");
        Ok(Self { client })
    }

    /// Subscribe to one intake subject.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Nats`] if the subscription fails.
    pub async fn subscribe(&self, subject: &str) -> Result<async_nats::Subscriber, RegistryError> {
        debug!(subject, "subscribing to intake subject");
        let subscriber = self
            .client
            .subscribe(subject.to_owned())
            .await
            .map_err(|e| RegistryError::Nats(format!("failed to subscribe to {subject}: {e}")))?;
        info!(subject, "subscribed");
        Ok(subscriber)
    }

    /// Flush pending protocol messages before shutdown.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Nats`] if the flush fails.
    pub async fn flush(&self) -> Result<(), RegistryError> {
        self.client
            .flush()
            .await
            .map_err(|e| RegistryError::Nats(format!("flush failed: {e}")))
    }
}

impl std::fmt::Debug for IntakeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntakeClient").finish_non_exhaustive()
    }
}

/// Drive one channel: decode each delivered message and apply it.
///
/// Runs until the subscription ends or the store fails. A decode failure
/// drops the message and continues; a store failure propagates, ending
/// the loop (and with it the service) -- the base design has no retry.
///
/// # Errors
///
/// Returns [`RegistryError::Store`] if a reconciliation write fails.
pub async fn run_channel<S: RecordStore>(
    mut subscriber: async_nats::Subscriber,
    kind: ChannelKind,
    reconciler: &Reconciler<S>,
) -> Result<(), RegistryError> {
    info!(channel = kind.label(), "intake channel started");

    while let Some(message) = subscriber.next().await {
        debug!(
            channel = kind.label(),
            subject = %message.subject,
            payload_size = message.payload.len(),
            "received message"
        );

        match kind.decode(&message.payload) {
            Ok(event) => reconciler.apply(&event).await?,
            Err(e) => {
                // Already consumed; dropped without retry or store access.
                warn!(
                    channel = kind.label(),
                    error = %e,
                    "failed to decode payload, message dropped"
                );
            }
        }
    }

    info!(channel = kind.label(), "subscription ended");
    Ok(())
}
