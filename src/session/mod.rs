//! MQTT broker session.
//!
//! One [`SessionOrchestrator`] exists per acquired address. It owns the
//! session client, runs the [`SessionPlan`] once the broker accepts the
//! connection, and handles acknowledgements until the session ends.
//!
//! # Components
//!
//! - [`orchestrator`] - session state machine
//! - [`plan`] - the fixed subscribe/publish sequence
//! - [`correlation`] - follow-up actions keyed by request id
//! - [`ledger`] - outstanding requests, for acknowledgement logging
//! - [`inbound`] - normalisation of received topic/payload
//! - [`esp`] - `EspMqttClient` adapter (ESP32 only)
//! - [`host`] - `rumqttc` adapter (host only)

mod correlation;
mod inbound;
mod ledger;
mod orchestrator;
mod plan;

#[cfg(feature = "esp32")]
mod esp;
#[cfg(not(target_os = "espidf"))]
mod host;

use crate::config::BrokerEndpoint;
use crate::event::SessionNotifier;
use std::fmt;

pub use correlation::{FollowUp, PendingCorrelations};
pub use inbound::{normalize_payload, normalize_text, InboundMessage};
pub use ledger::{OutstandingRequest, RequestKind, RequestLedger};
pub use orchestrator::{SessionOrchestrator, SessionState};
pub use plan::{
    Publication, SessionPlan, Subscription, BALL_TOPIC, DEX_TOPIC, POKEMON_PAYLOADS,
    POKEMON_TOPIC,
};

#[cfg(feature = "esp32")]
pub use esp::{EspMqttConnector, EspMqttSession};
#[cfg(not(target_os = "espidf"))]
pub use host::{RumqttConnector, RumqttSession};

/// Identifier the transport assigns to a subscribe, unsubscribe or publish.
pub type RequestId = u32;

/// MQTT delivery quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Qos {
    AtMostOnce,
    #[default]
    AtLeastOnce,
    ExactlyOnce,
}

/// Broker-session notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Broker accepted the connection.
    Established,
    SubscribeAck { id: RequestId },
    UnsubscribeAck { id: RequestId },
    PublishAck { id: RequestId },
    /// Inbound message. The transport may omit either field.
    MessageReceived {
        topic: Option<String>,
        payload: Option<Vec<u8>>,
    },
    Disconnected,
    Error { reason: String },
    /// Any other transport event, logged only.
    Other { description: String },
}

/// Requests against a live broker session.
///
/// Every call only submits the request; its acknowledgement arrives later as
/// a [`SessionEvent`].
pub trait SessionClient {
    fn subscribe(&mut self, topic: &str, qos: Qos) -> Result<RequestId, SessionError>;

    fn unsubscribe(&mut self, topic: &str) -> Result<RequestId, SessionError>;

    fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        qos: Qos,
        retain: bool,
    ) -> Result<RequestId, SessionError>;
}

/// Opens broker sessions.
pub trait SessionConnector {
    type Client: SessionClient;

    /// Start connecting to `endpoint`. `Established` is reported through
    /// `notifier` once the broker accepts.
    fn open(
        &mut self,
        endpoint: &BrokerEndpoint,
        notifier: SessionNotifier,
    ) -> Result<Self::Client, SessionError>;
}

/// Errors that can occur during session operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Client could not be created.
    Open(String),
    /// Request could not be submitted.
    Submit(String),
    /// Session already ended; its handle is gone.
    Terminated,
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open(e) => write!(f, "session open failed: {}", e),
            Self::Submit(e) => write!(f, "request not submitted: {}", e),
            Self::Terminated => write!(f, "session terminated"),
        }
    }
}

impl std::error::Error for SessionError {}
