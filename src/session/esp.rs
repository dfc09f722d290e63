//! ESP-IDF MQTT session.
//!
//! The MQTT client runs its own task and calls back into [`translate`] for
//! every event; the callback only posts into the notification queue.

use super::{Qos, RequestId, SessionClient, SessionConnector, SessionError, SessionEvent};
use crate::config::BrokerEndpoint;
use crate::event::SessionNotifier;
use esp_idf_svc::mqtt::client::{EspMqttClient, EventPayload, MqttClientConfiguration, QoS};
use esp_idf_sys::EspError;
use log::info;

fn to_qos(qos: Qos) -> QoS {
    match qos {
        Qos::AtMostOnce => QoS::AtMostOnce,
        Qos::AtLeastOnce => QoS::AtLeastOnce,
        Qos::ExactlyOnce => QoS::ExactlyOnce,
    }
}

fn translate(payload: EventPayload<'_, EspError>) -> SessionEvent {
    match payload {
        EventPayload::Connected(_) => SessionEvent::Established,
        EventPayload::Disconnected => SessionEvent::Disconnected,
        EventPayload::Subscribed(id) => SessionEvent::SubscribeAck { id },
        EventPayload::Unsubscribed(id) => SessionEvent::UnsubscribeAck { id },
        EventPayload::Published(id) => SessionEvent::PublishAck { id },
        EventPayload::Received { topic, data, .. } => SessionEvent::MessageReceived {
            topic: topic.map(str::to_string),
            payload: Some(data.to_vec()),
        },
        EventPayload::Error(e) => SessionEvent::Error {
            reason: format!("{:?}", e),
        },
        other => SessionEvent::Other {
            description: format!("{:?}", other),
        },
    }
}

/// Opens `EspMqttClient` sessions.
#[derive(Debug, Default)]
pub struct EspMqttConnector;

impl EspMqttConnector {
    pub fn new() -> Self {
        Self
    }
}

impl SessionConnector for EspMqttConnector {
    type Client = EspMqttSession;

    fn open(
        &mut self,
        endpoint: &BrokerEndpoint,
        notifier: SessionNotifier,
    ) -> Result<EspMqttSession, SessionError> {
        // A lost connection ends the session; the next address opens a new one
        let conf = MqttClientConfiguration {
            disable_auto_reconnect: true,
            ..Default::default()
        };

        info!("MQTT session {} starting", notifier.generation());
        let client = EspMqttClient::new_cb(endpoint.uri(), &conf, move |event| {
            notifier.notify(translate(event.payload()));
        })
        .map_err(|e| SessionError::Open(format!("{:?}", e)))?;

        Ok(EspMqttSession { client })
    }
}

/// Live ESP-IDF MQTT client. Dropping it stops and destroys the client.
pub struct EspMqttSession {
    client: EspMqttClient<'static>,
}

impl SessionClient for EspMqttSession {
    fn subscribe(&mut self, topic: &str, qos: Qos) -> Result<RequestId, SessionError> {
        self.client
            .subscribe(topic, to_qos(qos))
            .map_err(submit_error)
    }

    fn unsubscribe(&mut self, topic: &str) -> Result<RequestId, SessionError> {
        self.client.unsubscribe(topic).map_err(submit_error)
    }

    fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        qos: Qos,
        retain: bool,
    ) -> Result<RequestId, SessionError> {
        self.client
            .publish(topic, to_qos(qos), retain, payload)
            .map_err(submit_error)
    }
}

fn submit_error(e: EspError) -> SessionError {
    SessionError::Submit(format!("{:?}", e))
}
