//! `rumqttc` session for host builds.
//!
//! rumqttc only assigns a packet id once the event loop actually sends a
//! request, and reports that id as an `Outgoing` event. Requests therefore
//! get a local [`RequestId`] at submission, queued per kind, and are matched
//! with their packet id in issue order when the `Outgoing` event shows up.
//! Acknowledgements are translated back through the same table.

use super::ledger::RequestKind;
use super::{Qos, RequestId, SessionClient, SessionConnector, SessionError, SessionEvent};
use crate::config::BrokerEndpoint;
use crate::event::SessionNotifier;
use log::{debug, info};
use rand_core::{OsRng, RngCore};
use rumqttc::{AsyncClient, ClientError, Event, EventLoop, MqttOptions, Outgoing, Packet, QoS, Transport};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Request channel capacity between client and event loop.
const REQUEST_CAPACITY: usize = 16;

const DEFAULT_KEEP_ALIVE: Duration = Duration::from_secs(5);

/// Local request ids waiting for, or matched with, a broker packet id.
#[derive(Debug, Default)]
struct PacketIds {
    queued: HashMap<RequestKind, VecDeque<RequestId>>,
    in_flight: HashMap<(RequestKind, u16), RequestId>,
}

impl PacketIds {
    fn queue(&mut self, kind: RequestKind, id: RequestId) {
        self.queued.entry(kind).or_default().push_back(id);
    }

    /// Withdraw a request that never reached the event loop.
    fn withdraw(&mut self, kind: RequestKind, id: RequestId) {
        if let Some(queue) = self.queued.get_mut(&kind) {
            queue.retain(|queued| *queued != id);
        }
    }

    /// Match the oldest queued request of `kind` with `pkid`.
    fn assign(&mut self, kind: RequestKind, pkid: u16) {
        let Some(id) = self.queued.get_mut(&kind).and_then(VecDeque::pop_front) else {
            debug!("Outgoing {} packet {} was not issued by this session", kind, pkid);
            return;
        };
        // QoS 0 publishes carry no packet id and are never acknowledged
        if pkid != 0 {
            self.in_flight.insert((kind, pkid), id);
        }
    }

    fn resolve(&mut self, kind: RequestKind, pkid: u16) -> Option<RequestId> {
        self.in_flight.remove(&(kind, pkid))
    }
}

fn lock(ids: &Mutex<PacketIds>) -> MutexGuard<'_, PacketIds> {
    ids.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn to_qos(qos: Qos) -> QoS {
    match qos {
        Qos::AtMostOnce => QoS::AtMostOnce,
        Qos::AtLeastOnce => QoS::AtLeastOnce,
        Qos::ExactlyOnce => QoS::ExactlyOnce,
    }
}

/// Acknowledgement for `pkid`, or `Other` if the packet is not ours.
fn ack(
    ids: &Mutex<PacketIds>,
    kind: RequestKind,
    pkid: u16,
    event: fn(RequestId) -> SessionEvent,
) -> SessionEvent {
    match lock(ids).resolve(kind, pkid) {
        Some(id) => event(id),
        None => SessionEvent::Other {
            description: format!("{} ack for unmapped packet {}", kind, pkid),
        },
    }
}

/// Translate one event-loop event. `None` means nothing to report.
fn translate(event: Event, ids: &Mutex<PacketIds>) -> Option<SessionEvent> {
    match event {
        Event::Incoming(packet) => match packet {
            Packet::ConnAck(_) => Some(SessionEvent::Established),
            Packet::SubAck(ack_packet) => Some(ack(ids, RequestKind::Subscribe, ack_packet.pkid, |id| {
                SessionEvent::SubscribeAck { id }
            })),
            Packet::UnsubAck(ack_packet) => Some(ack(ids, RequestKind::Unsubscribe, ack_packet.pkid, |id| {
                SessionEvent::UnsubscribeAck { id }
            })),
            Packet::PubAck(ack_packet) => Some(ack(ids, RequestKind::Publish, ack_packet.pkid, |id| {
                SessionEvent::PublishAck { id }
            })),
            Packet::PubComp(ack_packet) => Some(ack(ids, RequestKind::Publish, ack_packet.pkid, |id| {
                SessionEvent::PublishAck { id }
            })),
            Packet::Publish(publish) => Some(SessionEvent::MessageReceived {
                topic: Some(publish.topic),
                payload: Some(publish.payload.to_vec()),
            }),
            Packet::Disconnect => Some(SessionEvent::Disconnected),
            Packet::PingResp => None,
            other => Some(SessionEvent::Other {
                description: format!("{:?}", other),
            }),
        },
        Event::Outgoing(outgoing) => {
            match outgoing {
                Outgoing::Subscribe(pkid) => lock(ids).assign(RequestKind::Subscribe, pkid),
                Outgoing::Unsubscribe(pkid) => lock(ids).assign(RequestKind::Unsubscribe, pkid),
                Outgoing::Publish(pkid) => lock(ids).assign(RequestKind::Publish, pkid),
                _ => {}
            }
            None
        }
    }
}

/// Poll the event loop until it fails or the dispatcher goes away.
///
/// There is no reconnect here: a failed connection ends the session, and the
/// next acquired address opens a new one.
async fn drive(mut eventloop: EventLoop, ids: Arc<Mutex<PacketIds>>, notifier: SessionNotifier) {
    loop {
        match eventloop.poll().await {
            Ok(event) => {
                let Some(event) = translate(event, &ids) else {
                    continue;
                };
                if !notifier.notify(event) {
                    break;
                }
            }
            Err(e) => {
                notifier.notify(SessionEvent::Error {
                    reason: e.to_string(),
                });
                break;
            }
        }
    }
    debug!("MQTT session {} event loop finished", notifier.generation());
}

/// Opens rumqttc sessions.
#[derive(Debug, Clone)]
pub struct RumqttConnector {
    client_id: String,
    keep_alive: Duration,
}

impl RumqttConnector {
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            keep_alive: DEFAULT_KEEP_ALIVE,
        }
    }

    pub fn with_keep_alive(mut self, keep_alive: Duration) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }
}

impl Default for RumqttConnector {
    /// Random client id, like the device's chip-id based one.
    fn default() -> Self {
        Self::new(format!("mqtt-station-{:08x}", OsRng.next_u32()))
    }
}

impl SessionConnector for RumqttConnector {
    type Client = RumqttSession;

    fn open(
        &mut self,
        endpoint: &BrokerEndpoint,
        notifier: SessionNotifier,
    ) -> Result<RumqttSession, SessionError> {
        let runtime = Handle::try_current().map_err(|e| SessionError::Open(e.to_string()))?;

        let mut options = MqttOptions::new(self.client_id.clone(), endpoint.host(), endpoint.port());
        options.set_keep_alive(self.keep_alive);
        if endpoint.is_secure() {
            options.set_transport(Transport::tls_with_default_config());
        }

        info!(
            "MQTT session {} connecting to {}:{} as '{}'",
            notifier.generation(),
            endpoint.host(),
            endpoint.port(),
            self.client_id
        );
        let (client, eventloop) = AsyncClient::new(options, REQUEST_CAPACITY);
        let ids = Arc::new(Mutex::new(PacketIds::default()));
        let task = runtime.spawn(drive(eventloop, Arc::clone(&ids), notifier));

        Ok(RumqttSession::new(client, ids, task))
    }
}

/// Live rumqttc session. Dropping it stops the event loop.
#[derive(Debug)]
pub struct RumqttSession {
    client: AsyncClient,
    ids: Arc<Mutex<PacketIds>>,
    next_id: RequestId,
    task: JoinHandle<()>,
}

impl RumqttSession {
    fn new(client: AsyncClient, ids: Arc<Mutex<PacketIds>>, task: JoinHandle<()>) -> Self {
        Self {
            client,
            ids,
            next_id: 1,
            task,
        }
    }

    fn submit<F>(&mut self, kind: RequestKind, request: F) -> Result<RequestId, SessionError>
    where
        F: FnOnce(&AsyncClient) -> Result<(), ClientError>,
    {
        let id = self.next_id;
        self.next_id = self.next_id.checked_add(1).unwrap_or(1);

        lock(&self.ids).queue(kind, id);
        if let Err(e) = request(&self.client) {
            lock(&self.ids).withdraw(kind, id);
            return Err(SessionError::Submit(e.to_string()));
        }
        Ok(id)
    }
}

impl SessionClient for RumqttSession {
    fn subscribe(&mut self, topic: &str, qos: Qos) -> Result<RequestId, SessionError> {
        self.submit(RequestKind::Subscribe, |client| {
            client.try_subscribe(topic, to_qos(qos))
        })
    }

    fn unsubscribe(&mut self, topic: &str) -> Result<RequestId, SessionError> {
        self.submit(RequestKind::Unsubscribe, |client| client.try_unsubscribe(topic))
    }

    fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        qos: Qos,
        retain: bool,
    ) -> Result<RequestId, SessionError> {
        self.submit(RequestKind::Publish, |client| {
            client.try_publish(topic, to_qos(qos), retain, payload.to_vec())
        })
    }
}

impl Drop for RumqttSession {
    fn drop(&mut self) {
        self.task.abort();
    }
}
