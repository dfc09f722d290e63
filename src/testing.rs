//! In-memory doubles for the driver, session and store seams.
//!
//! Each double records what it was asked to do and hands the recording out
//! through a cheap clone, so a test can keep inspecting it after the double
//! itself was moved into the code under test.

use crate::config::{BrokerEndpoint, StationConfig};
use crate::event::SessionNotifier;
use crate::link::{LinkDriver, LinkError};
use crate::session::{Qos, RequestId, SessionClient, SessionConnector, SessionError};
use crate::store::{PersistentStore, StoreError};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

// ==================== Link ====================

#[derive(Debug, Default)]
struct LinkRecord {
    calls: Vec<String>,
    fail_configure: Option<LinkError>,
    fail_start: Option<LinkError>,
    fail_connect: Option<LinkError>,
}

/// Link driver that only records calls.
#[derive(Debug, Clone, Default)]
pub struct FakeLink {
    record: Rc<RefCell<LinkRecord>>,
}

impl FakeLink {
    /// Calls in order, e.g. `["configure:ssid", "start", "connect"]`.
    pub fn calls(&self) -> Vec<String> {
        self.record.borrow().calls.clone()
    }

    pub fn connects(&self) -> usize {
        self.record
            .borrow()
            .calls
            .iter()
            .filter(|c| *c == "connect")
            .count()
    }

    pub fn fail_configure(&mut self, err: LinkError) {
        self.record.borrow_mut().fail_configure = Some(err);
    }

    pub fn fail_start(&mut self, err: LinkError) {
        self.record.borrow_mut().fail_start = Some(err);
    }

    /// Every later connect fails with `err`.
    pub fn fail_connect(&mut self, err: LinkError) {
        self.record.borrow_mut().fail_connect = Some(err);
    }
}

impl LinkDriver for FakeLink {
    fn configure(&mut self, config: &StationConfig) -> Result<(), LinkError> {
        let mut record = self.record.borrow_mut();
        record.calls.push(format!("configure:{}", config.ssid));
        record.fail_configure.take().map_or(Ok(()), Err)
    }

    fn start(&mut self) -> Result<(), LinkError> {
        let mut record = self.record.borrow_mut();
        record.calls.push("start".to_string());
        record.fail_start.take().map_or(Ok(()), Err)
    }

    fn connect(&mut self) -> Result<(), LinkError> {
        let mut record = self.record.borrow_mut();
        record.calls.push("connect".to_string());
        record.fail_connect.clone().map_or(Ok(()), Err)
    }
}

// ==================== Session ====================

/// A request as submitted to a [`FakeSession`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCall {
    Subscribe(String, Qos),
    Unsubscribe(String),
    /// topic, payload (UTF-8), qos, retain
    Publish(String, String, Qos, bool),
}

/// Shared recording of one fake session's requests.
#[derive(Debug, Clone, Default)]
pub struct SessionLog {
    calls: Rc<RefCell<Vec<SessionCall>>>,
    dropped: Rc<RefCell<bool>>,
}

impl SessionLog {
    pub fn calls(&self) -> Vec<SessionCall> {
        self.calls.borrow().clone()
    }

    pub fn unsubscribes(&self) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|c| matches!(c, SessionCall::Unsubscribe(_)))
            .count()
    }

    /// Whether the session handle has been dropped.
    pub fn dropped(&self) -> bool {
        *self.dropped.borrow()
    }

    fn push(&self, call: SessionCall) {
        self.calls.borrow_mut().push(call);
    }
}

/// Session client handing out sequential request ids.
#[derive(Debug)]
pub struct FakeSession {
    next_id: RequestId,
    failing_topic: Option<String>,
    log: SessionLog,
}

impl FakeSession {
    /// New session whose first successful request gets `first_id`.
    pub fn new(first_id: RequestId) -> (Self, SessionLog) {
        let log = SessionLog::default();
        let session = Self {
            next_id: first_id,
            failing_topic: None,
            log: log.clone(),
        };
        (session, log)
    }

    /// Reject every request on `topic`. Rejected requests are not recorded.
    pub fn failing_on(mut self, topic: &str) -> Self {
        self.failing_topic = Some(topic.to_string());
        self
    }

    fn submit(&mut self, topic: &str, call: SessionCall) -> Result<RequestId, SessionError> {
        if self.failing_topic.as_deref() == Some(topic) {
            return Err(SessionError::Submit(format!("{} rejected", topic)));
        }
        self.log.push(call);
        let id = self.next_id;
        self.next_id += 1;
        Ok(id)
    }
}

impl SessionClient for FakeSession {
    fn subscribe(&mut self, topic: &str, qos: Qos) -> Result<RequestId, SessionError> {
        self.submit(topic, SessionCall::Subscribe(topic.to_string(), qos))
    }

    fn unsubscribe(&mut self, topic: &str) -> Result<RequestId, SessionError> {
        self.submit(topic, SessionCall::Unsubscribe(topic.to_string()))
    }

    fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        qos: Qos,
        retain: bool,
    ) -> Result<RequestId, SessionError> {
        let payload = String::from_utf8_lossy(payload).into_owned();
        self.submit(
            topic,
            SessionCall::Publish(topic.to_string(), payload, qos, retain),
        )
    }
}

impl Drop for FakeSession {
    fn drop(&mut self) {
        *self.log.dropped.borrow_mut() = true;
    }
}

#[derive(Debug, Default)]
struct ConnectorRecord {
    opened: Vec<String>,
    logs: Vec<SessionLog>,
    fail_next: Option<SessionError>,
}

/// Connector producing [`FakeSession`]s.
#[derive(Debug, Clone)]
pub struct FakeConnector {
    first_id: RequestId,
    record: Rc<RefCell<ConnectorRecord>>,
}

impl FakeConnector {
    /// Every opened session starts handing out ids at `first_id`.
    pub fn new(first_id: RequestId) -> Self {
        Self {
            first_id,
            record: Rc::new(RefCell::new(ConnectorRecord::default())),
        }
    }

    /// Broker URIs of every open attempt, failed ones included.
    pub fn opened(&self) -> Vec<String> {
        self.record.borrow().opened.clone()
    }

    /// Request log of the `index`th successfully opened session.
    pub fn session_log(&self, index: usize) -> Option<SessionLog> {
        self.record.borrow().logs.get(index).cloned()
    }

    pub fn fail_next_open(&mut self, err: SessionError) {
        self.record.borrow_mut().fail_next = Some(err);
    }
}

impl SessionConnector for FakeConnector {
    type Client = FakeSession;

    fn open(
        &mut self,
        endpoint: &BrokerEndpoint,
        _notifier: SessionNotifier,
    ) -> Result<FakeSession, SessionError> {
        let mut record = self.record.borrow_mut();
        record.opened.push(endpoint.uri().to_string());
        if let Some(err) = record.fail_next.take() {
            return Err(err);
        }
        let (session, log) = FakeSession::new(self.first_id);
        record.logs.push(log);
        Ok(session)
    }
}

// ==================== Store ====================

/// Store replaying scripted `init` results.
#[derive(Debug, Clone, Default)]
pub struct FakeStore {
    results: VecDeque<Result<(), StoreError>>,
    fail_erase: Option<StoreError>,
    inits: usize,
    erases: usize,
}

impl FakeStore {
    /// Once the script runs out, `init` succeeds.
    pub fn new(results: impl IntoIterator<Item = Result<(), StoreError>>) -> Self {
        Self {
            results: results.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn fail_erase(&mut self, err: StoreError) {
        self.fail_erase = Some(err);
    }

    pub fn inits(&self) -> usize {
        self.inits
    }

    pub fn erases(&self) -> usize {
        self.erases
    }
}

impl PersistentStore for FakeStore {
    fn init(&mut self) -> Result<(), StoreError> {
        self.inits += 1;
        self.results.pop_front().unwrap_or(Ok(()))
    }

    fn erase(&mut self) -> Result<(), StoreError> {
        self.erases += 1;
        self.fail_erase.take().map_or(Ok(()), Err)
    }
}
