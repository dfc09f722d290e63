//! Address acquisition.
//!
//! Every acquired address starts exactly one new broker session. A failed
//! start is logged and left alone: the next address (after a reconnect) is
//! the retry path.

use crate::config::BrokerEndpoint;
use crate::event::{Notifier, SessionNotifier};
use crate::session::{SessionConnector, SessionOrchestrator, SessionPlan};
use log::{error, info};
use std::net::IpAddr;
use std::sync::Arc;

/// A network address handed out by DHCP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressEvent {
    address: IpAddr,
}

impl AddressEvent {
    pub fn new(address: IpAddr) -> Self {
        Self { address }
    }

    pub fn address(&self) -> IpAddr {
        self.address
    }
}

/// Turns address notifications into fresh session orchestrators.
#[derive(Debug)]
pub struct AddressWatcher {
    endpoint: BrokerEndpoint,
    plan: Arc<SessionPlan>,
    /// Generation of the most recently started session.
    generation: u64,
}

impl AddressWatcher {
    pub fn new(endpoint: BrokerEndpoint, plan: Arc<SessionPlan>) -> Self {
        Self {
            endpoint,
            plan,
            generation: 0,
        }
    }

    /// Generation of the last session start attempt (0 before the first).
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn endpoint(&self) -> &BrokerEndpoint {
        &self.endpoint
    }

    /// Open one session for `event`.
    ///
    /// Returns `None` if the session could not be opened.
    pub fn on_address<C: SessionConnector>(
        &mut self,
        event: AddressEvent,
        connector: &mut C,
        notifier: &Notifier,
    ) -> Option<SessionOrchestrator<C::Client>> {
        info!("Got IP={}", event.address());

        self.generation += 1;
        let session_notifier = SessionNotifier::new(notifier.clone(), self.generation);

        info!("Init MQTT client for {}", self.endpoint);
        match connector.open(&self.endpoint, session_notifier) {
            Ok(client) => Some(SessionOrchestrator::new(
                self.generation,
                client,
                Arc::clone(&self.plan),
            )),
            Err(e) => {
                error!("Failed to start MQTT session {}: {}", self.generation, e);
                None
            }
        }
    }
}
