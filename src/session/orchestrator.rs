//! Broker session state machine.

use super::correlation::{FollowUp, PendingCorrelations};
use super::inbound::InboundMessage;
use super::ledger::{OutstandingRequest, RequestKind, RequestLedger};
use super::plan::SessionPlan;
use super::{Qos, RequestId, SessionClient, SessionError, SessionEvent};
use log::{debug, error, info, warn};
use std::sync::Arc;

/// Lifecycle of one broker session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Client created, broker has not accepted yet.
    Created,
    /// Broker accepted; the plan has been issued.
    Connected,
    /// Disconnected or failed. Terminal.
    Terminated,
}

/// Drives one broker session from establishment to termination.
///
/// Owns the session client; once terminated the client is dropped and no
/// further request can be issued. Reconnection is not handled here: a new
/// address produces a new orchestrator.
pub struct SessionOrchestrator<C> {
    generation: u64,
    state: SessionState,
    client: Option<C>,
    plan: Arc<SessionPlan>,
    correlations: PendingCorrelations,
    ledger: RequestLedger,
}

impl<C: SessionClient> SessionOrchestrator<C> {
    pub fn new(generation: u64, client: C, plan: Arc<SessionPlan>) -> Self {
        Self {
            generation,
            state: SessionState::Created,
            client: Some(client),
            plan,
            correlations: PendingCorrelations::new(),
            ledger: RequestLedger::new(),
        }
    }

    /// Generation assigned by the address watcher.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_terminated(&self) -> bool {
        self.state == SessionState::Terminated
    }

    /// Follow-up actions still waiting for their acknowledgement.
    pub fn pending_follow_ups(&self) -> usize {
        self.correlations.len()
    }

    /// Requests issued and not yet acknowledged.
    pub fn outstanding_requests(&self) -> usize {
        self.ledger.len()
    }

    /// React to a session notification.
    pub fn handle(&mut self, event: SessionEvent) {
        if self.is_terminated() {
            debug!(
                "Session {} terminated, ignoring {:?}",
                self.generation, event
            );
            return;
        }

        match event {
            SessionEvent::Established => self.on_established(),
            SessionEvent::SubscribeAck { id } => self.on_subscribe_ack(id),
            SessionEvent::UnsubscribeAck { id } => self.on_ack(id, RequestKind::Unsubscribe),
            SessionEvent::PublishAck { id } => self.on_ack(id, RequestKind::Publish),
            SessionEvent::MessageReceived { topic, payload } => {
                let message = InboundMessage::from_parts(topic.as_deref(), payload.as_deref());
                info!("{}", message);
            }
            SessionEvent::Disconnected => {
                info!("Disconnected from MQTT broker");
                self.terminate();
            }
            SessionEvent::Error { reason } => {
                error!("MQTT error occurred: {}", reason);
                self.terminate();
            }
            SessionEvent::Other { description } => {
                info!("Other MQTT event: {}", description);
            }
        }
    }

    fn on_established(&mut self) {
        if self.state != SessionState::Created {
            warn!(
                "Session {} already established, ignoring repeat",
                self.generation
            );
            return;
        }
        info!("Connected to MQTT broker");
        self.state = SessionState::Connected;

        let plan = Arc::clone(&self.plan);
        for subscription in plan.subscriptions() {
            info!("Subscribe to '{}'", subscription.topic);
            match self.subscribe(&subscription.topic, subscription.qos) {
                Ok(id) => {
                    if let Some(follow_up) = &subscription.follow_up {
                        self.correlations.insert(id, follow_up.clone());
                    }
                }
                Err(e) => error!("Subscribe to '{}' failed: {}", subscription.topic, e),
            }
        }

        for publication in plan.publications() {
            info!("Send '{}' on '{}'", publication.payload, publication.topic);
            if let Err(e) = self.publish(
                &publication.topic,
                &publication.payload,
                publication.qos,
                publication.retain,
            ) {
                error!("Publish to '{}' failed: {}", publication.topic, e);
            }
        }
    }

    fn on_subscribe_ack(&mut self, id: RequestId) {
        self.on_ack(id, RequestKind::Subscribe);
        if let Some(follow_up) = self.correlations.take(id) {
            self.run_follow_up(follow_up);
        }
    }

    fn on_ack(&mut self, id: RequestId, kind: RequestKind) {
        let Some(request) = self.ledger.settle(id, kind) else {
            warn!("{} acknowledgement for unknown request {}", kind, id);
            return;
        };
        match kind {
            RequestKind::Subscribe => info!("Subscribed to '{}'", request.topic),
            RequestKind::Unsubscribe => info!("Unsubscribed from '{}'", request.topic),
            RequestKind::Publish => info!(
                "Published '{}' to '{}'",
                request.payload.as_deref().unwrap_or_default(),
                request.topic
            ),
        }
    }

    fn run_follow_up(&mut self, follow_up: FollowUp) {
        match follow_up {
            FollowUp::Unsubscribe(topic) => {
                info!("Unsubscribe to '{}'", topic);
                if let Err(e) = self.unsubscribe(&topic) {
                    error!("Unsubscribe from '{}' failed: {}", topic, e);
                }
            }
        }
    }

    fn terminate(&mut self) {
        if !self.correlations.is_empty() || !self.ledger.is_empty() {
            debug!(
                "Session {} dropping {} follow-up(s), {} outstanding request(s)",
                self.generation,
                self.correlations.len(),
                self.ledger.len()
            );
        }
        self.client = None;
        self.correlations = PendingCorrelations::new();
        self.ledger = RequestLedger::new();
        self.state = SessionState::Terminated;
    }

    fn client(&mut self) -> Result<&mut C, SessionError> {
        self.client.as_mut().ok_or(SessionError::Terminated)
    }

    fn subscribe(&mut self, topic: &str, qos: Qos) -> Result<RequestId, SessionError> {
        let id = self.client()?.subscribe(topic, qos)?;
        self.ledger.record(id, OutstandingRequest::subscribe(topic));
        Ok(id)
    }

    fn unsubscribe(&mut self, topic: &str) -> Result<RequestId, SessionError> {
        let id = self.client()?.unsubscribe(topic)?;
        self.ledger.record(id, OutstandingRequest::unsubscribe(topic));
        Ok(id)
    }

    fn publish(
        &mut self,
        topic: &str,
        payload: &str,
        qos: Qos,
        retain: bool,
    ) -> Result<RequestId, SessionError> {
        let id = self
            .client()?
            .publish(topic, payload.as_bytes(), qos, retain)?;
        self.ledger.record(id, OutstandingRequest::publish(topic, payload));
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{BALL_TOPIC, DEX_TOPIC, POKEMON_TOPIC};
    use crate::testing::{FakeSession, SessionCall, SessionLog};

    /// Orchestrator whose client hands out ids 6 (dex), 7 (ball), 8-10 (publishes).
    fn orchestrator() -> (SessionOrchestrator<FakeSession>, SessionLog) {
        let (client, log) = FakeSession::new(6);
        (
            SessionOrchestrator::new(1, client, Arc::new(SessionPlan::pokemon())),
            log,
        )
    }

    fn established() -> (SessionOrchestrator<FakeSession>, SessionLog) {
        let (mut session, log) = orchestrator();
        session.handle(SessionEvent::Established);
        (session, log)
    }

    fn publish(payload: &str) -> SessionCall {
        SessionCall::Publish(
            POKEMON_TOPIC.to_string(),
            payload.to_string(),
            Qos::AtLeastOnce,
            false,
        )
    }

    #[test]
    fn test_established_issues_plan_in_order() {
        let (session, log) = established();

        assert_eq!(session.state(), SessionState::Connected);
        assert_eq!(
            log.calls(),
            vec![
                SessionCall::Subscribe(DEX_TOPIC.to_string(), Qos::AtLeastOnce),
                SessionCall::Subscribe(BALL_TOPIC.to_string(), Qos::AtLeastOnce),
                publish("charmender"),
                publish("squirtle"),
                publish("bulbasaur"),
            ]
        );
        assert_eq!(log.unsubscribes(), 0);
        assert_eq!(session.pending_follow_ups(), 1);
        assert_eq!(session.outstanding_requests(), 5);
    }

    #[test]
    fn test_ball_ack_triggers_unsubscribe() {
        let (mut session, log) = established();

        session.handle(SessionEvent::SubscribeAck { id: 7 });

        assert_eq!(
            log.calls().last(),
            Some(&SessionCall::Unsubscribe(BALL_TOPIC.to_string()))
        );
        assert_eq!(log.unsubscribes(), 1);
        assert_eq!(session.pending_follow_ups(), 0);
    }

    #[test]
    fn test_duplicate_ball_ack_is_ignored() {
        let (mut session, log) = established();

        session.handle(SessionEvent::SubscribeAck { id: 7 });
        session.handle(SessionEvent::SubscribeAck { id: 7 });
        session.handle(SessionEvent::SubscribeAck { id: 7 });

        assert_eq!(log.unsubscribes(), 1);
        assert_eq!(session.state(), SessionState::Connected);
    }

    #[test]
    fn test_dex_ack_is_observed_only() {
        let (mut session, log) = established();

        session.handle(SessionEvent::SubscribeAck { id: 6 });

        assert_eq!(log.unsubscribes(), 0);
        assert_eq!(session.pending_follow_ups(), 1);
        assert_eq!(session.outstanding_requests(), 4);
    }

    #[test]
    fn test_unknown_ack_is_a_no_op() {
        let (mut session, log) = established();

        session.handle(SessionEvent::SubscribeAck { id: 42 });
        session.handle(SessionEvent::UnsubscribeAck { id: 42 });
        session.handle(SessionEvent::PublishAck { id: 42 });

        assert_eq!(log.calls().len(), 5);
        assert_eq!(session.pending_follow_ups(), 1);
        assert_eq!(session.outstanding_requests(), 5);
    }

    #[test]
    fn test_acks_settle_outstanding_requests() {
        let (mut session, _log) = established();

        for id in [8, 9, 10] {
            session.handle(SessionEvent::PublishAck { id });
        }
        session.handle(SessionEvent::SubscribeAck { id: 6 });
        session.handle(SessionEvent::SubscribeAck { id: 7 });
        assert_eq!(session.outstanding_requests(), 1); // the unsubscribe

        session.handle(SessionEvent::UnsubscribeAck { id: 11 });
        assert_eq!(session.outstanding_requests(), 0);
    }

    #[test]
    fn test_repeat_established_does_not_replay_plan() {
        let (mut session, log) = established();
        session.handle(SessionEvent::Established);
        assert_eq!(log.calls().len(), 5);
    }

    #[test]
    fn test_nothing_happens_before_established() {
        let (mut session, log) = orchestrator();
        session.handle(SessionEvent::SubscribeAck { id: 7 });
        assert!(log.calls().is_empty());
        assert_eq!(session.state(), SessionState::Created);
    }

    #[test]
    fn test_disconnect_terminates() {
        let (mut session, log) = established();

        session.handle(SessionEvent::Disconnected);
        assert_eq!(session.state(), SessionState::Terminated);
        assert_eq!(session.pending_follow_ups(), 0);

        // Handle is gone: a late ack no longer issues the unsubscribe
        session.handle(SessionEvent::SubscribeAck { id: 7 });
        session.handle(SessionEvent::Established);
        assert_eq!(log.unsubscribes(), 0);
        assert_eq!(log.calls().len(), 5);
        assert_eq!(session.state(), SessionState::Terminated);
    }

    #[test]
    fn test_error_terminates_from_any_state() {
        let (mut created, _) = orchestrator();
        created.handle(SessionEvent::Error {
            reason: "transport".to_string(),
        });
        assert!(created.is_terminated());

        let (mut connected, _) = established();
        connected.handle(SessionEvent::Error {
            reason: "transport".to_string(),
        });
        assert!(connected.is_terminated());
    }

    #[test]
    fn test_submission_failure_does_not_stop_plan() {
        let (client, log) = FakeSession::new(6);
        let client = client.failing_on(BALL_TOPIC);
        let mut session = SessionOrchestrator::new(1, client, Arc::new(SessionPlan::pokemon()));

        session.handle(SessionEvent::Established);

        assert_eq!(session.state(), SessionState::Connected);
        assert_eq!(session.pending_follow_ups(), 0);
        assert_eq!(log.calls().len(), 4); // dex subscribe + 3 publishes
    }

    #[test]
    fn test_message_with_absent_fields() {
        let (mut session, _) = established();
        session.handle(SessionEvent::MessageReceived {
            topic: None,
            payload: None,
        });
        session.handle(SessionEvent::MessageReceived {
            topic: Some(DEX_TOPIC.to_string()),
            payload: Some(b"pikachu".to_vec()),
        });
        session.handle(SessionEvent::Other {
            description: "before connect".to_string(),
        });
        assert_eq!(session.state(), SessionState::Connected);
    }
}
