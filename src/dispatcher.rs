//! Single consumer of the notification queue.
//!
//! Routes every [`Notification`] to the component that owns it and executes
//! the link actions the supervisor returns. Only session notifications whose
//! generation matches the live orchestrator are delivered.

use crate::address::AddressWatcher;
use crate::event::{Notification, NotificationQueue, Notifier};
use crate::link::{LinkAction, LinkDriver, LinkEvent, LinkSupervisor};
use crate::session::{SessionConnector, SessionEvent, SessionOrchestrator};
use log::{debug, error, info};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Owns the state machines and their collaborators for the process lifetime.
pub struct Dispatcher<D: LinkDriver, C: SessionConnector> {
    supervisor: LinkSupervisor,
    watcher: AddressWatcher,
    driver: D,
    connector: C,
    /// At most one orchestrator is live.
    session: Option<SessionOrchestrator<C::Client>>,
    notifier: Notifier,
}

impl<D: LinkDriver, C: SessionConnector> Dispatcher<D, C> {
    pub fn new(
        supervisor: LinkSupervisor,
        watcher: AddressWatcher,
        driver: D,
        connector: C,
        notifier: Notifier,
    ) -> Self {
        Self {
            supervisor,
            watcher,
            driver,
            connector,
            session: None,
            notifier,
        }
    }

    pub fn supervisor(&self) -> &LinkSupervisor {
        &self.supervisor
    }

    pub fn session(&self) -> Option<&SessionOrchestrator<C::Client>> {
        self.session.as_ref()
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Handle one notification to completion.
    pub fn dispatch(&mut self, notification: Notification) {
        match notification {
            Notification::Link(event) => {
                if let Some(action) = self.supervisor.handle(event) {
                    self.execute(action);
                }
            }
            Notification::Address(event) => {
                if let Some(old) = self.session.take() {
                    debug!("Replacing MQTT session {}", old.generation());
                }
                self.session =
                    self.watcher
                        .on_address(event, &mut self.connector, &self.notifier);
            }
            Notification::Session { generation, event } => {
                self.route_session(generation, event)
            }
        }
    }

    fn route_session(&mut self, generation: u64, event: SessionEvent) {
        match self.session.as_mut() {
            Some(session) if session.generation() == generation => session.handle(event),
            _ => debug!("Dropping {:?} from stale session {}", event, generation),
        }
    }

    fn execute(&mut self, action: LinkAction) {
        match action {
            LinkAction::Connect => {
                if let Err(e) = self.driver.connect() {
                    error!("WiFi connect request failed: {}", e);
                }
            }
            LinkAction::ScheduleConnect(delay) => self.schedule_retry(delay),
        }
    }

    fn schedule_retry(&self, delay: Duration) {
        let notifier = self.notifier.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if notifier
                .send(Notification::Link(LinkEvent::RetryElapsed))
                .is_err()
            {
                debug!("Reconnect timer fired after shutdown");
            }
        });
    }

    /// Drain `queue` until `cancel` fires.
    ///
    /// Already queued notifications are handled before cancellation is
    /// honoured. Returns `self` so the final state can be inspected.
    pub async fn run(mut self, mut queue: NotificationQueue, cancel: CancellationToken) -> Self {
        info!("Dispatcher running");
        loop {
            tokio::select! {
                biased;
                next = queue.recv() => match next {
                    Some(notification) => self.dispatch(notification),
                    None => {
                        debug!("Notification queue closed");
                        break;
                    }
                },
                _ = cancel.cancelled() => {
                    info!("Dispatcher stopping");
                    break;
                }
            }
        }
        self
    }
}
