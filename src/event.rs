//! Notification queue shared by every collaborator.
//!
//! Driver callbacks, MQTT callbacks and reconnect timers never touch the state
//! machines directly. They post a [`Notification`] into one unbounded channel,
//! and the [`Dispatcher`](crate::dispatcher::Dispatcher) consumes it on a
//! single task, so no two handlers ever run at the same time.

use crate::address::AddressEvent;
use crate::link::LinkEvent;
use crate::session::SessionEvent;
use log::debug;
use tokio::sync::mpsc;

/// Everything the dispatcher reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// Station link notification (or the supervisor's own retry timer).
    Link(LinkEvent),
    /// A network address was acquired.
    Address(AddressEvent),
    /// Broker session notification, tagged with the session that produced it.
    Session { generation: u64, event: SessionEvent },
}

/// Sending half of the queue. Cheap to clone, usable from any thread.
pub type Notifier = mpsc::UnboundedSender<Notification>;

/// Receiving half of the queue, owned by the dispatcher.
pub type NotificationQueue = mpsc::UnboundedReceiver<Notification>;

/// Create the notification queue.
pub fn channel() -> (Notifier, NotificationQueue) {
    mpsc::unbounded_channel()
}

/// Notifier handed to one broker session.
///
/// Every event it sends carries the session generation, so events from a
/// replaced session can be told apart from those of its successor.
#[derive(Debug, Clone)]
pub struct SessionNotifier {
    notifier: Notifier,
    generation: u64,
}

impl SessionNotifier {
    pub fn new(notifier: Notifier, generation: u64) -> Self {
        Self {
            notifier,
            generation,
        }
    }

    /// Generation of the session this notifier belongs to.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Post a session event. Returns false once the dispatcher is gone.
    pub fn notify(&self, event: SessionEvent) -> bool {
        let sent = self
            .notifier
            .send(Notification::Session {
                generation: self.generation,
                event,
            })
            .is_ok();
        if !sent {
            debug!(
                "Session {} notification dropped, queue closed",
                self.generation
            );
        }
        sent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_notifier_tags_generation() {
        let (notifier, mut queue) = channel();
        let session = SessionNotifier::new(notifier, 3);
        assert!(session.notify(SessionEvent::Established));
        assert_eq!(
            queue.try_recv().unwrap(),
            Notification::Session {
                generation: 3,
                event: SessionEvent::Established,
            }
        );
    }

    #[test]
    fn test_notify_after_queue_dropped() {
        let (notifier, queue) = channel();
        drop(queue);
        let session = SessionNotifier::new(notifier, 1);
        assert!(!session.notify(SessionEvent::Disconnected));
    }
}
