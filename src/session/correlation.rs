//! Follow-up actions keyed by request id.

use super::RequestId;
use std::collections::HashMap;

/// Action to run when a subscription is acknowledged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FollowUp {
    /// Drop the subscription to this topic again.
    Unsubscribe(String),
}

/// Pending follow-ups of one session.
///
/// Scoped to a single orchestrator: a new session starts with an empty map
/// and never sees entries of the session it replaced.
#[derive(Debug, Default)]
pub struct PendingCorrelations {
    entries: HashMap<RequestId, FollowUp>,
}

impl PendingCorrelations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `follow_up` for the request `id`.
    pub fn insert(&mut self, id: RequestId, follow_up: FollowUp) {
        self.entries.insert(id, follow_up);
    }

    /// Remove and return the follow-up for `id`, if any.
    ///
    /// Each entry is handed out at most once.
    pub fn take(&mut self, id: RequestId) -> Option<FollowUp> {
        self.entries.remove(&id)
    }

    pub fn contains(&self, id: RequestId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
