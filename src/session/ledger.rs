//! Outstanding requests of one session.
//!
//! Acknowledgements from the transport carry only a request id. The ledger
//! remembers what each id was for so acks can be logged with their topic and
//! payload, and so an id nobody issued can be flagged.

use super::RequestId;
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    Subscribe,
    Unsubscribe,
    Publish,
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Subscribe => write!(f, "subscribe"),
            Self::Unsubscribe => write!(f, "unsubscribe"),
            Self::Publish => write!(f, "publish"),
        }
    }
}

/// A request awaiting its acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutstandingRequest {
    pub kind: RequestKind,
    pub topic: String,
    /// Set for publishes only.
    pub payload: Option<String>,
}

impl OutstandingRequest {
    pub fn subscribe(topic: &str) -> Self {
        Self {
            kind: RequestKind::Subscribe,
            topic: topic.to_string(),
            payload: None,
        }
    }

    pub fn unsubscribe(topic: &str) -> Self {
        Self {
            kind: RequestKind::Unsubscribe,
            topic: topic.to_string(),
            payload: None,
        }
    }

    pub fn publish(topic: &str, payload: &str) -> Self {
        Self {
            kind: RequestKind::Publish,
            topic: topic.to_string(),
            payload: Some(payload.to_string()),
        }
    }
}

#[derive(Debug, Default)]
pub struct RequestLedger {
    entries: HashMap<RequestId, OutstandingRequest>,
}

impl RequestLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, id: RequestId, request: OutstandingRequest) {
        self.entries.insert(id, request);
    }

    /// Remove and return the request `id` if it is of the acknowledged kind.
    ///
    /// An id of a different kind is left in place.
    pub fn settle(&mut self, id: RequestId, kind: RequestKind) -> Option<OutstandingRequest> {
        match self.entries.get(&id) {
            Some(request) if request.kind == kind => self.entries.remove(&id),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settle_matching_kind() {
        let mut ledger = RequestLedger::new();
        ledger.record(3, OutstandingRequest::publish("/pokemon", "squirtle"));

        let request = ledger.settle(3, RequestKind::Publish).unwrap();
        assert_eq!(request.topic, "/pokemon");
        assert_eq!(request.payload.as_deref(), Some("squirtle"));
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_settle_wrong_kind_keeps_entry() {
        let mut ledger = RequestLedger::new();
        ledger.record(3, OutstandingRequest::subscribe("/pokedex"));
        assert_eq!(ledger.settle(3, RequestKind::Unsubscribe), None);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_settle_unknown_id() {
        let mut ledger = RequestLedger::new();
        assert_eq!(ledger.settle(99, RequestKind::Subscribe), None);
    }
}
