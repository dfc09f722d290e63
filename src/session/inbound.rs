//! Inbound message normalisation.
//!
//! The transport may deliver a message without a topic (continuation
//! fragments) or without a payload. Both are turned into empty strings before
//! any formatting or comparison sees them.

use std::borrow::Cow;
use std::fmt;

/// Absent text becomes `""`.
pub fn normalize_text(value: Option<&str>) -> &str {
    value.unwrap_or("")
}

/// Absent payload becomes `""`; invalid UTF-8 is replaced, never rejected.
pub fn normalize_payload(value: Option<&[u8]>) -> Cow<'_, str> {
    String::from_utf8_lossy(value.unwrap_or(&[]))
}

/// A received message with both fields present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub topic: String,
    pub payload: String,
}

impl InboundMessage {
    pub fn from_parts(topic: Option<&str>, payload: Option<&[u8]>) -> Self {
        Self {
            topic: normalize_text(topic).to_string(),
            payload: normalize_payload(payload).into_owned(),
        }
    }
}

impl fmt::Display for InboundMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Data '{}' received on '{}'", self.payload, self.topic)
    }
}
