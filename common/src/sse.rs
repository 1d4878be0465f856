// common/src/sse.rs
//! Server-sent events wire format: `event: <name>\ndata: <json>\n\n`.
use serde::Serialize;
use crate::messages::EVENT_MESSAGE;

/// A single dispatched server-sent event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    /// Event name, `None` when the record carried no `event:` field
    pub event: Option<String>,
    pub data: String,
}

impl SseEvent {
    pub fn new(event: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            event: Some(event.into()),
            data: data.into(),
        }
    }

    /// Build a named event with a JSON payload
    pub fn json<T: Serialize>(event: &str, payload: &T) -> Result<Self, serde_json::Error> {
        Ok(Self::new(event, serde_json::to_string(payload)?))
    }

    /// Event name as seen by a listener; unnamed events are `message` events
    pub fn name(&self) -> &str {
        self.event.as_deref().unwrap_or(EVENT_MESSAGE)
    }

    /// Frame the event for the wire, terminated by a blank line
    pub fn to_wire(&self) -> String {
        let mut out = String::new();
        if let Some(event) = &self.event {
            out.push_str("event: ");
            out.push_str(event);
            out.push('\n');
        }
        for line in self.data.split('\n') {
            out.push_str("data: ");
            out.push_str(line);
            out.push('\n');
        }
        out.push('\n');
        out
    }
}
