// common/src/messages.rs
use serde::{Deserialize, Serialize};

/// Event discriminator for an incremental text fragment
pub const EVENT_MESSAGE: &str = "message";
/// Event discriminator for the terminal chunk of a response
pub const EVENT_DONE: &str = "done";
/// SSE event name carrying an in-band failure
pub const EVENT_ERROR: &str = "error";

pub const UNAUTHORIZED_MESSAGE: &str = "Unauthorized - Please log in again";
pub const CONNECTION_ERROR_MESSAGE: &str = "Connection error";

/// A unit of streamed chat output, as carried in an SSE `data:` payload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub done: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl Chunk {
    /// A text fragment of the response
    pub fn message(data: impl Into<String>) -> Self {
        Self {
            event: Some(EVENT_MESSAGE.to_string()),
            data: Some(data.into()),
            ..Self::default()
        }
    }

    /// The terminal chunk
    pub fn done() -> Self {
        Self {
            event: Some(EVENT_DONE.to_string()),
            ..Self::default()
        }
    }

    /// A failure with an optional HTTP status
    pub fn error(message: impl Into<String>, status: Option<u16>) -> Self {
        Self {
            error: Some(message.into()),
            status,
            ..Self::default()
        }
    }

    /// Payload the relay injects when the upstream rejects the session
    pub fn unauthorized() -> Self {
        Self::error(UNAUTHORIZED_MESSAGE, Some(401))
    }

    /// Payload reported when the event connection itself fails
    pub fn connection_error() -> Self {
        Self::error(CONNECTION_ERROR_MESSAGE, None)
    }

    pub fn is_done(&self) -> bool {
        self.event.as_deref() == Some(EVENT_DONE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_chunk_parses_from_wire_payload() {
        let chunk: Chunk = serde_json::from_str(r#"{"event":"message","data":"chunk1"}"#).unwrap();
        assert_eq!(chunk, Chunk::message("chunk1"));
        assert!(!chunk.is_done());
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let chunk: Chunk = serde_json::from_str(r#"{"event":"done","model":"llama3"}"#).unwrap();
        assert!(chunk.is_done());
    }

    #[test]
    fn test_unauthorized_payload_shape() {
        let json = serde_json::to_string(&Chunk::unauthorized()).unwrap();
        assert_eq!(json, r#"{"error":"Unauthorized - Please log in again","status":401}"#);
    }

    #[test]
    fn test_connection_error_has_no_status() {
        let json = serde_json::to_string(&Chunk::connection_error()).unwrap();
        assert_eq!(json, r#"{"error":"Connection error"}"#);
    }
}
