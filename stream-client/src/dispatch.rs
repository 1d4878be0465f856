// stream-client/src/dispatch.rs
//! Decides, event by event, what reaches the chunk callback and when a
//! connection is finished.
use common::{Chunk, SseEvent, EVENT_DONE, EVENT_ERROR, EVENT_MESSAGE};

const UNAUTHORIZED_FALLBACK: &str = "Unauthorized";

/// Why a connection reached its terminal state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The response finished with a `done` chunk
    Done,
    /// An in-band error event or a transport failure was reported
    Error,
    /// The owner closed the connection
    Caller,
}

/// A chunk to hand to the callback, and whether the connection ends with it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub chunk: Chunk,
    pub close: Option<CloseReason>,
}

impl Delivery {
    fn keep_open(chunk: Chunk) -> Self {
        Self { chunk, close: None }
    }

    fn closing(chunk: Chunk, reason: CloseReason) -> Self {
        Self { chunk, close: Some(reason) }
    }
}

/// Per-connection dispatch state
///
/// Once closed, nothing is delivered any more. At most one error chunk is
/// ever delivered, whichever of the in-band error event or the transport
/// failure arrives first.
#[derive(Debug, Default)]
pub struct ChunkDispatcher {
    closed: Option<CloseReason>,
    error_reported: bool,
}

impl ChunkDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn closed(&self) -> Option<CloseReason> {
        self.closed
    }

    /// Mark the connection closed; the first reason wins
    pub fn close(&mut self, reason: CloseReason) -> bool {
        if self.closed.is_some() {
            return false;
        }
        self.closed = Some(reason);
        true
    }

    /// Handle one decoded event from the stream
    pub fn on_event(&mut self, event: &SseEvent) -> Option<Delivery> {
        if self.closed.is_some() {
            return None;
        }

        let delivery = match event.name() {
            EVENT_MESSAGE => self.on_message(&event.data)?,
            EVENT_DONE => self.on_done(&event.data),
            EVENT_ERROR => self.on_error_event(&event.data)?,
            other => {
                tracing::debug!("Ignoring unhandled event type: {}", other);
                return None;
            }
        };

        if let Some(reason) = delivery.close {
            self.close(reason);
        }
        Some(delivery)
    }

    /// The connection failed underneath the event stream
    pub fn on_transport_error(&mut self) -> Option<Delivery> {
        if self.closed.is_some() || self.error_reported {
            return None;
        }
        self.error_reported = true;
        self.close(CloseReason::Error);
        Some(Delivery::closing(Chunk::connection_error(), CloseReason::Error))
    }

    fn on_message(&mut self, data: &str) -> Option<Delivery> {
        match serde_json::from_str::<Chunk>(data) {
            Ok(chunk) if chunk.is_done() => Some(Delivery::closing(chunk, CloseReason::Done)),
            Ok(chunk) => Some(Delivery::keep_open(chunk)),
            Err(e) => {
                // The connection survives malformed frames
                tracing::error!("Error parsing chunk: {}", e);
                None
            }
        }
    }

    fn on_done(&mut self, data: &str) -> Delivery {
        let mut chunk = serde_json::from_str::<Chunk>(data).unwrap_or_default();
        if chunk.event.is_none() {
            chunk.event = Some(EVENT_DONE.to_string());
        }
        Delivery::closing(chunk, CloseReason::Done)
    }

    fn on_error_event(&mut self, data: &str) -> Option<Delivery> {
        let payload = match serde_json::from_str::<Chunk>(data) {
            Ok(payload) => payload,
            Err(_) => {
                tracing::debug!("Ignoring error event without a JSON payload");
                return None;
            }
        };

        // An empty message does not count as an error
        let has_error = payload.error.as_deref().map_or(false, |e| !e.is_empty());
        if !has_error && payload.status != Some(401) {
            return None;
        }

        self.error_reported = true;
        let message = payload
            .error
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| UNAUTHORIZED_FALLBACK.to_string());
        Some(Delivery::closing(Chunk::error(message, Some(401)), CloseReason::Error))
    }
}
