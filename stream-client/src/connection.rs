// stream-client/src/connection.rs
use actix::prelude::*;
use common::{Chunk, SseEvent};
use eventsource_stream::{Event, EventStreamError, Eventsource};
use reqwest::{header, Client, Response};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::watch;
use crate::dispatch::{ChunkDispatcher, CloseReason, Delivery};

const EVENT_STREAM: &str = "text/event-stream";

type StreamItem = Result<Event, EventStreamError<reqwest::Error>>;

/// Callback receiving every chunk of one response, in arrival order
pub type ChunkCallback = Box<dyn FnMut(Chunk)>;

/// Lifecycle of a single event connection; `Closed` is terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed(CloseReason),
}

/// Ask the connection to close on behalf of its owner
#[derive(Message)]
#[rtype(result = "()")]
struct CloseConnection;

/// Actor owning one event connection to the relay
///
/// Decoded events arrive through the stream handler one at a time, so the
/// callback is never invoked concurrently and sees chunks in wire order.
struct ConnectionActor {
    http: Client,
    url: String,
    dispatcher: ChunkDispatcher,
    on_chunk: ChunkCallback,
    state: watch::Sender<ConnectionState>,
    cancelled: Arc<AtomicBool>,
}

// An empty name falls back to `message` downstream
fn to_sse_event(event: Event) -> SseEvent {
    SseEvent {
        event: Some(event.event).filter(|name| !name.is_empty()),
        data: event.data,
    }
}

impl ConnectionActor {
    fn deliver(&mut self, delivery: Delivery, ctx: &mut Context<Self>) {
        (self.on_chunk)(delivery.chunk);
        if let Some(reason) = delivery.close {
            self.finish(reason, ctx);
        }
    }

    fn finish(&mut self, reason: CloseReason, ctx: &mut Context<Self>) {
        self.dispatcher.close(reason);
        if let Some(reason) = self.dispatcher.closed() {
            self.state.send_replace(ConnectionState::Closed(reason));
        }
        ctx.stop();
    }

    // Report a failed connection unless an error already went out
    fn fail(&mut self, ctx: &mut Context<Self>) {
        match self.dispatcher.on_transport_error() {
            Some(delivery) => self.deliver(delivery, ctx),
            None => self.finish(CloseReason::Error, ctx),
        }
    }

    // Caller closes take effect before anything else is delivered
    fn check_cancelled(&mut self, ctx: &mut Context<Self>) -> bool {
        if self.cancelled.load(Ordering::Acquire) {
            self.finish(CloseReason::Caller, ctx);
            return true;
        }
        self.dispatcher.closed().is_some()
    }

    fn on_response(&mut self, result: reqwest::Result<Response>, ctx: &mut Context<Self>) {
        if self.check_cancelled(ctx) {
            return;
        }

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("Event connection to {} failed: {}", self.url, e);
                self.fail(ctx);
                return;
            }
        };

        let is_event_stream = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.starts_with(EVENT_STREAM))
            .unwrap_or(false);

        if !response.status().is_success() || !is_event_stream {
            tracing::error!(
                "Event connection to {} refused with status {}",
                self.url,
                response.status().as_u16()
            );
            self.fail(ctx);
            return;
        }

        self.state.send_replace(ConnectionState::Open);
        ctx.add_stream(response.bytes_stream().eventsource());
    }
}

impl Actor for ConnectionActor {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        tracing::debug!("Opening event connection: {}", self.url);

        let request = self
            .http
            .get(&self.url)
            .header(header::ACCEPT, EVENT_STREAM)
            .send();

        ctx.spawn(
            request
                .into_actor(self)
                .map(|result, act, ctx| act.on_response(result, ctx)),
        );
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        // Dropped without a terminal event, e.g. the system shut down
        if self.dispatcher.close(CloseReason::Caller) {
            self.state.send_replace(ConnectionState::Closed(CloseReason::Caller));
        }
        tracing::debug!("Event connection closed: {}", self.url);
    }
}

impl StreamHandler<StreamItem> for ConnectionActor {
    fn handle(&mut self, item: StreamItem, ctx: &mut Self::Context) {
        if self.check_cancelled(ctx) {
            return;
        }

        let event = match item {
            Ok(event) => event,
            Err(e) => {
                tracing::error!("Event stream from {} broke: {}", self.url, e);
                self.fail(ctx);
                return;
            }
        };

        if let Some(delivery) = self.dispatcher.on_event(&to_sse_event(event)) {
            self.deliver(delivery, ctx);
        }
    }

    fn finished(&mut self, ctx: &mut Self::Context) {
        if self.dispatcher.closed().is_none() {
            // No reconnect: a stream ending without a terminal event is a failure
            tracing::warn!("Event stream from {} ended without a done event", self.url);
            self.fail(ctx);
        }
    }
}

impl Handler<CloseConnection> for ConnectionActor {
    type Result = ();

    fn handle(&mut self, _msg: CloseConnection, ctx: &mut Self::Context) -> Self::Result {
        self.finish(CloseReason::Caller, ctx);
    }
}

/// Handle to one event connection
///
/// Must be created from inside a running actix system.
#[derive(Clone)]
pub struct StreamConnection {
    addr: Addr<ConnectionActor>,
    state: watch::Receiver<ConnectionState>,
    cancelled: Arc<AtomicBool>,
}

impl StreamConnection {
    pub(crate) fn open(http: Client, url: String, on_chunk: ChunkCallback) -> Self {
        let (state_tx, state_rx) = watch::channel(ConnectionState::Connecting);
        let cancelled = Arc::new(AtomicBool::new(false));

        let addr = ConnectionActor {
            http,
            url,
            dispatcher: ChunkDispatcher::new(),
            on_chunk,
            state: state_tx,
            cancelled: cancelled.clone(),
        }
        .start();

        Self {
            addr,
            state: state_rx,
            cancelled,
        }
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.state(), ConnectionState::Closed(_))
    }

    /// Close the connection; no callback runs after this returns
    pub fn close(&self) {
        if self.is_closed() {
            return;
        }
        self.cancelled.store(true, Ordering::Release);
        self.addr.do_send(CloseConnection);
    }

    /// Wait until the connection reaches its terminal state
    pub async fn closed(&mut self) -> CloseReason {
        loop {
            if let ConnectionState::Closed(reason) = *self.state.borrow_and_update() {
                return reason;
            }
            if self.state.changed().await.is_err() {
                // The actor is gone; whatever it published last is final
                return match *self.state.borrow() {
                    ConnectionState::Closed(reason) => reason,
                    _ => CloseReason::Caller,
                };
            }
        }
    }
}
