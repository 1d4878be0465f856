// stream-client/src/lib.rs
//! Client side of the chat relay: one event connection per query, chunks
//! handed to a callback in arrival order.

pub mod client;
pub mod connection;
pub mod dispatch;

pub use client::StreamClient;
pub use connection::{ChunkCallback, ConnectionState, StreamConnection};
pub use dispatch::{ChunkDispatcher, CloseReason, Delivery};
