// stream-client/src/client.rs
use common::{Chunk, Config};
use reqwest::Client;
use crate::connection::StreamConnection;

/// Sends chat queries to the relay and streams the answers back
///
/// At most one connection is active per client. Sending a new message
/// closes the previous one first.
pub struct StreamClient {
    http: Client,
    relay_url: String,
    active: Option<StreamConnection>,
}

impl StreamClient {
    pub fn new(relay_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            relay_url: relay_url.into(),
            active: None,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.relay_url.clone())
    }

    pub fn relay_url(&self) -> &str {
        &self.relay_url
    }

    /// Relay URL carrying the percent-encoded message
    pub fn message_url(&self, message: &str) -> String {
        format!("{}?query={}", self.relay_url, urlencoding::encode(message))
    }

    /// Open an event connection for `message`
    ///
    /// `on_chunk` runs once per chunk, in arrival order, and never after the
    /// returned connection is closed.
    ///
    /// Must be called from inside a running actix system; the connection is
    /// an actor and starting it anywhere else panics.
    pub fn send_message<F>(&mut self, message: &str, on_chunk: F) -> StreamConnection
    where
        F: FnMut(Chunk) + 'static,
    {
        self.close();

        let url = self.message_url(message);
        tracing::debug!("Sending message to relay: {}", url);

        let connection = StreamConnection::open(self.http.clone(), url, Box::new(on_chunk));
        self.active = Some(connection.clone());
        connection
    }

    /// Close the active connection, if any
    pub fn close(&mut self) {
        if let Some(previous) = self.active.take() {
            previous.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_url_encodes_query() {
        let client = StreamClient::new("http://localhost:8081/api/chat");
        assert_eq!(
            client.message_url("hello world"),
            "http://localhost:8081/api/chat?query=hello%20world"
        );
        assert_eq!(
            client.message_url("a&b=c"),
            "http://localhost:8081/api/chat?query=a%26b%3Dc"
        );
    }

    #[test]
    fn test_from_config_uses_relay_url() {
        let config = Config {
            relay_url: "http://relay.test/api/chat".to_string(),
            ..Config::default()
        };
        assert_eq!(StreamClient::from_config(&config).relay_url(), "http://relay.test/api/chat");
    }
}
