//! In-process transport.
//!
//! [`MemoryConnector`] hands out channels whose traffic stays in memory. A
//! clone of the connector acts as the remote peer: it can deliver messages,
//! errors and closure to the client, and inspect what the client sent.

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::mpsc;

use super::{Channel, ChannelEvent, Connection, Connector};
use crate::config::ConnectionConfig;
use crate::errors::TransportError;

#[derive(Default)]
struct Shared {
    events: Option<mpsc::UnboundedSender<ChannelEvent>>,
    sent: Vec<Vec<u8>>,
    configs: Vec<ConnectionConfig>,
    close_requests: usize,
    refuse_next: Option<String>,
}

/// Connector whose peer is driven by the test or host code.
#[derive(Clone, Default)]
pub struct MemoryConnector {
    shared: Arc<Mutex<Shared>>,
}

impl MemoryConnector {
    /// Create a connector with no live connection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `connect` fail with `reason`.
    pub fn refuse_next(&self, reason: impl Into<String>) {
        self.shared.lock().refuse_next = Some(reason.into());
    }

    /// Push an event to the current connection.
    ///
    /// Returns `false` if nothing is connected or the client dropped it.
    pub fn deliver(&self, event: ChannelEvent) -> bool {
        self.shared
            .lock()
            .events
            .as_ref()
            .is_some_and(|tx| tx.send(event).is_ok())
    }

    /// Deliver a raw text message.
    pub fn deliver_text(&self, text: &str) -> bool {
        self.deliver(ChannelEvent::Message(text.as_bytes().to_vec()))
    }

    /// Deliver a JSON message.
    pub fn deliver_json(&self, message: &Value) -> bool {
        self.deliver(ChannelEvent::Message(message.to_string().into_bytes()))
    }

    /// Deliver a transport error.
    pub fn fail(&self, error: TransportError) -> bool {
        self.deliver(ChannelEvent::Error(error))
    }

    /// Close the connection from the peer side.
    pub fn hang_up(&self) -> bool {
        let delivered = self.deliver(ChannelEvent::Closed);
        self.shared.lock().events = None;
        delivered
    }

    /// Every payload the client sent, oldest first.
    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.shared.lock().sent.clone()
    }

    /// Sent payloads parsed as JSON; unparsable ones are skipped.
    pub fn sent_json(&self) -> Vec<Value> {
        self.shared
            .lock()
            .sent
            .iter()
            .filter_map(|raw| serde_json::from_slice(raw).ok())
            .collect()
    }

    /// Number of successful `connect` calls.
    pub fn connect_count(&self) -> usize {
        self.shared.lock().configs.len()
    }

    /// Config used by the most recent successful `connect`.
    pub fn last_config(&self) -> Option<ConnectionConfig> {
        self.shared.lock().configs.last().cloned()
    }

    /// Number of times the client asked to close.
    pub fn close_requests(&self) -> usize {
        self.shared.lock().close_requests
    }
}

impl Connector for MemoryConnector {
    fn connect(&mut self, config: &ConnectionConfig) -> Result<Connection, TransportError> {
        let mut shared = self.shared.lock();
        if let Some(reason) = shared.refuse_next.take() {
            return Err(TransportError::Connect(reason));
        }
        let (tx, rx) = mpsc::unbounded_channel();
        shared.events = Some(tx.clone());
        shared.configs.push(config.clone());
        Ok(Connection {
            channel: Box::new(MemoryChannel {
                shared: Arc::clone(&self.shared),
                events: tx,
            }),
            events: rx,
        })
    }
}

struct MemoryChannel {
    shared: Arc<Mutex<Shared>>,
    events: mpsc::UnboundedSender<ChannelEvent>,
}

impl Channel for MemoryChannel {
    fn send(&mut self, payload: Vec<u8>) -> Result<(), TransportError> {
        self.shared.lock().sent.push(payload);
        Ok(())
    }

    fn close(&mut self) {
        self.shared.lock().close_requests += 1;
        // closure is acknowledged through the queue, never synchronously
        let _ = self.events.send(ChannelEvent::Closed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config() -> ConnectionConfig {
        ConnectionConfig::resolve("ws://test", Value::Null).unwrap()
    }

    #[test]
    fn deliver_without_connection_fails() {
        let peer = MemoryConnector::new();
        assert!(!peer.deliver_text("[]"));
    }

    #[test]
    fn delivered_events_arrive_in_order() {
        let mut connector = MemoryConnector::new();
        let peer = connector.clone();
        let mut conn = connector.connect(&config()).unwrap();

        assert!(peer.deliver_json(&json!(["handshake", {}])));
        assert!(peer.fail(TransportError::Protocol("reset".into())));
        assert!(peer.hang_up());

        assert_eq!(
            conn.events.try_recv().unwrap(),
            ChannelEvent::Message(br#"["handshake",{}]"#.to_vec())
        );
        assert!(matches!(conn.events.try_recv().unwrap(), ChannelEvent::Error(_)));
        assert_eq!(conn.events.try_recv().unwrap(), ChannelEvent::Closed);
        assert!(!peer.deliver_text("late"));
    }

    #[test]
    fn channel_records_sends_and_close() {
        let mut connector = MemoryConnector::new();
        let peer = connector.clone();
        let mut conn = connector.connect(&config()).unwrap();

        conn.channel.send(b"[\"context\",{}]".to_vec()).unwrap();
        conn.channel.close();

        assert_eq!(peer.sent_json(), vec![json!(["context", {}])]);
        assert_eq!(peer.close_requests(), 1);
        assert_eq!(conn.events.try_recv().unwrap(), ChannelEvent::Closed);
    }

    #[test]
    fn refused_connect_is_an_error() {
        let mut connector = MemoryConnector::new();
        connector.refuse_next("nobody home");
        let err = connector.connect(&config()).unwrap_err();
        assert_eq!(err, TransportError::Connect("nobody home".into()));
        assert_eq!(connector.connect_count(), 0);
        assert!(connector.connect(&config()).is_ok());
        assert_eq!(connector.last_config().unwrap().url, "ws://test");
    }
}
