//! Duplex channel abstraction.
//!
//! A [`Connector`] opens a [`Connection`]: a [`Channel`] for outbound frames
//! plus a queue of [`ChannelEvent`]s carrying everything the peer does
//! (messages, errors, closure). The client drains that queue one event at a
//! time, so inbound processing never overlaps.

pub mod memory;
pub mod websocket;

use tokio::sync::mpsc;

use crate::config::ConnectionConfig;
use crate::errors::TransportError;

pub use memory::MemoryConnector;
pub use websocket::WebSocketConnector;

/// Something that happened on the channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChannelEvent {
    /// One inbound message.
    Message(Vec<u8>),
    /// The transport reported an error.
    Error(TransportError),
    /// The channel is closed; no further events follow.
    Closed,
}

/// Outbound half of an open connection.
pub trait Channel: Send {
    /// Queue one encoded message for transmission.
    fn send(&mut self, payload: Vec<u8>) -> Result<(), TransportError>;

    /// Ask the peer to close. Completion is reported later as
    /// [`ChannelEvent::Closed`].
    fn close(&mut self);
}

/// Opens connections.
pub trait Connector: Send {
    /// Start connecting with `config`.
    ///
    /// Transports that connect asynchronously may return immediately and
    /// report failure later through the event queue.
    fn connect(&mut self, config: &ConnectionConfig) -> Result<Connection, TransportError>;
}

/// An open (or opening) connection.
pub struct Connection {
    /// Outbound half.
    pub channel: Box<dyn Channel>,
    /// Inbound events, in arrival order.
    pub events: mpsc::UnboundedReceiver<ChannelEvent>,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection").finish_non_exhaustive()
    }
}
