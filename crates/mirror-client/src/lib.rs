//! # mirror-client
//!
//! Keeps a local mirror of a remote 3D scene in sync over a duplex channel.
//!
//! - Codec: [`JsonCodec`] turns tagged tuples into bytes and back
//! - Transport: [`Connector`]/[`Channel`] abstraction with an in-memory
//!   implementation and a `tokio-tungstenite` WebSocket one
//! - Protocol: [`ProtocolRouter`] dispatches `handshake`/`context`/`data`/`scene`
//!   messages through a route table and applies axis remapping
//! - Client: [`SyncClient`] owns the channel lifecycle, emits [`SyncEvent`]s
//!   and sends outbound updates

#![deny(unsafe_code)]

pub mod client;
pub mod codec;
pub mod config;
pub mod errors;
pub mod protocol;
pub mod transport;

pub use client::{ClientOptions, SyncClient};
pub use codec::{Codec, JsonCodec};
pub use config::ConnectionConfig;
pub use errors::{ClientError, CodecError, Result, TransportError};
pub use mirror_core::{EventKind, SyncEvent};
pub use protocol::{ProtocolRouter, ProtocolState};
pub use transport::{Channel, ChannelEvent, Connection, Connector, MemoryConnector, WebSocketConnector};
