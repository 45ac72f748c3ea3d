//! Client error types.

use mirror_core::{AxisSpecError, BusError};
use thiserror::Error;

/// Errors reported by a transport channel or connector.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The connection could not be established.
    #[error("connect failed: {0}")]
    Connect(String),
    /// An outbound frame could not be handed to the channel.
    #[error("send failed: {0}")]
    Send(String),
    /// The peer or the WebSocket layer reported an error.
    #[error("websocket error: {0}")]
    Protocol(String),
    /// `connect` was called outside a tokio runtime.
    #[error("no tokio runtime available to drive the connection")]
    NoRuntime,
}

/// Errors produced by a [`Codec`](crate::codec::Codec).
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CodecError {
    /// The payload is not a valid encoded message.
    #[error("failed to decode message: {0}")]
    Decode(String),
    /// The message could not be encoded.
    #[error("failed to encode message: {0}")]
    Encode(String),
}

/// Errors returned by [`SyncClient`](crate::client::SyncClient) operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport failure.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// Outbound encoding failure.
    #[error(transparent)]
    Codec(#[from] CodecError),
    /// A subscriber handler failed during emission.
    #[error(transparent)]
    Subscriber(#[from] BusError),
    /// Malformed axis specification.
    #[error(transparent)]
    Axes(#[from] AxisSpecError),
    /// The merged connection config is unusable.
    #[error("invalid connection config: {0}")]
    Config(String),
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_error_display() {
        let err = TransportError::Connect("refused".into());
        assert_eq!(err.to_string(), "connect failed: refused");
        assert!(TransportError::NoRuntime.to_string().contains("tokio runtime"));
    }

    #[test]
    fn client_error_is_transparent() {
        let err: ClientError = TransportError::Send("closed".into()).into();
        assert_eq!(err.to_string(), "send failed: closed");

        let err: ClientError = CodecError::Decode("eof".into()).into();
        assert_eq!(err.to_string(), "failed to decode message: eof");
    }

    #[test]
    fn config_error_display() {
        let err = ClientError::Config("missing url".into());
        assert_eq!(err.to_string(), "invalid connection config: missing url");
    }
}
