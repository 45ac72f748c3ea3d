//! WebSocket transport over `tokio-tungstenite`.
//!
//! `connect` spawns one pump task per connection. The task owns the socket:
//! it forwards inbound frames to the event queue and writes outbound frames
//! from the channel. Connection failures surface as
//! [`ChannelEvent::Error`] followed by [`ChannelEvent::Closed`].

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, instrument, warn};

use super::{Channel, ChannelEvent, Connection, Connector};
use crate::config::ConnectionConfig;
use crate::errors::TransportError;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Frame handed from the channel to the pump task.
#[derive(Debug)]
enum Outbound {
    Frame(Vec<u8>),
    Close,
}

/// Connector opening WebSocket connections on the current tokio runtime.
#[derive(Clone, Copy, Debug, Default)]
pub struct WebSocketConnector;

impl WebSocketConnector {
    /// Create a connector.
    pub fn new() -> Self {
        Self
    }
}

impl Connector for WebSocketConnector {
    fn connect(&mut self, config: &ConnectionConfig) -> Result<Connection, TransportError> {
        let runtime =
            tokio::runtime::Handle::try_current().map_err(|_| TransportError::NoRuntime)?;
        if !config.extra.is_empty() {
            debug!(keys = config.extra.len(), "extra connection options ignored by websocket transport");
        }

        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let _pump = runtime.spawn(pump(config.url.clone(), out_rx, event_tx));

        Ok(Connection {
            channel: Box::new(WebSocketChannel { outbound: out_tx }),
            events: event_rx,
        })
    }
}

struct WebSocketChannel {
    outbound: mpsc::UnboundedSender<Outbound>,
}

impl Channel for WebSocketChannel {
    fn send(&mut self, payload: Vec<u8>) -> Result<(), TransportError> {
        self.outbound
            .send(Outbound::Frame(payload))
            .map_err(|_| TransportError::Send("connection task has stopped".into()))
    }

    fn close(&mut self) {
        let _ = self.outbound.send(Outbound::Close);
    }
}

#[instrument(skip_all, fields(url = %url))]
async fn pump(
    url: String,
    outbound: mpsc::UnboundedReceiver<Outbound>,
    events: mpsc::UnboundedSender<ChannelEvent>,
) {
    match connect_async(url.as_str()).await {
        Ok((ws, _response)) => {
            debug!("websocket connected");
            run_socket(ws, outbound, &events).await;
        }
        Err(e) => {
            // sends must fail once Closed is observable
            drop(outbound);
            warn!(error = %e, "websocket connect failed");
            let _ = events.send(ChannelEvent::Error(TransportError::Connect(e.to_string())));
        }
    }
    debug!("websocket closed");
    let _ = events.send(ChannelEvent::Closed);
}

async fn run_socket(
    ws: WsStream,
    mut outbound: mpsc::UnboundedReceiver<Outbound>,
    events: &mpsc::UnboundedSender<ChannelEvent>,
) {
    let (mut sink, mut stream) = ws.split();
    let mut closing = false;

    loop {
        tokio::select! {
            frame = outbound.recv(), if !closing => {
                match frame {
                    Some(Outbound::Frame(payload)) => {
                        let message = match String::from_utf8(payload) {
                            Ok(text) => Message::text(text),
                            Err(e) => Message::binary(e.into_bytes()),
                        };
                        if let Err(e) = sink.send(message).await {
                            warn!(error = %e, "websocket send failed");
                            let _ = events.send(ChannelEvent::Error(TransportError::Send(e.to_string())));
                            break;
                        }
                    }
                    Some(Outbound::Close) | None => {
                        closing = true;
                        if sink.send(Message::Close(None)).await.is_err() {
                            break;
                        }
                    }
                }
            }
            incoming = stream.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        let _ = events.send(ChannelEvent::Message(text.as_bytes().to_vec()));
                    }
                    Some(Ok(Message::Binary(data))) => {
                        let _ = events.send(ChannelEvent::Message(data.to_vec()));
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!(error = %e, "websocket receive failed");
                        let _ = events.send(ChannelEvent::Error(TransportError::Protocol(e.to_string())));
                        break;
                    }
                }
            }
        }
    }
}
