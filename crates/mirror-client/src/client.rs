//! Connection manager.
//!
//! [`SyncClient`] owns one channel at a time, feeds everything the channel
//! reports through the [`ProtocolRouter`], and emits the resulting events on
//! its [`EventBus`]. Channel events are processed one by one, either drained
//! with [`SyncClient::poll_pending`] from a host loop or awaited with
//! [`SyncClient::process_next`] / [`SyncClient::run`].

use std::sync::Arc;

use mirror_core::{AxisSpec, DataStore, EventBus, EventKind, Handler, HandlerError, SceneStore, StateStore, SyncEvent};
use mirror_settings::{DEFAULT_HANDSHAKE_TAG, DEFAULT_URL, MirrorSettings};
use serde_json::Value;
use tokio::sync::mpsc::error::TryRecvError;
use tracing::{debug, info, instrument, warn};

use crate::codec::{Codec, JsonCodec};
use crate::config::ConnectionConfig;
use crate::errors::{Result, TransportError};
use crate::protocol::{self, ProtocolRouter, ProtocolState};
use crate::transport::{ChannelEvent, Connection, Connector};

/// Construction options for [`SyncClient`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientOptions {
    /// Axis mapping applied to inbound positional data.
    pub axes: AxisSpec,
    /// Tag of the producer's greeting.
    pub handshake_tag: String,
    /// Endpoint used when `open` is given no `url`.
    pub default_url: String,
}

impl ClientOptions {
    /// Build options from loaded settings.
    pub fn from_settings(settings: &MirrorSettings) -> Result<Self> {
        Ok(Self {
            axes: settings.connection.axes.parse()?,
            handshake_tag: settings.connection.handshake_tag.clone(),
            default_url: settings.connection.url.clone(),
        })
    }
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            axes: AxisSpec::IDENTITY,
            handshake_tag: DEFAULT_HANDSHAKE_TAG.to_owned(),
            default_url: DEFAULT_URL.to_owned(),
        }
    }
}

/// Mirrors a remote scene over one channel at a time.
pub struct SyncClient {
    connector: Box<dyn Connector>,
    router: ProtocolRouter,
    bus: EventBus<SyncEvent>,
    connection: Option<Connection>,
    default_url: String,
}

impl SyncClient {
    /// Create a client with default options and the JSON codec.
    pub fn new(connector: impl Connector + 'static) -> Self {
        Self::with_options(connector, ClientOptions::default())
    }

    /// Create a client with explicit options and the JSON codec.
    pub fn with_options(connector: impl Connector + 'static, options: ClientOptions) -> Self {
        Self::with_codec(connector, options, Arc::new(JsonCodec))
    }

    /// Create a client with a custom codec.
    pub fn with_codec(
        connector: impl Connector + 'static,
        options: ClientOptions,
        codec: Arc<dyn Codec>,
    ) -> Self {
        let mut router = ProtocolRouter::new(codec, &options.handshake_tag);
        router.set_axes(options.axes);
        Self {
            connector: Box::new(connector),
            router,
            bus: EventBus::new(),
            connection: None,
            default_url: options.default_url,
        }
    }

    // ── Subscribers ─────────────────────────────────────────────────────

    /// Register `f` for `kind` and return the handler for later removal.
    pub fn on<F>(&mut self, kind: EventKind, f: F) -> Handler<SyncEvent>
    where
        F: Fn(&SyncEvent) -> std::result::Result<(), HandlerError> + Send + Sync + 'static,
    {
        let handler = self.bus.on(kind, f);
        debug!(%kind, handlers = self.bus.handler_count(kind), "subscriber added");
        handler
    }

    /// Register an existing handler. Registering it twice makes it fire twice.
    pub fn subscribe(&mut self, kind: EventKind, handler: Handler<SyncEvent>) {
        self.bus.subscribe(kind, handler);
        debug!(%kind, handlers = self.bus.handler_count(kind), "subscriber added");
    }

    /// Remove the first registration of `handler` for `kind`.
    pub fn unsubscribe(&mut self, kind: EventKind, handler: &Handler<SyncEvent>) -> bool {
        self.bus.unsubscribe(kind, handler)
    }

    // ── State ───────────────────────────────────────────────────────────

    /// Parse and apply an axis spec such as `"x-zy"`.
    ///
    /// Only values received afterwards are remapped.
    pub fn set_axes(&mut self, spec: &str) -> Result<()> {
        let axes: AxisSpec = spec.parse()?;
        debug!(%axes, "axes configured");
        self.router.set_axes(axes);
        Ok(())
    }

    /// Handshake state of the current connection.
    pub fn state(&self) -> ProtocolState {
        self.router.state()
    }

    /// Whether the producer's handshake has been received.
    pub fn is_connected(&self) -> bool {
        self.router.state() == ProtocolState::Connected
    }

    /// Whether a channel is open or opening.
    pub fn has_channel(&self) -> bool {
        self.connection.is_some()
    }

    /// The mirrored state.
    pub fn store(&self) -> &StateStore {
        self.router.store()
    }

    /// Current context.
    pub fn context(&self) -> &Value {
        self.router.store().context()
    }

    /// Current data collections.
    pub fn data(&self) -> &DataStore {
        self.router.store().data()
    }

    /// Current scenes.
    pub fn scenes(&self) -> &SceneStore {
        self.router.store().scenes()
    }

    // ── Lifecycle ───────────────────────────────────────────────────────

    /// Open a channel. Does nothing while one is already active.
    ///
    /// `config` is merged over `{ "url": default_url }`; pass `Value::Null`
    /// for the defaults. The mirror is cleared before connecting. A
    /// connector that fails synchronously leaves the client disconnected
    /// and returns the error.
    #[instrument(skip_all)]
    pub fn open(&mut self, config: Value) -> Result<()> {
        if self.connection.is_some() {
            debug!("channel already active, open ignored");
            return Ok(());
        }
        let config = ConnectionConfig::resolve(&self.default_url, config)?;
        self.router.begin_connection();

        match self.connector.connect(&config) {
            Ok(connection) => {
                info!(url = %config.url, "connecting");
                self.connection = Some(connection);
                Ok(())
            }
            Err(e) => {
                warn!(url = %config.url, error = %e, "connect failed");
                let _ = self.router.end_connection();
                Err(e.into())
            }
        }
    }

    /// Ask the channel to close.
    ///
    /// The client keeps its channel until the closure is reported back
    /// through the event queue; the close event fires then.
    pub fn close(&mut self) {
        if let Some(connection) = self.connection.as_mut() {
            debug!("closing channel");
            connection.channel.close();
        }
    }

    // ── Outbound ────────────────────────────────────────────────────────

    /// Send `["context", context]`. Returns `false` when no channel is
    /// active and the message was dropped.
    pub fn send_context(&mut self, context: Value) -> Result<bool> {
        self.send(&protocol::context_message(context))
    }

    /// Send `["data", diff]`.
    pub fn send_data(&mut self, diff: Value) -> Result<bool> {
        self.send(&protocol::data_message(diff))
    }

    /// Send `["scene", name, diff]`.
    pub fn send_scene(&mut self, name: &str, diff: Value) -> Result<bool> {
        self.send(&protocol::scene_message(name, diff))
    }

    /// Ask the producer to jump `scene` to `frame`.
    pub fn send_frame(&mut self, scene: &str, frame: i64) -> Result<bool> {
        self.send(&protocol::frame_message(scene, frame))
    }

    fn send(&mut self, message: &Value) -> Result<bool> {
        let Some(connection) = self.connection.as_mut() else {
            debug!("no active channel, outbound message dropped");
            return Ok(false);
        };
        let payload = self.router.encode(message)?;
        connection.channel.send(payload)?;
        Ok(true)
    }

    // ── Inbound ─────────────────────────────────────────────────────────

    /// Route one inbound payload and emit its events in order.
    ///
    /// A failing subscriber stops the emission; events of the same message
    /// that were not yet emitted are dropped, state changes are kept.
    pub fn handle_message(&mut self, raw: &[u8]) -> Result<()> {
        for event in self.router.route_raw(raw) {
            self.bus.emit(&event)?;
        }
        Ok(())
    }

    /// Pass a transport error to subscribers.
    pub fn handle_error(&mut self, error: &TransportError) -> Result<()> {
        self.bus.emit(&SyncEvent::Error {
            error: error.to_string(),
        })?;
        Ok(())
    }

    /// Drop the channel and emit the close event if a handshake was seen.
    pub fn handle_close(&mut self) -> Result<()> {
        self.connection = None;
        if let Some(event) = self.router.end_connection() {
            self.bus.emit(&event)?;
        }
        Ok(())
    }

    /// Dispatch one channel event.
    pub fn handle_channel_event(&mut self, event: ChannelEvent) -> Result<()> {
        match event {
            ChannelEvent::Message(raw) => self.handle_message(&raw),
            ChannelEvent::Error(error) => self.handle_error(&error),
            ChannelEvent::Closed => self.handle_close(),
        }
    }

    /// Process every channel event that is ready, without waiting.
    ///
    /// Returns the number of events processed.
    pub fn poll_pending(&mut self) -> Result<usize> {
        let mut processed = 0;
        loop {
            let next = match self.connection.as_mut() {
                Some(connection) => connection.events.try_recv(),
                None => break,
            };
            let event = match next {
                Ok(event) => event,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => ChannelEvent::Closed,
            };
            processed += 1;
            self.handle_channel_event(event)?;
        }
        Ok(processed)
    }

    /// Wait for the next channel event and process it.
    ///
    /// Returns `false` without waiting when no channel is active.
    pub async fn process_next(&mut self) -> Result<bool> {
        let Some(connection) = self.connection.as_mut() else {
            return Ok(false);
        };
        let event = connection.events.recv().await.unwrap_or(ChannelEvent::Closed);
        self.handle_channel_event(event)?;
        Ok(true)
    }

    /// Process channel events until the channel closes.
    pub async fn run(&mut self) -> Result<()> {
        while self.process_next().await? {}
        Ok(())
    }
}

impl std::fmt::Debug for SyncClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncClient")
            .field("router", &self.router)
            .field("bus", &self.bus)
            .field("has_channel", &self.connection.is_some())
            .finish_non_exhaustive()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
