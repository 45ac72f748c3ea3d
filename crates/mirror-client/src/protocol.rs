//! Inbound message routing.
//!
//! Every inbound unit decodes to a tagged tuple `[tag, ...payload]`. The
//! router looks the tag up in its route table, applies the axis remap to
//! positional fields, mutates the [`StateStore`] and returns the events to
//! emit, add/remove notifications first and the summary event last.

use std::collections::HashMap;
use std::sync::Arc;

use mirror_core::axis::{DATA_VECTOR_FIELDS, SCENE_VECTOR_FIELDS};
use mirror_core::{AxisSpec, StateStore, SyncEvent};
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::codec::Codec;
use crate::errors::CodecError;

/// Tag of a context replacement.
pub const CONTEXT_TAG: &str = "context";
/// Tag of a data diff.
pub const DATA_TAG: &str = "data";
/// Tag of a scene update.
pub const SCENE_TAG: &str = "scene";

/// Handshake progress of the current connection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ProtocolState {
    /// No channel.
    #[default]
    Disconnected,
    /// Channel opening or open, no handshake yet.
    AwaitingHandshake,
    /// Handshake received.
    Connected,
}

/// A route receives the whole decoded tuple, tag included.
type Route = fn(&mut ProtocolRouter, Vec<Value>) -> Vec<SyncEvent>;

/// Decodes inbound messages and applies them to the mirrored state.
pub struct ProtocolRouter {
    state: ProtocolState,
    axes: AxisSpec,
    store: StateStore,
    codec: Arc<dyn Codec>,
    routes: HashMap<String, Route>,
}

impl ProtocolRouter {
    /// Create a router greeting on `handshake_tag`.
    ///
    /// The handshake route is registered last, so a handshake tag equal to
    /// one of the fixed tags takes that tag over.
    pub fn new(codec: Arc<dyn Codec>, handshake_tag: &str) -> Self {
        let mut routes: HashMap<String, Route> = HashMap::new();
        let _ = routes.insert(CONTEXT_TAG.to_owned(), Self::on_context);
        let _ = routes.insert(DATA_TAG.to_owned(), Self::on_data);
        let _ = routes.insert(SCENE_TAG.to_owned(), Self::on_scene);
        let _ = routes.insert(handshake_tag.to_owned(), Self::on_handshake);
        Self {
            state: ProtocolState::Disconnected,
            axes: AxisSpec::IDENTITY,
            store: StateStore::new(),
            codec,
            routes,
        }
    }

    /// Current handshake state.
    pub fn state(&self) -> ProtocolState {
        self.state
    }

    /// Mirrored state.
    pub fn store(&self) -> &StateStore {
        &self.store
    }

    /// Active axis mapping.
    pub fn axes(&self) -> &AxisSpec {
        &self.axes
    }

    /// Replace the axis mapping. Already stored values are not remapped.
    pub fn set_axes(&mut self, axes: AxisSpec) {
        self.axes = axes;
    }

    /// Whether `tag` has a route.
    pub fn has_route(&self, tag: &str) -> bool {
        self.routes.contains_key(tag)
    }

    /// Routed tags, sorted.
    pub fn tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = self.routes.keys().cloned().collect();
        tags.sort();
        tags
    }

    /// Encode an outbound message with the router's codec.
    pub fn encode(&self, message: &Value) -> Result<Vec<u8>, CodecError> {
        self.codec.encode(message)
    }

    /// A new connection attempt starts: clear the mirror and wait for the
    /// handshake.
    pub fn begin_connection(&mut self) {
        self.store.reset();
        self.state = ProtocolState::AwaitingHandshake;
    }

    /// The channel closed. Returns the close event if a handshake had been
    /// received. The mirror is kept until the next connection.
    pub fn end_connection(&mut self) -> Option<SyncEvent> {
        let previous = std::mem::take(&mut self.state);
        if previous == ProtocolState::Connected {
            info!("mirror closed");
            Some(SyncEvent::Close)
        } else {
            None
        }
    }

    /// Decode and route one raw inbound unit.
    pub fn route_raw(&mut self, raw: &[u8]) -> Vec<SyncEvent> {
        match self.codec.decode(raw) {
            Ok(message) => self.route(message),
            Err(e) => {
                warn!(error = %e, len = raw.len(), "discarding undecodable message");
                vec![SyncEvent::BadFormat { raw: raw.to_vec() }]
            }
        }
    }

    /// Route one decoded message.
    pub fn route(&mut self, message: Value) -> Vec<SyncEvent> {
        let route = message
            .as_array()
            .and_then(|items| items.first())
            .and_then(Value::as_str)
            .and_then(|tag| self.routes.get(tag).copied());

        match (route, message) {
            (Some(route), Value::Array(items)) => {
                debug!(tag = items[0].as_str().unwrap_or_default(), "routing message");
                route(self, items)
            }
            (_, message) => unknown(message),
        }
    }

    fn on_handshake(&mut self, mut items: Vec<Value>) -> Vec<SyncEvent> {
        if self.state == ProtocolState::Connected {
            debug!("repeated handshake ignored");
            return Vec::new();
        }
        self.state = ProtocolState::Connected;
        let info = take_item(&mut items, 1);
        info!(%info, "mirror open");
        vec![SyncEvent::Open { info }]
    }

    fn on_context(&mut self, mut items: Vec<Value>) -> Vec<SyncEvent> {
        let context = take_item(&mut items, 1);
        self.store.replace_context(context.clone());
        vec![SyncEvent::Context { context }]
    }

    fn on_data(&mut self, mut items: Vec<Value>) -> Vec<SyncEvent> {
        let mut diff = take_item(&mut items, 1);
        if !self.axes.is_identity() {
            remap_data(&self.axes, &mut diff);
        }

        let mut events: Vec<SyncEvent> = self
            .store
            .merge_data(&diff)
            .into_iter()
            .map(SyncEvent::from)
            .collect();
        events.push(SyncEvent::Data {
            store: self.store.data().clone(),
            diff,
        });
        events
    }

    fn on_scene(&mut self, mut items: Vec<Value>) -> Vec<SyncEvent> {
        let Some(name) = items.get(1).and_then(Value::as_str).map(str::to_owned) else {
            warn!("scene message without a name");
            return unknown(Value::Array(items));
        };
        let mut scene = (items.len() > 2).then(|| items.swap_remove(2));
        let remap = !self.axes.is_identity();
        if let Some(Value::Object(record)) = scene.as_mut().filter(|_| remap) {
            self.axes.transform_fields(record, &SCENE_VECTOR_FIELDS);
        }

        let update = self.store.set_scene(&name, scene);
        let mut events: Vec<SyncEvent> = update.change.into_iter().map(SyncEvent::from).collect();
        events.push(SyncEvent::Scene {
            name,
            scene: update.stored,
        });
        events
    }
}

impl std::fmt::Debug for ProtocolRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProtocolRouter")
            .field("state", &self.state)
            .field("axes", &self.axes)
            .field("tags", &self.tags())
            .finish_non_exhaustive()
    }
}

fn unknown(message: Value) -> Vec<SyncEvent> {
    warn!(%message, "unrecognized message");
    vec![SyncEvent::UnknownMessage { message }]
}

fn take_item(items: &mut [Value], index: usize) -> Value {
    items.get_mut(index).map(Value::take).unwrap_or_default()
}

fn remap_data(axes: &AxisSpec, diff: &mut Value) {
    let Some(collections) = diff.as_object_mut() else {
        return;
    };
    for records in collections.values_mut().filter_map(Value::as_object_mut) {
        for record in records.values_mut().filter_map(Value::as_object_mut) {
            axes.transform_fields(record, &DATA_VECTOR_FIELDS);
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Outbound messages
// ─────────────────────────────────────────────────────────────────────────────

/// `["context", context]`
pub fn context_message(context: Value) -> Value {
    json!([CONTEXT_TAG, context])
}

/// `["data", diff]`
pub fn data_message(diff: Value) -> Value {
    json!([DATA_TAG, diff])
}

/// `["scene", name, diff]`
pub fn scene_message(name: &str, diff: Value) -> Value {
    json!([SCENE_TAG, name, diff])
}

/// `["scene", name, {"frame": frame}]`, the producer's frame-change request.
pub fn frame_message(scene: &str, frame: i64) -> Value {
    scene_message(scene, json!({ "frame": frame }))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
