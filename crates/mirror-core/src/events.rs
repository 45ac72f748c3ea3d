//! Notifications emitted while mirroring the remote scene.
//!
//! Every variant of [`SyncEvent`] maps to one [`EventKind`]; subscribers
//! register per kind on the [`EventBus`](crate::bus::EventBus).

use std::fmt;

use serde_json::Value;

use crate::bus::BusEvent;
use crate::store::DataStore;

/// Scope used for add/remove notifications about scenes.
pub const SCENES_SCOPE: &str = "scenes";

/// Event names subscribers can register for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Handshake received; the mirror is live.
    Open,
    /// Channel closed after a handshake.
    Close,
    /// Transport error passed through.
    Error,
    /// Context replaced.
    Context,
    /// Data diff merged.
    Data,
    /// Scene stored or removed.
    Scene,
    /// Object or scene appeared.
    Add,
    /// Object or scene removed.
    Remove,
    /// Inbound message could not be decoded.
    BadFormat,
    /// Inbound message decoded but its tag is not recognized.
    UnknownMessage,
}

impl EventKind {
    /// All kinds, in declaration order.
    pub const ALL: [Self; 10] = [
        Self::Open,
        Self::Close,
        Self::Error,
        Self::Context,
        Self::Data,
        Self::Scene,
        Self::Add,
        Self::Remove,
        Self::BadFormat,
        Self::UnknownMessage,
    ];

    /// Wire-style event name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Close => "close",
            Self::Error => "error",
            Self::Context => "context",
            Self::Data => "data",
            Self::Scene => "scene",
            Self::Add => "add",
            Self::Remove => "remove",
            Self::BadFormat => "badFormat",
            Self::UnknownMessage => "unknownMessage",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A notification about the mirrored state or the connection.
#[derive(Clone, Debug, PartialEq)]
pub enum SyncEvent {
    /// First handshake of a connection.
    Open {
        /// Handshake payload sent by the producer.
        info: Value,
    },
    /// The channel closed after a handshake.
    Close,
    /// The transport reported an error.
    Error {
        /// Transport error text, passed through verbatim.
        error: String,
    },
    /// The context was replaced.
    Context {
        /// New context value.
        context: Value,
    },
    /// A data diff was merged.
    Data {
        /// Full data store after the merge.
        store: DataStore,
        /// The diff, after axis remapping.
        diff: Value,
    },
    /// A scene was stored or removed.
    Scene {
        /// Scene name.
        name: String,
        /// Stored scene, or `None` when removed.
        scene: Option<Value>,
    },
    /// An object or a scene appeared.
    Add {
        /// Data collection name, or [`SCENES_SCOPE`].
        scope: String,
        /// Object or scene name.
        name: String,
    },
    /// An object or a scene was removed.
    Remove {
        /// Data collection name, or [`SCENES_SCOPE`].
        scope: String,
        /// Object or scene name.
        name: String,
    },
    /// An inbound payload failed to decode.
    BadFormat {
        /// The undecoded payload.
        raw: Vec<u8>,
    },
    /// An inbound message had no recognized tag.
    UnknownMessage {
        /// The decoded message.
        message: Value,
    },
}

impl SyncEvent {
    /// Kind used to look up subscribers.
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Open { .. } => EventKind::Open,
            Self::Close => EventKind::Close,
            Self::Error { .. } => EventKind::Error,
            Self::Context { .. } => EventKind::Context,
            Self::Data { .. } => EventKind::Data,
            Self::Scene { .. } => EventKind::Scene,
            Self::Add { .. } => EventKind::Add,
            Self::Remove { .. } => EventKind::Remove,
            Self::BadFormat { .. } => EventKind::BadFormat,
            Self::UnknownMessage { .. } => EventKind::UnknownMessage,
        }
    }

    /// Event name, e.g. `"add"`.
    pub fn event_type(&self) -> &'static str {
        self.kind().as_str()
    }
}

impl BusEvent for SyncEvent {
    type Kind = EventKind;

    fn kind(&self) -> EventKind {
        SyncEvent::kind(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn kind_names_match_wire_names() {
        let names: Vec<&str> = EventKind::ALL.iter().map(|k| k.as_str()).collect();
        assert_eq!(
            names,
            [
                "open",
                "close",
                "error",
                "context",
                "data",
                "scene",
                "add",
                "remove",
                "badFormat",
                "unknownMessage"
            ]
        );
    }

    #[test]
    fn event_kind_lookup() {
        let evt = SyncEvent::Add {
            scope: "objects".into(),
            name: "Cube".into(),
        };
        assert_eq!(evt.kind(), EventKind::Add);
        assert_eq!(evt.event_type(), "add");

        let evt = SyncEvent::UnknownMessage {
            message: json!(["nonsense", 1, 2]),
        };
        assert_eq!(evt.event_type(), "unknownMessage");
    }

    #[test]
    fn display_uses_event_name() {
        assert_eq!(EventKind::BadFormat.to_string(), "badFormat");
    }
}
