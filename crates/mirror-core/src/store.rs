//! Mirrored state: context, data collections, and scenes.
//!
//! Merges are explicit-tombstone: an object leaves its collection only when a
//! diff carries `null` for its name. Names a diff does not mention are left
//! alone.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use tracing::warn;

use crate::events::{SCENES_SCOPE, SyncEvent};

/// Objects of one data collection, keyed by object name.
pub type Collection = Map<String, Value>;

/// All data collections, keyed by collection name.
pub type DataStore = BTreeMap<String, Collection>;

/// Scenes keyed by scene name.
pub type SceneStore = BTreeMap<String, Value>;

/// Structural change detected while applying an update.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Change {
    /// `name` appeared in `scope`.
    Added {
        /// Collection name or [`SCENES_SCOPE`].
        scope: String,
        /// Entry name.
        name: String,
    },
    /// `name` was removed from `scope`.
    Removed {
        /// Collection name or [`SCENES_SCOPE`].
        scope: String,
        /// Entry name.
        name: String,
    },
}

impl Change {
    fn added(scope: &str, name: &str) -> Self {
        Self::Added {
            scope: scope.to_owned(),
            name: name.to_owned(),
        }
    }

    fn removed(scope: &str, name: &str) -> Self {
        Self::Removed {
            scope: scope.to_owned(),
            name: name.to_owned(),
        }
    }
}

impl From<Change> for SyncEvent {
    fn from(change: Change) -> Self {
        match change {
            Change::Added { scope, name } => SyncEvent::Add { scope, name },
            Change::Removed { scope, name } => SyncEvent::Remove { scope, name },
        }
    }
}

/// Outcome of [`StateStore::set_scene`].
#[derive(Clone, Debug, PartialEq)]
pub struct SceneUpdate {
    /// Add or remove, if the update was structural.
    pub change: Option<Change>,
    /// The stored scene, or `None` after a removal.
    pub stored: Option<Value>,
}

/// Local copy of the producer's state.
#[derive(Clone, Debug, PartialEq)]
pub struct StateStore {
    context: Value,
    data: DataStore,
    scenes: SceneStore,
}

impl StateStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            context: Value::Object(Map::new()),
            data: DataStore::new(),
            scenes: SceneStore::new(),
        }
    }

    /// Current context.
    pub fn context(&self) -> &Value {
        &self.context
    }

    /// All data collections.
    pub fn data(&self) -> &DataStore {
        &self.data
    }

    /// One data collection, if it has been referenced.
    pub fn collection(&self, name: &str) -> Option<&Collection> {
        self.data.get(name)
    }

    /// All scenes.
    pub fn scenes(&self) -> &SceneStore {
        &self.scenes
    }

    /// Replace the context wholesale.
    pub fn replace_context(&mut self, context: Value) {
        self.context = context;
    }

    /// Merge a data diff of shape `{ collection: { object: record | null } }`.
    ///
    /// Collections are created on first reference. Every entry of a
    /// collection diff is stored, and names that were absent are reported as
    /// added in diff order. Then every stored object whose diff value is
    /// `null` is removed and reported, so a `null` for an unknown name yields
    /// an add followed by a remove.
    pub fn merge_data(&mut self, diff: &Value) -> Vec<Change> {
        let Some(collections) = diff.as_object() else {
            warn!("data diff is not a mapping, ignoring");
            return Vec::new();
        };

        let mut changes = Vec::new();
        for (scope, entries) in collections {
            let collection = self.data.entry(scope.clone()).or_default();
            let Some(entries) = entries.as_object() else {
                warn!(scope, "data collection diff is not a mapping, ignoring");
                continue;
            };

            for (name, record) in entries {
                if !collection.contains_key(name) {
                    changes.push(Change::added(scope, name));
                }
                let _ = collection.insert(name.clone(), record.clone());
            }

            let tombstoned: Vec<String> = collection
                .keys()
                .filter(|name| entries.get(*name).is_some_and(Value::is_null))
                .cloned()
                .collect();
            for name in tombstoned {
                let _ = collection.shift_remove(&name);
                changes.push(Change::removed(scope, &name));
            }
        }
        changes
    }

    /// Store or remove a scene.
    ///
    /// A missing or falsy `scene` removes the entry and always reports a
    /// removal. Otherwise the scene is stored and reported as added only when
    /// the name is new.
    pub fn set_scene(&mut self, name: &str, scene: Option<Value>) -> SceneUpdate {
        match scene.filter(is_truthy) {
            None => {
                let _ = self.scenes.remove(name);
                SceneUpdate {
                    change: Some(Change::removed(SCENES_SCOPE, name)),
                    stored: None,
                }
            }
            Some(scene) => {
                let is_new = self
                    .scenes
                    .insert(name.to_owned(), scene.clone())
                    .is_none();
                SceneUpdate {
                    change: is_new.then(|| Change::added(SCENES_SCOPE, name)),
                    stored: Some(scene),
                }
            }
        }
    }

    /// Clear context, data and scenes.
    pub fn reset(&mut self) {
        self.context = Value::Object(Map::new());
        self.data.clear();
        self.scenes.clear();
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether a payload value counts as present (`null`, `false`, `0` and `""`
/// do not).
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
