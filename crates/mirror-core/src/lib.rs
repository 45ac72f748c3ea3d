//! # mirror-core
//!
//! Building blocks of the scene mirror, free of any transport:
//!
//! - **Axis remapping**: [`AxisSpec`] converts coordinate triples between the
//!   producer's and the consumer's axis conventions
//! - **Event bus**: [`EventBus`] keeps ordered subscribers per event kind and
//!   emits synchronously
//! - **State store**: [`StateStore`] holds context, data collections and
//!   scenes, and merges diffs with explicit `null` tombstones
//! - **Events**: [`SyncEvent`] is every notification a mirror can emit

#![deny(unsafe_code)]

pub mod axis;
pub mod bus;
pub mod errors;
pub mod events;
pub mod logging;
pub mod store;

pub use axis::{Axis, AxisSpec, Component, Sign};
pub use bus::{BusEvent, EventBus, Handler};
pub use errors::{AxisSpecError, BusError, HandlerError};
pub use events::{EventKind, SCENES_SCOPE, SyncEvent};
pub use store::{Change, Collection, DataStore, SceneStore, SceneUpdate, StateStore};
