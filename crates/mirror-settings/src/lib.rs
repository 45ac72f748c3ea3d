//! # mirror-settings
//!
//! Configuration for scene-mirror.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`MirrorSettings::default()`]
//! 2. **User file**: `~/.scene-mirror/settings.json` (keys it names override defaults)
//! 3. **Environment variables**: `SCENE_MIRROR_*` overrides (highest priority)
//!
//! [`deep_merge`] is also what the client uses to lay a caller's connection
//! config over its defaults.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{apply_env_overrides, deep_merge, load_settings, settings_path};
pub use types::*;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
