//! Settings loading and JSON merging.
//!
//! Layers, lowest priority first: compiled defaults, the user's settings
//! file, `SCENE_MIRROR_*` environment variables. Every settings struct is
//! `#[serde(default)]`, so a partial file only overrides the keys it names.
//! A missing file is an empty layer.

use std::io;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::errors::{Result, SettingsError};
use crate::types::MirrorSettings;

const SETTINGS_DIR: &str = ".scene-mirror";
const SETTINGS_FILE: &str = "settings.json";

/// `$HOME/.scene-mirror/settings.json`, or a relative
/// `.scene-mirror/settings.json` when `HOME` is unset.
pub fn settings_path() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_default()
        .join(SETTINGS_DIR)
        .join(SETTINGS_FILE)
}

/// Build settings from `path`, then environment overrides, then validate.
pub fn load_settings(path: &Path) -> Result<MirrorSettings> {
    let mut settings = match std::fs::read(path) {
        Ok(raw) => {
            debug!(path = %path.display(), "settings file found");
            serde_json::from_slice(&raw).map_err(|source| SettingsError::Malformed {
                path: path.to_path_buf(),
                source,
            })?
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no settings file, using defaults");
            MirrorSettings::default()
        }
        Err(source) => {
            return Err(SettingsError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    apply_env_overrides(&mut settings);
    settings.validate()?;
    Ok(settings)
}

/// Lay `source` over `target`.
///
/// Only where both sides are mappings does the merge descend key by key;
/// arrays, scalars and `null` in `source` replace the target value.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut merged), Value::Object(overrides)) => {
            for (key, value) in overrides {
                match merged.get_mut(&key) {
                    Some(slot) => *slot = deep_merge(slot.take(), value),
                    None => {
                        let _ = merged.insert(key, value);
                    }
                }
            }
            Value::Object(merged)
        }
        (_, source) => source,
    }
}

type FieldAccess = fn(&mut MirrorSettings) -> &mut String;

/// Environment variables and the field each one replaces.
const ENV_OVERRIDES: [(&str, FieldAccess); 4] = [
    ("SCENE_MIRROR_URL", |s| &mut s.connection.url),
    ("SCENE_MIRROR_AXES", |s| &mut s.connection.axes),
    ("SCENE_MIRROR_HANDSHAKE_TAG", |s| &mut s.connection.handshake_tag),
    ("SCENE_MIRROR_LOG_LEVEL", |s| &mut s.logging.level),
];

/// Replace fields from `SCENE_MIRROR_*` variables. Unset or empty
/// variables leave the field alone.
pub fn apply_env_overrides(settings: &mut MirrorSettings) {
    for (name, field) in ENV_OVERRIDES {
        if let Some(value) = std::env::var(name).ok().filter(|v| !v.is_empty()) {
            debug!(name, "setting overridden from environment");
            *field(settings) = value;
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
