//! Settings types.

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SettingsError};

/// Default producer endpoint (the Blender add-on listens on `localhost:8137`).
pub const DEFAULT_URL: &str = "ws://localhost:8137";

/// Default handshake tag.
pub const DEFAULT_HANDSHAKE_TAG: &str = "handshake";

/// Root settings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MirrorSettings {
    /// Producer connection settings.
    pub connection: ConnectionSettings,
    /// Log output settings.
    pub logging: LoggingSettings,
}

impl MirrorSettings {
    /// Reject values the client cannot work with.
    pub fn validate(&self) -> Result<()> {
        let url = self.connection.url.trim();
        if url.is_empty() {
            return Err(invalid("connection.url", "must not be empty"));
        }
        if !url.starts_with("ws://") && !url.starts_with("wss://") {
            return Err(invalid("connection.url", "must be a ws:// or wss:// address"));
        }
        if self.connection.handshake_tag.is_empty() {
            return Err(invalid("connection.handshakeTag", "must not be empty"));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: &'static str) -> SettingsError {
    SettingsError::InvalidField { field, reason }
}

/// Producer connection settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConnectionSettings {
    /// WebSocket endpoint of the producer.
    pub url: String,
    /// Axis spec applied to inbound positional data (e.g. `"x-zy"`).
    pub axes: String,
    /// Tag of the producer's greeting message.
    pub handshake_tag: String,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            axes: "xyz".to_string(),
            handshake_tag: DEFAULT_HANDSHAKE_TAG.to_string(),
        }
    }
}

/// Log output settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Minimum level (`RUST_LOG` overrides it).
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let settings = MirrorSettings::default();
        assert_eq!(settings.connection.url, "ws://localhost:8137");
        assert_eq!(settings.connection.axes, "xyz");
        assert_eq!(settings.connection.handshake_tag, "handshake");
        assert_eq!(settings.logging.level, "info");
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(MirrorSettings::default()).unwrap();
        assert_eq!(json["connection"]["handshakeTag"], "handshake");
    }

    #[test]
    fn partial_json_fills_defaults() {
        let settings: MirrorSettings =
            serde_json::from_str(r#"{"connection":{"axes":"x-zy"}}"#).unwrap();
        assert_eq!(settings.connection.axes, "x-zy");
        assert_eq!(settings.connection.url, DEFAULT_URL);
        assert_eq!(settings.logging.level, "info");
    }

    #[test]
    fn empty_url_is_invalid() {
        let mut settings = MirrorSettings::default();
        settings.connection.url = "  ".into();
        assert!(matches!(
            settings.validate(),
            Err(SettingsError::InvalidField { field: "connection.url", .. })
        ));
    }

    #[test]
    fn non_websocket_url_is_invalid() {
        let mut settings = MirrorSettings::default();
        settings.connection.url = "http://localhost:8137".into();
        assert!(settings.validate().is_err());
        settings.connection.url = "wss://studio.example:443".into();
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn empty_handshake_tag_is_invalid() {
        let mut settings = MirrorSettings::default();
        settings.connection.handshake_tag.clear();
        assert!(settings.validate().is_err());
    }
}
