//! Connection configuration passed to [`SyncClient::open`](crate::client::SyncClient::open).

use mirror_settings::deep_merge;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::errors::{ClientError, Result};

/// Resolved configuration handed to a [`Connector`](crate::transport::Connector).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Endpoint address.
    pub url: String,
    /// Every other key, passed to the transport unexamined.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ConnectionConfig {
    /// Lay `overrides` over `{ "url": default_url }`.
    ///
    /// `null` means "no overrides". Nested mappings merge key by key; arrays
    /// and scalars replace.
    pub fn resolve(default_url: &str, overrides: Value) -> Result<Self> {
        let defaults = json!({ "url": default_url });
        let merged = match overrides {
            Value::Null => defaults,
            overrides @ Value::Object(_) => deep_merge(defaults, overrides),
            other => {
                return Err(ClientError::Config(format!(
                    "expected a mapping, got {}",
                    kind_name(&other)
                )));
            }
        };
        let config: Self =
            serde_json::from_value(merged).map_err(|e| ClientError::Config(e.to_string()))?;
        if config.url.trim().is_empty() {
            return Err(ClientError::Config("url must not be empty".into()));
        }
        Ok(config)
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "a mapping",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFAULT: &str = "ws://localhost:8137";

    #[test]
    fn null_gives_default_url() {
        let config = ConnectionConfig::resolve(DEFAULT, Value::Null).unwrap();
        assert_eq!(config.url, DEFAULT);
        assert!(config.extra.is_empty());
    }

    #[test]
    fn url_override_wins() {
        let config = ConnectionConfig::resolve(DEFAULT, json!({"url": "ws://10.0.0.2:9000"})).unwrap();
        assert_eq!(config.url, "ws://10.0.0.2:9000");
    }

    #[test]
    fn extra_keys_pass_through() {
        let config = ConnectionConfig::resolve(
            DEFAULT,
            json!({"protocols": ["blender"], "headers": {"x-client": "mirror"}}),
        )
        .unwrap();
        assert_eq!(config.url, DEFAULT);
        assert_eq!(config.extra["protocols"], json!(["blender"]));
        assert_eq!(config.extra["headers"]["x-client"], "mirror");
    }

    #[test]
    fn non_mapping_is_rejected() {
        let err = ConnectionConfig::resolve(DEFAULT, json!([1, 2])).unwrap_err();
        assert!(err.to_string().contains("an array"));
    }

    #[test]
    fn null_url_is_rejected() {
        assert!(ConnectionConfig::resolve(DEFAULT, json!({"url": null})).is_err());
    }

    #[test]
    fn empty_url_is_rejected() {
        assert!(ConnectionConfig::resolve(DEFAULT, json!({"url": ""})).is_err());
    }
}
