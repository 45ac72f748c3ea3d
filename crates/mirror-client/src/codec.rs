//! Message encoding.
//!
//! The client only needs to turn one structured value into bytes and back.
//! [`JsonCodec`] is the format the producer speaks; any other [`Codec`] can
//! be plugged into [`SyncClient`](crate::client::SyncClient).

use serde_json::Value;

use crate::errors::CodecError;

/// Encodes outbound messages and decodes inbound ones.
pub trait Codec: Send + Sync {
    /// Serialize a message.
    fn encode(&self, message: &Value) -> Result<Vec<u8>, CodecError>;

    /// Parse a message. Fails on malformed input.
    fn decode(&self, raw: &[u8]) -> Result<Value, CodecError>;
}

/// Compact JSON.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode(&self, message: &Value) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(message).map_err(|e| CodecError::Encode(e.to_string()))
    }

    fn decode(&self, raw: &[u8]) -> Result<Value, CodecError> {
        serde_json::from_slice(raw).map_err(|e| CodecError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn encodes_compact() {
        let bytes = JsonCodec.encode(&json!(["scene", "Scene", {"frame": 3}])).unwrap();
        assert_eq!(bytes, br#"["scene","Scene",{"frame":3}]"#);
    }

    #[test]
    fn decodes_tagged_tuple() {
        let value = JsonCodec.decode(br#"["data",{"objects":{}}]"#).unwrap();
        assert_eq!(value, json!(["data", {"objects": {}}]));
    }

    #[test]
    fn malformed_input_fails() {
        assert!(matches!(JsonCodec.decode(b"[\"data\","), Err(CodecError::Decode(_))));
        assert!(JsonCodec.decode(&[0xff, 0xfe]).is_err());
    }
}
