//! Core error types.

use thiserror::Error;

/// Error returned by a subscriber handler.
///
/// Boxed so handlers can surface any error type without the bus knowing it.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Errors produced while parsing an axis specification string.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum AxisSpecError {
    /// A character other than `x`, `y`, `z` (any case) or `-` was found.
    #[error("unknown axis `{found}` at position {position}")]
    UnknownAxis {
        /// Character index in the spec string.
        position: usize,
        /// The offending character.
        found: char,
    },
    /// The spec ended with a `-` that has no axis letter after it.
    #[error("sign `-` at position {position} is not followed by an axis")]
    DanglingSign {
        /// Character index of the dangling sign.
        position: usize,
    },
}

/// Errors produced by [`EventBus::emit`](crate::bus::EventBus::emit).
#[derive(Debug, Error)]
pub enum BusError {
    /// A subscriber returned an error; the remaining subscribers for that
    /// emission were not invoked.
    #[error("subscriber for `{event}` failed: {source}")]
    Subscriber {
        /// Name of the event being emitted.
        event: String,
        /// The handler's error.
        #[source]
        source: HandlerError,
    },
}

/// Result type for bus emissions.
pub type Result<T> = std::result::Result<T, BusError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_axis_display() {
        let err = AxisSpecError::UnknownAxis {
            position: 2,
            found: 'w',
        };
        assert_eq!(err.to_string(), "unknown axis `w` at position 2");
    }

    #[test]
    fn dangling_sign_display() {
        let err = AxisSpecError::DanglingSign { position: 3 };
        assert!(err.to_string().contains("position 3"));
    }

    #[test]
    fn subscriber_error_display_and_source() {
        let err = BusError::Subscriber {
            event: "data".into(),
            source: "boom".into(),
        };
        assert_eq!(err.to_string(), "subscriber for `data` failed: boom");
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "boom");
    }
}
