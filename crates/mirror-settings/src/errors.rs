//! Settings errors. File errors name the file so callers can report them
//! as is.

use std::path::PathBuf;

use thiserror::Error;

/// Why settings could not be produced.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The settings file exists but could not be read.
    #[error("cannot read settings file {}: {source}", .path.display())]
    Read {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The settings file is not JSON, or does not fit the settings shape.
    #[error("settings file {} is malformed: {source}", .path.display())]
    Malformed {
        /// File that failed.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },
    /// A field holds a value the client cannot use.
    #[error("settings field `{field}` {reason}")]
    InvalidField {
        /// Dotted camelCase path of the field, e.g. `connection.url`.
        field: &'static str,
        /// What is wrong with it.
        reason: &'static str,
    },
}

/// Result type for settings operations.
pub type Result<T> = std::result::Result<T, SettingsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_error_names_the_file() {
        let err = SettingsError::Read {
            path: PathBuf::from("/home/artist/.scene-mirror/settings.json"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let text = err.to_string();
        assert!(text.starts_with("cannot read settings file /home/artist/.scene-mirror/settings.json"));
        assert!(text.ends_with("denied"));
    }

    #[test]
    fn malformed_error_keeps_parse_source() {
        let source = serde_json::from_str::<serde_json::Value>("{axes").unwrap_err();
        let err = SettingsError::Malformed {
            path: PathBuf::from("mirror.json"),
            source,
        };
        assert!(err.to_string().starts_with("settings file mirror.json is malformed"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn invalid_field_display() {
        let err = SettingsError::InvalidField {
            field: "connection.handshakeTag",
            reason: "must not be empty",
        };
        assert_eq!(
            err.to_string(),
            "settings field `connection.handshakeTag` must not be empty"
        );
    }
}
