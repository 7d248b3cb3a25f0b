//! Error types for Tessera

use thiserror::Error;

/// The main error type for Tessera operations
#[derive(Debug, Error)]
pub enum TesseraError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Malformed identity: {0:?}")]
    MalformedIdentity(String),

    #[error("Buffer underrun: requested {requested} byte(s), {available} available")]
    BufferUnderrun { requested: usize, available: usize },

    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch { expected: String, got: String },

    #[error("Loader already registered for resource type: {0}")]
    DuplicateLoader(String),

    #[error("File extension '{extension}' is already claimed by the {owner} loader")]
    ExtensionConflict { extension: String, owner: String },

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Config error: {0}")]
    ConfigError(String),
}

/// Result type alias for Tessera operations
pub type Result<T> = std::result::Result<T, TesseraError>;

impl From<toml::de::Error> for TesseraError {
    fn from(err: toml::de::Error) -> Self {
        TesseraError::ConfigError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_underrun_message() {
        let err = TesseraError::BufferUnderrun {
            requested: 8,
            available: 3,
        };
        assert_eq!(
            err.to_string(),
            "Buffer underrun: requested 8 byte(s), 3 available"
        );
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: TesseraError = io.into();
        assert!(matches!(err, TesseraError::IoError(_)));
    }

    #[test]
    fn test_toml_conversion() {
        let parsed: std::result::Result<toml::Value, _> = toml::from_str("key = ");
        let err: TesseraError = parsed.unwrap_err().into();
        assert!(matches!(err, TesseraError::ConfigError(_)));
    }
}
