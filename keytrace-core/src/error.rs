//! Error types for keytrace-core

use thiserror::Error;

/// Main error type for the keytrace-core library
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The serialized event log could not be decoded
    ///
    /// Covers invalid JSON, a top-level value that is not an array, and
    /// records with missing, unknown or mistyped fields.
    #[error("parse error at line {line}, column {column}: {message}")]
    Parse {
        line: usize,
        column: usize,
        message: String,
    },

    /// The event log could not be encoded
    #[error("serialization error: {0}")]
    Serialize(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Refused to persist a log with no events
    #[error("recording is empty")]
    EmptyRecording,

    /// The async playback driver is gone
    #[error("player error: {0}")]
    Player(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Parse {
            line: err.line(),
            column: err.column(),
            message: err.to_string(),
        }
    }
}

/// Result type alias for keytrace-core
pub type Result<T> = std::result::Result<T, Error>;
