//! Core error types for clockwork-core.
//!
//! Only user-input validation errors (`InvalidDuration`, `InvalidTransition`,
//! configuration edits) are meant to reach a caller synchronously. Persistence,
//! zone and signal failures are logged and swallowed by the layers that own them.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for clockwork-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// User-supplied duration outside the accepted range
    #[error("Invalid duration: {0}")]
    InvalidDuration(#[from] DurationError),

    /// Operation not allowed from the machine's current state
    #[error("Cannot {operation} {machine} while {state}")]
    InvalidTransition {
        machine: &'static str,
        operation: &'static str,
        state: &'static str,
    },

    /// Settings or session file could not be read or written
    #[error("Persistence failure: {0}")]
    Persistence(#[from] PersistenceError),

    /// Time zone identifier could not be resolved
    #[error("Unknown time zone: {0}")]
    UnknownZone(String),

    /// Control signal content could not be decoded
    #[error("Malformed control signal: {0}")]
    MalformedSignal(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Duration validation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DurationError {
    /// Minute count outside an inclusive range
    #[error("{minutes} minutes is outside {min}-{max}")]
    OutOfRange { minutes: i64, min: u32, max: u32 },

    /// Duration that must be strictly positive
    #[error("{minutes} minutes must be greater than zero")]
    NotPositive { minutes: f64 },
}

/// Settings and session file errors.
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// Failed to read a file
    #[error("Failed to read {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a file
    #[error("Failed to write {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File content could not be parsed
    #[error("Failed to parse {path}: {message}")]
    ParseFailed { path: PathBuf, message: String },

    /// Value could not be serialized
    #[error("Failed to serialize {what}: {message}")]
    SerializeFailed { what: &'static str, message: String },
}

/// Configuration edit errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Key does not name a setting
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Value failed validation for the key
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
