//! Core error types for deepwork-core.
//!
//! This module defines the error hierarchy using thiserror. Timer
//! operation failures are recoverable: the controller leaves its state
//! unchanged and the invoking UI layer decides how to surface them.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for deepwork-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Timer state machine errors
    #[error("Timer error: {0}")]
    Timer(#[from] TimerError),

    /// Backend API errors
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Local snapshot database errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Errors raised by the timer state controller.
///
/// Every variant is recoverable: the state the controller held before the
/// failing operation is preserved and the user may retry.
#[derive(Error, Debug)]
pub enum TimerError {
    /// The backend refused or failed to create the study block backing
    /// a new session. The timer was not activated.
    #[error("Failed to create study block: {0}")]
    SessionCreation(#[source] ApiError),

    /// The backend refused or failed to finalize or update the study
    /// block. The timer keeps its pre-call state.
    #[error("Failed to update study block: {0}")]
    SessionUpdate(#[source] ApiError),

    /// An operation was invoked in a state that violates its precondition
    /// (e.g. `resume` with no session, `start` while already running).
    #[error("Invalid timer state: {0}")]
    InvalidState(String),
}

/// Errors from the backend HTTP API.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Transport-level failure (connection refused, timeout, TLS).
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend answered with a non-success status. `detail` carries
    /// the human-readable message from the response body when present.
    #[error("HTTP {status}: {detail}")]
    Status { status: u16, detail: String },

    /// The response body could not be decoded into the expected shape.
    #[error("Unexpected response body: {0}")]
    Decode(String),

    /// No stored session token; the user must log in first.
    #[error("Not authenticated -- run `deepwork auth login` first")]
    NotAuthenticated,

    /// Keyring access for the session token failed.
    #[error("Credential store error: {0}")]
    CredentialStore(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),
}

/// Local snapshot database errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<Box<dyn std::error::Error + Send + Sync>> for CoreError {
    fn from(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        CoreError::Custom(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
