//! Error types for Switchboard.

use thiserror::Error;

/// Library-level error type for Switchboard operations.
#[derive(Error, Debug)]
pub enum SwitchboardError {
    /// Registry or settings are inconsistent. Fatal at startup.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Adapter(#[from] AdapterError),

    #[error("Delegation loop exceeded its step budget ({steps} steps)")]
    BudgetExceeded { steps: usize },

    #[error("Model backend error: {0}")]
    Backend(String),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Failure of an external data source.
///
/// These never cross the dispatcher boundary: the loop turns them into
/// tool-role messages and keeps going.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AdapterError {
    #[error("Network failure: {0}")]
    Network(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Timed out after {elapsed:?}")]
    Timeout { elapsed: std::time::Duration },

    #[error("Source unavailable: {0}")]
    Unavailable(String),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),
}

impl From<reqwest::Error> for AdapterError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            AdapterError::Malformed(e.to_string())
        } else if e.status().is_some_and(|s| s == reqwest::StatusCode::NOT_FOUND) {
            AdapterError::NotFound(e.to_string())
        } else {
            AdapterError::Network(e.to_string())
        }
    }
}

/// Result type alias for Switchboard operations.
pub type Result<T> = std::result::Result<T, SwitchboardError>;

/// Result type alias for adapter calls.
pub type AdapterResult<T> = std::result::Result<T, AdapterError>;
