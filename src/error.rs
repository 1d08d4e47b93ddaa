//! Error types for sheetbridge
//!
//! Defines a comprehensive error enum covering all failure modes across the engine.
//! Uses thiserror for ergonomic error handling.

use thiserror::Error;

/// Result type alias for sheetbridge operations
pub type Result<T> = std::result::Result<T, SheetBridgeError>;

/// Comprehensive error type for sheetbridge operations
#[derive(Error, Debug)]
pub enum SheetBridgeError {
    /// No usable credential for a read operation
    #[error("No authentication available for reading the sheet")]
    NoAuthentication,

    /// Write attempted with only a read-capable credential
    #[error("Permission denied: {0}")]
    Permission(String),

    /// Non-success response from the remote tabular API
    #[error("Remote API error: HTTP {status}: {body}")]
    RemoteHttp { status: u16, body: String },

    /// Delete path cannot resolve the backing table's internal structural id
    #[error("Missing sheet metadata: {0}")]
    MissingMetadata(String),

    /// Webhook endpoint answered with success=false
    #[error("Webhook rejected the request: {0}")]
    Webhook(String),

    /// Operation requires an active connection
    #[error("No sheet connected")]
    NotConnected,

    /// Task id could not be resolved in the current cache
    #[error("Task not found: {0}")]
    TaskNotFound(String),

    /// Task input rejected before reaching the remote source
    #[error("Invalid task: {0}")]
    InvalidTask(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Persisted-state store errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// SQLite database errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Other errors
    #[error("{0}")]
    Other(String),

    /// Anyhow errors (for more context)
    #[error("{0}")]
    Anyhow(#[from] anyhow::Error),
}

impl crate::retry::RetryableError for SheetBridgeError {
    fn retry_decision(&self) -> crate::retry::RetryDecision {
        use crate::retry::RetryDecision;
        use std::time::Duration;

        match self {
            SheetBridgeError::RemoteHttp { status, .. } => match status {
                429 => RetryDecision::RetryAfter(Duration::from_secs(60)),
                500..=599 => RetryDecision::Retry,
                _ => RetryDecision::NoRetry,
            },
            SheetBridgeError::Http(e) => {
                if e.is_connect() || e.is_timeout() {
                    RetryDecision::Retry
                } else if e.is_status() {
                    match e.status().map(|s| s.as_u16()) {
                        Some(429) => RetryDecision::RetryAfter(Duration::from_secs(60)),
                        Some(500..=599) => RetryDecision::Retry,
                        _ => RetryDecision::NoRetry,
                    }
                } else {
                    RetryDecision::Retry
                }
            }
            // Everything else is permanent from the engine's point of view:
            // credential, validation, and local-state failures do not heal by
            // re-issuing the same request.
            _ => RetryDecision::NoRetry,
        }
    }
}
