//! Error types for Justice Sync
//!
//! This module defines the error types used throughout the crate,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for Justice Sync operations
///
/// Covers configuration loading, remote session service calls, the local
/// session cache, and the search API. The reconciler itself never returns
/// these to its caller; it logs them and degrades to local state.
#[derive(Error, Debug)]
pub enum JusticeSyncError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Remote service errors (connection failures, unexpected payloads)
    #[error("Remote service error: {0}")]
    Remote(String),

    /// Remote service answered with a non-success status
    ///
    /// Displays only the message extracted from the response body.
    #[error("{message}")]
    RemoteStatus {
        /// HTTP status code returned by the service
        status: u16,
        /// Error text extracted from the response body
        message: String,
    },

    /// Local session cache errors (database operations)
    #[error("Storage error: {0}")]
    Storage(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type alias for Justice Sync operations
///
/// Uses `anyhow::Error` as the error type so callers can attach context
/// while still downcasting to [`JusticeSyncError`] where needed.
pub type Result<T> = anyhow::Result<T>;
