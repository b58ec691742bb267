//! Preference sync error types.
//!
//! Background writes swallow these (they are logged and dropped); explicit
//! operations such as `flush` and backend construction return them.

use std::path::PathBuf;
use thiserror::Error;

/// Preference sync operation error.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SyncError {
    /// The HTTP request could not be completed.
    #[error("preference request for {resource} failed")]
    Request {
        resource: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status.
    #[error("preference server returned {status} for {resource}: {body}")]
    Status {
        resource: String,
        status: u16,
        body: String,
    },

    /// The configured base URL is not usable.
    #[error("invalid preference endpoint: {0}")]
    InvalidEndpoint(String),

    /// File I/O error.
    #[error("Failed to {operation} preference file: {path}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Atomic write failed (temp file couldn't be renamed).
    #[error("Failed to complete preference write")]
    AtomicWriteFailed {
        temp_path: PathBuf,
        target_path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Serialization error.
    #[error("Failed to serialize preference document")]
    Serialization(#[from] serde_json::Error),

    /// A blocking task was cancelled or panicked.
    #[error("preference task did not complete")]
    Task(#[from] tokio::task::JoinError),

    /// The store refused the operation.
    #[error("preference store unavailable: {0}")]
    Unavailable(String),
}

impl SyncError {
    /// Get a user-friendly message for this error.
    pub fn user_message(&self) -> String {
        match self {
            Self::Request { .. } => {
                "Could not reach the server to sync your view settings.".to_string()
            }
            Self::Status { status, .. } if *status == 401 || *status == 403 => {
                "Your session does not allow saving view settings.".to_string()
            }
            Self::Status { .. } | Self::Unavailable(_) => {
                "The server could not store your view settings.".to_string()
            }
            Self::InvalidEndpoint(url) => {
                format!("The preference server address '{url}' is not valid.")
            }
            Self::Io {
                operation, path, ..
            } => {
                format!("Could not {} the file at {}", operation, path.display())
            }
            Self::AtomicWriteFailed { target_path, .. } => {
                format!(
                    "Could not save view settings to {}. Please check disk space and permissions.",
                    target_path.display()
                )
            }
            Self::Serialization(_) | Self::Task(_) => {
                "An unexpected error occurred while saving view settings.".to_string()
            }
        }
    }

    /// Whether retrying the same operation later might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Request { .. } | Self::Unavailable(_) | Self::Io { .. } => true,
            Self::Status { status, .. } => *status >= 500 || *status == 429,
            Self::InvalidEndpoint(_)
            | Self::AtomicWriteFailed { .. }
            | Self::Serialization(_)
            | Self::Task(_) => false,
        }
    }
}

/// Result type alias for preference sync operations.
pub type Result<T> = std::result::Result<T, SyncError>;
