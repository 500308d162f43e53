//! Error types for the tracker module.

use thiserror::Error;

/// Errors from tracker API interactions.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// HTTP transport failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a failure status.
    #[error("Tracker API error: {message}")]
    Api { message: String },

    /// Release group does not exist (or is no longer visible).
    #[error("Release group {0} not found")]
    GroupNotFound(u64),

    /// Response body did not match the expected shape.
    #[error("Failed to parse tracker response: {reason}")]
    Parse { reason: String },

    /// Local I/O while reading a torrent file for upload.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TrackerError {
    pub fn api(message: impl Into<String>) -> Self {
        Self::Api {
            message: message.into(),
        }
    }

    pub fn parse(reason: impl Into<String>) -> Self {
        Self::Parse {
            reason: reason.into(),
        }
    }
}
