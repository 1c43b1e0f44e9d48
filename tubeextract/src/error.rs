//! Error types for the extraction client

use std::time::Duration;

/// Result type alias for extraction operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while resolving or relaying media
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The supplied URL is not a well-formed YouTube reference.
    /// Detected before any subprocess is spawned.
    #[error("invalid YouTube URL: {0}")]
    InvalidReference(String),

    /// The collaborator failed while fetching metadata
    #[error("metadata resolution failed: {0}")]
    Resolution(String),

    /// The collaborator failed before the audio stream produced any bytes
    #[error("audio download failed: {0}")]
    Download(String),

    /// The collaborator did not answer within the configured deadline
    #[error("yt-dlp did not respond within {0:?}")]
    Timeout(Duration),

    /// Spawning or waiting on the collaborator process failed
    #[error("failed to run yt-dlp: {0}")]
    Spawn(#[from] std::io::Error),

    /// The collaborator produced output we could not parse
    #[error("unexpected yt-dlp output: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create an invalid-reference error
    pub fn invalid_reference(msg: impl Into<String>) -> Self {
        Self::InvalidReference(msg.into())
    }

    /// Create a metadata resolution error
    pub fn resolution(msg: impl Into<String>) -> Self {
        Self::Resolution(msg.into())
    }

    /// Create a download error
    pub fn download(msg: impl Into<String>) -> Self {
        Self::Download(msg.into())
    }

    /// True for errors caused by the request itself rather than the
    /// collaborator. Maps to HTTP 400 at the API layer.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidReference(_))
    }
}
