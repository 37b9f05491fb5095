//! Update Error Types

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Prefix of the transport status-line artifact that settles a cycle silently.
pub const SERVER_RETURNED_PREFIX: &str = "Server returned";

#[derive(Error, Debug)]
pub enum UpdateError {
    #[error("No feed url set")]
    NoFeedUrl,

    #[error("HTTP error: {0}")]
    Http(String),

    /// Transport reported a status-line artifact. Never surfaced as an event.
    #[error("{0}")]
    ServerReturned(String),

    #[error("Invalid manifest: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Package download returned HTTP {0}")]
    PackageStatus(u16),

    #[error("Unsupported hash \"{0}\": expected 40, 64 or 128 hex digits")]
    UnsupportedHash(String),

    #[error("Hash mismatch: expected {expected}, got {actual}")]
    HashMismatch { expected: String, actual: String },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("\"{}\" is not a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error("No async runtime available: {0}")]
    Runtime(String),

    #[error("This platform variant cannot apply packages")]
    ApplyUnsupported,

    #[error("Failed to launch {}: {source}", .path.display())]
    Launch {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl UpdateError {
    /// Classify a transport failure message.
    ///
    /// Only an exact, case-sensitive `"Server returned"` prefix maps to the
    /// suppressed class; everything else stays a regular HTTP error.
    pub fn from_transport_message(message: impl Into<String>) -> Self {
        let message = message.into();
        if message.starts_with(SERVER_RETURNED_PREFIX) {
            Self::ServerReturned(message)
        } else {
            Self::Http(message)
        }
    }

    /// Whether a cycle failing with this error settles without events.
    pub fn is_suppressed(&self) -> bool {
        matches!(self, Self::ServerReturned(_))
    }
}

impl From<reqwest::Error> for UpdateError {
    fn from(e: reqwest::Error) -> Self {
        Self::from_transport_message(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, UpdateError>;
