//! Livegen error types.
//!
//! Two layers:
//!
//! - [`SessionFailure`] is the only failure a generation session can end in.
//!   It is cheap to clone and compare so it can travel inside a
//!   [`SessionOutcome`](crate::protocol::SessionOutcome).
//! - [`LivegenError`] covers everything else in the crate (config, I/O, the
//!   HTTP collaborator) and wraps a `SessionFailure` when one crosses an API
//!   boundary.
//!
//! A malformed inbound frame is represented by
//! [`LivegenError::MalformedMessage`]. The driver recovers it locally; it has
//! no `SessionFailure` counterpart and so can never be a session's outcome.

use std::time::Duration;

use thiserror::Error;

/// Description handed to end users for technical failures.
pub const GENERIC_FAILURE_MESSAGE: &str = "Failed to generate video. Please try again later.";

/// Reason used when the service reports an error without a message.
pub const DEFAULT_REMOTE_REASON: &str = "Video generation failed";

/// Terminal failure of a single generation session.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionFailure {
    /// Connection could not be established, the transport failed, or the
    /// remote side closed before the session resolved.
    #[error("Connection error: {0}")]
    Connection(String),

    /// No terminal message arrived before the deadline.
    #[error("Video generation timeout after {}s", .0.as_secs())]
    Timeout(Duration),

    /// The service explicitly reported a failure.
    #[error("Remote error: {0}")]
    Remote(String),
}

impl SessionFailure {
    /// Short machine-friendly name of the failure kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Connection(_) => "connection_error",
            Self::Timeout(_) => "timeout",
            Self::Remote(_) => "remote_error",
        }
    }

    /// Message safe to show to an end user.
    ///
    /// Remote reasons are passed through; technical failures collapse to
    /// [`GENERIC_FAILURE_MESSAGE`].
    pub fn public_message(&self) -> String {
        match self {
            Self::Remote(reason) => reason.clone(),
            Self::Connection(_) | Self::Timeout(_) => GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }
}

/// Livegen errors.
#[derive(Error, Debug)]
pub enum LivegenError {
    /// Inbound frame could not be parsed as a structured message.
    #[error("Malformed message: {0}")]
    MalformedMessage(String),

    /// A session ended in failure.
    #[error(transparent)]
    Session(#[from] SessionFailure),

    /// Network communication error outside a running session.
    #[error("Network error: {0}")]
    Network(String),

    /// Server-side error.
    #[error("Server error: {0}")]
    Server(String),

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Livegen operations
pub type Result<T> = std::result::Result<T, LivegenError>;

impl From<toml::de::Error> for LivegenError {
    fn from(err: toml::de::Error) -> Self {
        LivegenError::Config(err.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for LivegenError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        LivegenError::Network(err.to_string())
    }
}
