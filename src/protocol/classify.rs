//! Inbound message classification.
//!
//! [`classify`] is pure and total: every parsed message maps to exactly one
//! [`Classification`], and messages it does not understand are
//! `Unrecognized` rather than errors.

use serde::Serialize;
use serde_json::Value;

use super::message::InboundMessage;
use crate::error::DEFAULT_REMOTE_REASON;

/// Artifact produced by a successful session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedArtifact {
    /// Result location (retrievable video address)
    pub location: String,
    /// WebVTT captions, when the service provided them
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vtt_link: Option<String>,
    /// SRT captions, when the service provided them
    #[serde(skip_serializing_if = "Option::is_none")]
    pub srt_link: Option<String>,
}

impl GeneratedArtifact {
    /// Artifact with only a result location
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            vtt_link: None,
            srt_link: None,
        }
    }
}

/// Result of classifying one inbound message
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    /// Generation progressed (non-terminal)
    Progress {
        /// Reported percentage, if numeric
        percent: Option<f64>,
        /// Accompanying text
        text: Option<String>,
    },
    /// Free-form status text (non-terminal)
    Info(String),
    /// Generation finished (terminal)
    Success(GeneratedArtifact),
    /// Service reported a failure (terminal)
    Error(String),
    /// Nothing recognizable (non-terminal)
    Unrecognized,
}

impl Classification {
    /// Check if this classification ends the session
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success(_) | Self::Error(_))
    }
}

/// Classify a parsed inbound message. First matching shape wins.
pub fn classify(message: &InboundMessage) -> Classification {
    if message.kind_str() == Some("error") {
        let reason = message.message_text().unwrap_or(DEFAULT_REMOTE_REASON);
        return Classification::Error(reason.to_string());
    }

    // Primary shape takes precedence over the alternate one when both match.
    if let Some(link) = message.link_text() {
        return Classification::Success(GeneratedArtifact {
            location: link.to_string(),
            vtt_link: message.vtt_link_text().map(str::to_string),
            srt_link: message.srt_link_text().map(str::to_string),
        });
    }

    if let Some(video_link) = message.video_link_text() {
        if message.status_text() == Some("completed") {
            return Classification::Success(GeneratedArtifact::new(video_link));
        }
    }

    if let Some(percent) = message.percent.as_ref().and_then(Value::as_f64) {
        return Classification::Progress {
            percent: Some(percent),
            text: None,
        };
    }

    if message.kind_str() == Some("progress") {
        return Classification::Progress {
            percent: message.progress.as_ref().and_then(Value::as_f64),
            text: message.message_text().map(str::to_string),
        };
    }

    if let Some(text) = message.message_text() {
        return Classification::Info(text.to_string());
    }

    Classification::Unrecognized
}
