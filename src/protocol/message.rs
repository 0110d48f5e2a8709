//! Wire messages for the live generation service.
//!
//! The outbound envelope has a fixed schema. Inbound messages do not: the
//! service family emits several overlapping shapes, so every field is
//! optional and kept as a raw JSON value until classification.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::GENERATION_ACTION;
use crate::error::{LivegenError, Result};

/// Outbound request envelope, sent once right after the connection opens.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationRequest<'a> {
    /// Generation mode discriminator
    pub action: &'a str,
    /// Task description
    pub task: &'a str,
    /// Access credential
    pub api_key: &'a str,
}

impl<'a> GenerationRequest<'a> {
    /// Create an envelope for the default generation mode
    pub fn new(task: &'a str, api_key: &'a str) -> Self {
        Self {
            action: GENERATION_ACTION,
            task,
            api_key,
        }
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Inbound message as received from the service.
///
/// Unknown fields are ignored. Field values are untyped; the classifier
/// decides which ones are meaningful.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct InboundMessage {
    /// Discriminator (`"error"`, `"progress"`)
    #[serde(rename = "type", default)]
    pub kind: Option<Value>,
    /// Error reason, progress text or free-form status
    #[serde(default)]
    pub message: Option<Value>,
    /// Primary success shape: result location
    #[serde(default)]
    pub link: Option<Value>,
    /// WebVTT captions for the primary success shape
    #[serde(default)]
    pub vtt_link: Option<Value>,
    /// SRT captions for the primary success shape
    #[serde(default)]
    pub srt_link: Option<Value>,
    /// Alternate success shape: result location
    #[serde(default)]
    pub video_link: Option<Value>,
    /// Alternate success shape: completion marker
    #[serde(default)]
    pub status: Option<Value>,
    /// Numeric progress
    #[serde(default)]
    pub percent: Option<Value>,
    /// Progress value accompanying `type: "progress"`
    #[serde(default)]
    pub progress: Option<Value>,
}

impl InboundMessage {
    /// Parse a text frame.
    ///
    /// Anything that is not a JSON object is malformed.
    pub fn parse(text: &str) -> Result<Self> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| LivegenError::MalformedMessage(e.to_string()))?;
        if !value.is_object() {
            return Err(LivegenError::MalformedMessage(format!(
                "expected a JSON object, got: {}",
                crate::prompt::preview(text, 40)
            )));
        }
        serde_json::from_value(value).map_err(|e| LivegenError::MalformedMessage(e.to_string()))
    }

    /// `type` as a string
    pub fn kind_str(&self) -> Option<&str> {
        self.kind.as_ref().and_then(Value::as_str)
    }

    /// `message` as a non-empty string
    pub fn message_text(&self) -> Option<&str> {
        non_empty_str(self.message.as_ref())
    }

    pub(crate) fn link_text(&self) -> Option<&str> {
        non_empty_str(self.link.as_ref())
    }

    pub(crate) fn video_link_text(&self) -> Option<&str> {
        non_empty_str(self.video_link.as_ref())
    }

    pub(crate) fn vtt_link_text(&self) -> Option<&str> {
        non_empty_str(self.vtt_link.as_ref())
    }

    pub(crate) fn srt_link_text(&self) -> Option<&str> {
        non_empty_str(self.srt_link.as_ref())
    }

    pub(crate) fn status_text(&self) -> Option<&str> {
        self.status.as_ref().and_then(Value::as_str)
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| !s.is_empty())
}
