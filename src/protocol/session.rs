//! Session state machine for a single generation exchange.
//!
//! The machine is a synchronous reducer: the driver feeds it one
//! [`SessionEvent`] at a time and it answers with at most one
//! [`SessionOutcome`]. Terminal states have no outgoing transitions, so a
//! session can only ever produce one outcome.

use std::fmt;
use std::time::{Duration, Instant};

use super::classify::{classify, Classification, GeneratedArtifact};
use super::message::{GenerationRequest, InboundMessage};
use crate::error::SessionFailure;

/// Session state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing started yet
    Idle,
    /// Connection being established
    Connecting,
    /// Request sent, waiting for a terminal message
    Open,
    /// Success received
    Resolved,
    /// Error, timeout or transport loss
    Failed,
}

impl SessionState {
    /// Check if the state accepts no further events
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Resolved | Self::Failed)
    }
}

/// Task and credential for one session. Immutable once built.
#[derive(Clone)]
pub struct SessionRequest {
    task: String,
    api_key: String,
}

impl SessionRequest {
    /// Create a request
    pub fn new(task: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            api_key: api_key.into(),
        }
    }

    /// Task description
    pub fn task(&self) -> &str {
        &self.task
    }

    /// Access credential
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Wire envelope for this request
    pub fn envelope(&self) -> GenerationRequest<'_> {
        GenerationRequest::new(&self.task, &self.api_key)
    }
}

impl fmt::Debug for SessionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionRequest")
            .field("task", &self.task)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// The single value a session yields
#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome {
    /// Service produced an artifact
    Completed(GeneratedArtifact),
    /// Session ended without an artifact
    Failed(SessionFailure),
}

impl SessionOutcome {
    /// Check if the session completed
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    /// Convert into a `Result`
    pub fn into_result(self) -> std::result::Result<GeneratedArtifact, SessionFailure> {
        match self {
            Self::Completed(artifact) => Ok(artifact),
            Self::Failed(failure) => Err(failure),
        }
    }
}

/// Event fed to the state machine while the connection is open
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Text frame received
    Inbound(String),
    /// Transport reported an error
    TransportError(String),
    /// Remote closed the connection
    TransportClosed,
    /// Deadline timer fired
    DeadlineElapsed,
}

/// Per-session reducer
#[derive(Debug)]
pub struct SessionMachine {
    id: String,
    state: SessionState,
    deadline: Duration,
    started: Instant,
    messages_received: u64,
    progress_updates: u64,
    info_messages: u64,
    unrecognized: u64,
    last_percent: Option<f64>,
}

impl SessionMachine {
    /// Create a machine for a session with the given deadline
    pub fn new(deadline: Duration) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            state: SessionState::Idle,
            deadline,
            started: Instant::now(),
            messages_received: 0,
            progress_updates: 0,
            info_messages: 0,
            unrecognized: 0,
            last_percent: None,
        }
    }

    /// Get session ID
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get current state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Check if the machine reached a terminal state
    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Idle → Connecting
    pub fn begin_connect(&mut self) {
        if self.state == SessionState::Idle {
            self.state = SessionState::Connecting;
            self.started = Instant::now();
        }
    }

    /// Connecting → Open
    pub fn opened(&mut self) {
        if self.state == SessionState::Connecting {
            self.state = SessionState::Open;
        }
    }

    /// Connecting → Failed
    pub fn connect_failed(&mut self, reason: impl Into<String>) -> SessionOutcome {
        debug_assert_eq!(self.state, SessionState::Connecting);
        self.state = SessionState::Failed;
        SessionOutcome::Failed(SessionFailure::Connection(reason.into()))
    }

    /// Feed one event. Returns the outcome on the terminal transition and
    /// `None` otherwise, including for every event after termination.
    pub fn handle(&mut self, event: SessionEvent) -> Option<SessionOutcome> {
        if self.state != SessionState::Open {
            tracing::debug!(session = %self.id, state = ?self.state, ?event, "Ignoring event");
            return None;
        }

        match event {
            SessionEvent::Inbound(text) => self.on_inbound(&text),
            SessionEvent::TransportError(reason) => {
                tracing::error!(session = %self.id, "WebSocket error: {}", reason);
                self.fail(SessionFailure::Connection(reason))
            },
            SessionEvent::TransportClosed => {
                tracing::warn!(session = %self.id, "Connection closed before a result arrived");
                self.fail(SessionFailure::Connection(
                    "connection closed before completion".to_string(),
                ))
            },
            SessionEvent::DeadlineElapsed => {
                tracing::error!(
                    session = %self.id,
                    "Video generation timeout after {}s",
                    self.deadline.as_secs()
                );
                self.fail(SessionFailure::Timeout(self.deadline))
            },
        }
    }

    fn on_inbound(&mut self, text: &str) -> Option<SessionOutcome> {
        self.messages_received += 1;

        let classification = match InboundMessage::parse(text) {
            Ok(message) => classify(&message),
            Err(e) => {
                tracing::warn!(session = %self.id, error = %e, raw = %text, "Error parsing message");
                Classification::Unrecognized
            },
        };

        match classification {
            Classification::Success(artifact) => {
                tracing::info!(
                    session = %self.id,
                    location = %artifact.location,
                    vtt = ?artifact.vtt_link,
                    srt = ?artifact.srt_link,
                    "Video generation completed"
                );
                self.state = SessionState::Resolved;
                Some(SessionOutcome::Completed(artifact))
            },
            Classification::Error(reason) => {
                tracing::error!(session = %self.id, "Service error: {}", reason);
                self.fail(SessionFailure::Remote(reason))
            },
            Classification::Progress { percent, text } => {
                self.progress_updates += 1;
                if percent.is_some() {
                    self.last_percent = percent;
                }
                tracing::info!(
                    session = %self.id,
                    percent = ?percent,
                    "Progress: {}",
                    text.as_deref().unwrap_or("")
                );
                None
            },
            Classification::Info(text) => {
                self.info_messages += 1;
                tracing::info!(session = %self.id, "Status message: {}", text);
                None
            },
            Classification::Unrecognized => {
                self.unrecognized += 1;
                tracing::debug!(session = %self.id, raw = %text, "Unrecognized message");
                None
            },
        }
    }

    fn fail(&mut self, failure: SessionFailure) -> Option<SessionOutcome> {
        self.state = SessionState::Failed;
        Some(SessionOutcome::Failed(failure))
    }

    /// Get session statistics
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            session_id: self.id.clone(),
            state: self.state,
            messages_received: self.messages_received,
            progress_updates: self.progress_updates,
            info_messages: self.info_messages,
            unrecognized: self.unrecognized,
            last_percent: self.last_percent,
            elapsed: self.started.elapsed(),
        }
    }
}

/// Session statistics
#[derive(Debug, Clone)]
pub struct SessionStats {
    /// Session ID
    pub session_id: String,
    /// Current state
    pub state: SessionState,
    /// Inbound messages received
    pub messages_received: u64,
    /// Progress updates seen
    pub progress_updates: u64,
    /// Info messages seen
    pub info_messages: u64,
    /// Malformed or unrecognized messages seen
    pub unrecognized: u64,
    /// Last numeric progress reported
    pub last_percent: Option<f64>,
    /// Time since connecting started
    pub elapsed: Duration,
}
