//! # Livegen - Live Video Generation Sessions
//!
//! Client for a remote video generation service reached over a long-lived
//! WebSocket. One call is one *session*: open a connection, send a single
//! request, interpret an unordered stream of progress, status, success and
//! error messages, and settle on exactly one outcome before a deadline.
//!
//! ## Features
//!
//! - **Shape-driven classification**: tolerates the service's family of
//!   response encodings (two success shapes, two progress shapes)
//! - **Single-outcome sessions**: a reducer with terminal states that accept
//!   no further events
//! - **Guaranteed release**: the connection is closed exactly once on every
//!   exit path
//! - **Deadline enforcement**: 180 seconds by default, configurable per call
//! - **HTTP front end**: axum API with per-client rate limiting
//!
//! ## Session Lifecycle
//!
//! ```text
//!     [Idle] ──connect──> [Connecting] ──opened──> [Open]
//!                              │                     │
//!                              │ connect error       ├── success ──> [Resolved]
//!                              v                     │
//!                          [Failed] <────────────────┴── error / timeout / close
//! ```
//!
//! ## Outcomes
//!
//! | Outcome                          | Cause                                     |
//! |----------------------------------|-------------------------------------------|
//! | `Completed(artifact)`            | `{link}` or `{video_link, status}` seen   |
//! | `Failed(Remote(reason))`         | `{type: "error"}` seen                    |
//! | `Failed(Timeout(deadline))`      | No terminal message before the deadline   |
//! | `Failed(Connection(reason))`     | Connect failure, transport error or close |
//!
//! Malformed frames are logged and ignored; they never end a session.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::time::Duration;
//! use livegen::{run_session, DEFAULT_ENDPOINT};
//!
//! let url = run_session(
//!     DEFAULT_ENDPOINT,
//!     "Explain how to complete the square",
//!     api_key,
//!     Duration::from_secs(180),
//! )
//! .await?;
//! println!("Video: {url}");
//! ```
//!
//! ### Full Outcome
//!
//! ```rust,ignore
//! use livegen::{SessionDriver, SessionOutcome, SessionRequest};
//!
//! let driver = SessionDriver::new(endpoint);
//! match driver.run(SessionRequest::new(task, api_key)).await {
//!     SessionOutcome::Completed(artifact) => println!("{}", artifact.location),
//!     SessionOutcome::Failed(failure) => eprintln!("{}", failure.public_message()),
//! }
//! ```
//!
//! ## Modules
//!
//! - [`protocol`]: Wire messages, classifier and session state machine
//! - [`driver`]: Session driver (connection lifecycle and deadline)
//! - [`transport`]: Connection traits and the WebSocket implementation
//! - [`server`]: HTTP API server (Axum-based)
//! - [`prompt`]: Task description helpers
//! - [`config`]: Configuration management
//! - [`error`]: Error types and result aliases

pub mod config;
pub mod driver;
pub mod error;
pub mod prompt;
pub mod protocol;
pub mod server;
pub mod transport;

// Re-exports for convenience
pub use config::Config;
pub use driver::{run_session, SessionDriver};
pub use error::{LivegenError, Result, SessionFailure};
pub use protocol::{
    classify, Classification, GeneratedArtifact, InboundMessage, SessionOutcome, SessionRequest,
    SessionState, DEFAULT_DEADLINE_SECS, DEFAULT_ENDPOINT,
};
pub use server::AppState;
pub use transport::{Connection, Connector, WsConnector};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
