//! Live generation protocol: wire messages, classification and the session
//! state machine.
//!
//! A session is a single request/response exchange over one WebSocket
//! connection. The client sends exactly one request envelope and then reads
//! a heterogeneous stream of inbound messages until one of them is terminal.
//!
//! ## Message Flow
//!
//! ```text
//! Client                                 Service
//!    |                                      |
//!    |---- {action, task, api_key} -------->|  single outbound request
//!    |                                      |
//!    |<--- {percent: 12} -------------------|  progress (non-terminal)
//!    |<--- {message: "rendering"} ----------|  info (non-terminal)
//!    |<--- {link: ".../v.mp4"} -------------|  success (terminal)
//!    |       or {type: "error", message}    |  error (terminal)
//! ```
//!
//! ## State Machine
//!
//! | State        | Description                       | Valid Transitions      |
//! |--------------|-----------------------------------|------------------------|
//! | `Idle`       | Nothing started                   | → Connecting           |
//! | `Connecting` | Connection being established      | → Open, Failed         |
//! | `Open`       | Request sent, awaiting terminal   | → Resolved, Failed     |
//! | `Resolved`   | Success received                  | (terminal)             |
//! | `Failed`     | Error, timeout or transport loss  | (terminal)             |
//!
//! ## Inbound Shapes
//!
//! Checked in priority order, first match wins:
//!
//! | Shape                                      | Classification      |
//! |--------------------------------------------|---------------------|
//! | `{type: "error", message?}`                | `Error`             |
//! | `{link, vtt_link?, srt_link?}`             | `Success`           |
//! | `{video_link, status: "completed"}`        | `Success`           |
//! | `{percent: <number>}`                      | `Progress`          |
//! | `{type: "progress", progress?, message?}`  | `Progress`          |
//! | `{message}`                                | `Info`              |
//! | anything else                              | `Unrecognized`      |

mod classify;
mod message;
mod session;

pub use classify::{classify, Classification, GeneratedArtifact};
pub use message::{GenerationRequest, InboundMessage};
pub use session::{
    SessionEvent, SessionMachine, SessionOutcome, SessionRequest, SessionState, SessionStats,
};

/// Default service endpoint
pub const DEFAULT_ENDPOINT: &str =
    "wss://50fa8sjxo9.execute-api.us-west-2.amazonaws.com/production";

/// The single supported generation mode
pub const GENERATION_ACTION: &str = "finetuned_live_gen";

/// Default session deadline (3 minutes)
pub const DEFAULT_DEADLINE_SECS: u64 = 180;
