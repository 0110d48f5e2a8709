//! Session driver: runs one generation exchange end to end.
//!
//! The driver owns the connection for the lifetime of a session. It opens
//! the connection, sends the single request envelope, then multiplexes three
//! event sources (inbound frames, transport loss, the deadline timer) into
//! one ordered stream fed to a [`SessionMachine`]. Whichever event reaches
//! the terminal transition first decides the outcome. The connection is
//! released exactly once before the outcome is returned.
//!
//! ```text
//!  connect ──fail──────────────────────────────> Failed(Connection)
//!     │
//!     v
//!  send request ──┐
//!                 │   ┌── inbound frame ──> classify ──> Success / Error
//!  deadline timer ┼──>┼── transport close/error ──────> Failed(Connection)
//!                 │   └── deadline ───────────────────> Failed(Timeout)
//!                 v
//!            close connection (once) ──> outcome
//! ```

use std::sync::Arc;
use std::time::Duration;

use crate::error::Result;
use crate::protocol::{
    SessionEvent, SessionMachine, SessionOutcome, SessionRequest, DEFAULT_DEADLINE_SECS,
    DEFAULT_ENDPOINT,
};
use crate::prompt::preview;
use crate::transport::{Connection, Connector, WsConnector};

/// Runs generation sessions against one endpoint.
///
/// Cheap to clone; sessions started from the same driver share nothing but
/// the connector.
#[derive(Clone)]
pub struct SessionDriver {
    endpoint: String,
    deadline: Duration,
    connector: Arc<dyn Connector>,
}

impl SessionDriver {
    /// Create a driver for `endpoint` using the WebSocket connector
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            deadline: Duration::from_secs(DEFAULT_DEADLINE_SECS),
            connector: Arc::new(WsConnector::new()),
        }
    }

    /// Set the default session deadline
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Use a custom connector
    pub fn with_connector(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connector = connector;
        self
    }

    /// Endpoint sessions connect to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Default session deadline
    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Run one session with the driver's default deadline.
    pub async fn run(&self, request: SessionRequest) -> SessionOutcome {
        self.run_with_deadline(request, self.deadline).await
    }

    /// Run one session.
    ///
    /// Always returns exactly one outcome; failures are carried in
    /// [`SessionOutcome::Failed`].
    pub async fn run_with_deadline(
        &self,
        request: SessionRequest,
        deadline: Duration,
    ) -> SessionOutcome {
        let mut machine = SessionMachine::new(deadline);
        machine.begin_connect();

        tracing::info!(
            session = %machine.id(),
            transport = self.connector.name(),
            "Starting video generation"
        );
        tracing::debug!(session = %machine.id(), "Task preview: {}", preview(request.task(), 100));

        let connection = match self.connector.connect(&self.endpoint).await {
            Ok(connection) => connection,
            Err(e) => {
                tracing::error!(session = %machine.id(), "Connection failed: {}", e);
                return machine.connect_failed(e.to_string());
            },
        };
        machine.opened();

        let (outcome, connection) = drive(&mut machine, connection, &request, deadline).await;
        connection.close().await;

        let stats = machine.stats();
        tracing::info!(
            session = %stats.session_id,
            state = ?stats.state,
            messages = stats.messages_received,
            progress_updates = stats.progress_updates,
            unrecognized = stats.unrecognized,
            elapsed_ms = stats.elapsed.as_millis() as u64,
            "Session finished"
        );

        outcome
    }

    /// Run one session and return the result location.
    pub async fn run_session(
        &self,
        task: impl Into<String>,
        credential: impl Into<String>,
        deadline: Duration,
    ) -> Result<String> {
        let request = SessionRequest::new(task, credential);
        let artifact = self.run_with_deadline(request, deadline).await.into_result()?;
        Ok(artifact.location)
    }
}

impl Default for SessionDriver {
    fn default() -> Self {
        Self::new(DEFAULT_ENDPOINT)
    }
}

impl std::fmt::Debug for SessionDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionDriver")
            .field("endpoint", &self.endpoint)
            .field("deadline", &self.deadline)
            .field("connector", &self.connector.name())
            .finish()
    }
}

/// Run one session against `endpoint` over WebSocket and return the result
/// location.
pub async fn run_session(
    endpoint: &str,
    task: impl Into<String>,
    credential: impl Into<String>,
    deadline: Duration,
) -> Result<String> {
    SessionDriver::new(endpoint)
        .run_session(task, credential, deadline)
        .await
}

/// Send the request and pump events until the machine terminates.
///
/// Hands the connection back so the caller releases it on every path.
async fn drive(
    machine: &mut SessionMachine,
    mut connection: Box<dyn Connection>,
    request: &SessionRequest,
    deadline: Duration,
) -> (SessionOutcome, Box<dyn Connection>) {
    let timer = tokio::time::sleep(deadline);
    tokio::pin!(timer);

    let first = match request.envelope().to_json() {
        Ok(payload) => {
            tracing::info!(session = %machine.id(), "Sending request payload");
            tokio::select! {
                sent = connection.send_text(payload) => match sent {
                    Ok(()) => None,
                    Err(e) => Some(SessionEvent::TransportError(e.to_string())),
                },
                () = &mut timer => Some(SessionEvent::DeadlineElapsed),
            }
        },
        Err(e) => Some(SessionEvent::TransportError(e.to_string())),
    };

    if let Some(event) = first {
        if let Some(outcome) = machine.handle(event) {
            return (outcome, connection);
        }
    }

    loop {
        let event = tokio::select! {
            frame = connection.next_text() => match frame {
                Some(Ok(text)) => SessionEvent::Inbound(text),
                Some(Err(reason)) => SessionEvent::TransportError(reason),
                None => SessionEvent::TransportClosed,
            },
            () = &mut timer => SessionEvent::DeadlineElapsed,
        };

        if let Some(outcome) = machine.handle(event) {
            return (outcome, connection);
        }
    }
}
