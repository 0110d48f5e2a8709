//! Transport layer abstraction for generation sessions.
//!
//! The driver talks to the service through two small traits so it can be
//! exercised without a network:
//!
//! - [`Connector`] opens a connection to an endpoint.
//! - [`Connection`] sends text, yields inbound text, and is released by
//!   [`Connection::close`], which consumes it.
//!
//! [`WsConnector`] is the production implementation on top of
//! `tokio-tungstenite`.
//!
//! # Usage
//!
//! ```rust,ignore
//! use livegen::transport::{Connector, WsConnector};
//!
//! let connector = WsConnector::new();
//! let mut conn = connector.connect("wss://example.com/production").await?;
//! conn.send_text(r#"{"action":"finetuned_live_gen"}"#.to_string()).await?;
//! while let Some(frame) = conn.next_text().await { /* ... */ }
//! conn.close().await;
//! ```

mod websocket;

pub use websocket::{WsConnection, WsConnector, DEFAULT_CONNECT_TIMEOUT};

use std::future::Future;
use std::pin::Pin;

use crate::error::Result;

/// Boxed future returned by transport methods.
pub type TransportFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// An open, message-oriented connection.
pub trait Connection: Send {
    /// Send one text message.
    fn send_text(&mut self, text: String) -> TransportFuture<'_, Result<()>>;

    /// Wait for the next inbound text message.
    ///
    /// Returns `Some(Err(reason))` on a transport error and `None` once the
    /// remote side has closed the connection. Must be cancel-safe: dropping
    /// the future loses no message.
    fn next_text(&mut self) -> TransportFuture<'_, Option<std::result::Result<String, String>>>;

    /// Release the connection. Consuming `self` makes a second release
    /// impossible.
    fn close(self: Box<Self>) -> TransportFuture<'static, ()>;
}

/// Opens connections to an endpoint.
pub trait Connector: Send + Sync {
    /// Establish a connection.
    fn connect<'a>(&'a self, endpoint: &'a str) -> TransportFuture<'a, Result<Box<dyn Connection>>>;

    /// Get the transport name for logging.
    fn name(&self) -> &'static str;
}
