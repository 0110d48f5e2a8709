//! WebSocket transport built on `tokio-tungstenite`.
//!
//! `wss://` endpoints use rustls with the webpki root store.

use std::time::Duration;

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use super::{Connection, Connector, TransportFuture};
use crate::error::{LivegenError, Result};

/// Default timeout for establishing a connection
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Opens WebSocket connections.
#[derive(Debug, Clone)]
pub struct WsConnector {
    connect_timeout: Duration,
}

impl WsConnector {
    /// Create a connector with the default connect timeout.
    pub fn new() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Set a custom connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

impl Default for WsConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl Connector for WsConnector {
    fn connect<'a>(
        &'a self,
        endpoint: &'a str,
    ) -> TransportFuture<'a, Result<Box<dyn Connection>>> {
        Box::pin(async move {
            tracing::info!("Connecting to WebSocket: {}", endpoint);

            let (stream, _) = tokio::time::timeout(self.connect_timeout, connect_async(endpoint))
                .await
                .map_err(|_| {
                    LivegenError::Network(format!(
                        "Timeout connecting to {} after {:?}",
                        endpoint, self.connect_timeout
                    ))
                })??;

            tracing::info!("WebSocket connection established");
            Ok(Box::new(WsConnection::new(stream)) as Box<dyn Connection>)
        })
    }

    fn name(&self) -> &'static str {
        "WebSocket"
    }
}

/// An open WebSocket connection.
pub struct WsConnection {
    write: SplitSink<WsStream, Message>,
    read: SplitStream<WsStream>,
}

impl WsConnection {
    fn new(stream: WsStream) -> Self {
        let (write, read) = stream.split();
        Self { write, read }
    }
}

impl Connection for WsConnection {
    fn send_text(&mut self, text: String) -> TransportFuture<'_, Result<()>> {
        Box::pin(async move {
            self.write.send(Message::Text(text)).await?;
            Ok(())
        })
    }

    fn next_text(&mut self) -> TransportFuture<'_, Option<std::result::Result<String, String>>> {
        Box::pin(async move {
            while let Some(frame) = self.read.next().await {
                match frame {
                    Ok(Message::Text(text)) => return Some(Ok(text)),
                    Ok(Message::Binary(data)) => {
                        return Some(Ok(String::from_utf8_lossy(&data).into_owned()));
                    },
                    Ok(Message::Close(frame)) => {
                        tracing::debug!(?frame, "Close frame received");
                        return None;
                    },
                    Ok(_) => continue,
                    Err(e) => return Some(Err(e.to_string())),
                }
            }
            None
        })
    }

    fn close(self: Box<Self>) -> TransportFuture<'static, ()> {
        Box::pin(async move {
            let mut write = self.write;
            if let Err(e) = write.close().await {
                tracing::debug!("WebSocket close: {}", e);
            }
            tracing::info!("WebSocket connection closed");
        })
    }
}
