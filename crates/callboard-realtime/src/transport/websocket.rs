//! Live event source over a WebSocket.
//!
//! Every text frame is expected to hold one JSON-encoded [`CallEvent`]. Frames
//! that fail to parse are dropped with a warning so that only well-formed
//! events ever reach the bus. A close frame, end of stream, or socket error
//! ends the session, which the connection manager treats as a drop.
//!
//! The opening handshake is bounded by a connect timeout. An optional idle
//! timeout ends a session that has received no frames at all, pings
//! included, for that long.

use super::frame::parse_frame;
use super::{Transport, TransportSession};
use crate::error::TransportError;
use crate::event::CallEvent;
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;
type Frame = Option<Result<Message, tokio_tungstenite::tungstenite::Error>>;

/// Default bound on the TCP connect plus WebSocket handshake.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Connects to a `ws://` (or, with the `tls` feature, `wss://`) endpoint.
#[derive(Debug, Clone)]
pub struct WebSocketTransport {
    url: String,
    connect_timeout: Duration,
    idle_timeout: Option<Duration>,
}

impl WebSocketTransport {
    /// Create a transport for `url` with the default connect timeout and no
    /// idle timeout.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            idle_timeout: None,
        }
    }

    /// Bound the opening handshake.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Drop sessions that receive nothing for `timeout`.
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = Some(timeout);
        self
    }

    /// Endpoint URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Handshake bound.
    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Idle bound for established sessions, if any.
    pub fn idle_timeout(&self) -> Option<Duration> {
        self.idle_timeout
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    fn name(&self) -> &'static str {
        "websocket"
    }

    async fn connect(&self) -> Result<Box<dyn TransportSession>, TransportError> {
        let handshake =
            tokio::time::timeout(self.connect_timeout, connect_async(self.url.as_str()));
        let (socket, response) = match handshake.await {
            Ok(result) => result.map_err(|e| TransportError::ConnectFailed(e.to_string()))?,
            Err(_) => {
                return Err(TransportError::ConnectFailed(format!(
                    "handshake timed out after {}ms",
                    self.connect_timeout.as_millis()
                )))
            }
        };

        info!(url = %self.url, status = %response.status(), "WebSocket connected");

        Ok(Box::new(WebSocketSession {
            socket,
            url: self.url.clone(),
            idle_timeout: self.idle_timeout,
        }))
    }
}

struct WebSocketSession {
    socket: Socket,
    url: String,
    idle_timeout: Option<Duration>,
}

impl WebSocketSession {
    async fn next_frame(&mut self) -> Result<Frame, TransportError> {
        match self.idle_timeout {
            Some(idle) => tokio::time::timeout(idle, self.socket.next())
                .await
                .map_err(|_| {
                    TransportError::Socket(format!("no frames for {}ms", idle.as_millis()))
                }),
            None => Ok(self.socket.next().await),
        }
    }

    fn decode(&self, text: &str) -> Option<CallEvent> {
        match parse_frame(text) {
            Ok(event) => Some(event),
            Err(e) => {
                warn!(url = %self.url, error = %e, "Dropping inbound frame");
                None
            }
        }
    }
}

#[async_trait]
impl TransportSession for WebSocketSession {
    async fn next_event(&mut self) -> Result<CallEvent, TransportError> {
        loop {
            match self.next_frame().await? {
                Some(Ok(Message::Text(text))) => {
                    if let Some(event) = self.decode(text.as_str()) {
                        return Ok(event);
                    }
                }
                Some(Ok(Message::Binary(data))) => match std::str::from_utf8(&data) {
                    Ok(text) => {
                        if let Some(event) = self.decode(text) {
                            return Ok(event);
                        }
                    }
                    Err(_) => warn!(url = %self.url, len = data.len(), "Dropping non-UTF-8 frame"),
                },
                Some(Ok(Message::Ping(payload))) => {
                    self.socket
                        .send(Message::Pong(payload))
                        .await
                        .map_err(|e| TransportError::Socket(e.to_string()))?;
                }
                Some(Ok(Message::Pong(_))) | Some(Ok(Message::Frame(_))) => {}
                Some(Ok(Message::Close(frame))) => {
                    debug!(url = %self.url, frame = ?frame, "WebSocket close received");
                    return Err(TransportError::Closed);
                }
                Some(Err(e)) => return Err(TransportError::Socket(e.to_string())),
                None => return Err(TransportError::Closed),
            }
        }
    }
}
