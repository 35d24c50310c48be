//! Error types for the real-time module.

use thiserror::Error;

/// Errors surfaced by the real-time API to its callers.
///
/// Connectivity problems never show up here; the connection manager absorbs
/// them and reports them through state transitions instead.
#[derive(Debug, Error)]
pub enum RealtimeError {
    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// `connect()` was called outside a tokio runtime.
    #[error("no tokio runtime available to drive the connection")]
    RuntimeUnavailable,

    /// Transport error.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Errors produced by a transport while connecting or streaming events.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The connection attempt failed.
    #[error("connection failed: {0}")]
    ConnectFailed(String),

    /// The remote end closed the connection.
    #[error("connection closed")]
    Closed,

    /// Socket level failure on an established connection.
    #[error("socket error: {0}")]
    Socket(String),
}

/// An inbound frame could not be turned into a call event.
#[derive(Debug, Error)]
pub enum FrameError {
    /// Not valid JSON, unknown event type, or wrong shape.
    #[error("malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Frame exceeds the size limit.
    #[error("frame too large: {0} bytes")]
    TooLarge(usize),
}

/// Error returned by a subscriber callback.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct HandlerError(String);

impl HandlerError {
    /// Create a handler error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    /// The error message.
    pub fn message(&self) -> &str {
        &self.0
    }
}
