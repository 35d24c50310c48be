//! Event sources.
//!
//! A [`Transport`] knows how to open a connection; the resulting
//! [`TransportSession`] yields [`CallEvent`]s until the connection drops. The
//! connection manager owns the lifecycle and forwards every event to the bus,
//! so neither the bus nor the manager cares where events come from.

pub mod frame;
pub mod simulated;
pub mod websocket;

use crate::error::{RealtimeError, TransportError};
use crate::event::CallEvent;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

pub use simulated::SimulatedTransport;
pub use websocket::WebSocketTransport;

/// Opens connections to an event source.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Establish a connection.
    async fn connect(&self) -> Result<Box<dyn TransportSession>, TransportError>;
}

/// An established connection.
#[async_trait]
pub trait TransportSession: Send {
    /// Wait for the next well-formed event.
    ///
    /// An `Err` means the connection dropped; the session must not be polled
    /// again afterwards.
    async fn next_event(&mut self) -> Result<CallEvent, TransportError>;
}

/// Transport selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransportConfig {
    /// Periodic synthetic events.
    Simulated {
        /// Interval between events in milliseconds.
        #[serde(default = "default_tick_interval_ms")]
        tick_interval_ms: u64,
        /// RNG seed for a reproducible stream.
        #[serde(default)]
        seed: Option<u64>,
    },
    /// Live events from a WebSocket endpoint.
    #[serde(rename = "websocket")]
    WebSocket {
        /// `ws://` or `wss://` URL.
        url: String,
        /// Bound on the opening handshake in milliseconds.
        #[serde(default = "default_connect_timeout_ms")]
        connect_timeout_ms: u64,
        /// Drop a session after this many milliseconds without frames.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        idle_timeout_ms: Option<u64>,
    },
}

fn default_tick_interval_ms() -> u64 {
    simulated::DEFAULT_TICK_INTERVAL.as_millis() as u64
}

fn default_connect_timeout_ms() -> u64 {
    websocket::DEFAULT_CONNECT_TIMEOUT.as_millis() as u64
}

impl Default for TransportConfig {
    fn default() -> Self {
        TransportConfig::Simulated {
            tick_interval_ms: default_tick_interval_ms(),
            seed: None,
        }
    }
}

impl TransportConfig {
    /// WebSocket settings for `url` with default timeouts.
    pub fn websocket(url: impl Into<String>) -> Self {
        TransportConfig::WebSocket {
            url: url.into(),
            connect_timeout_ms: default_connect_timeout_ms(),
            idle_timeout_ms: None,
        }
    }

    /// Check the settings without building anything.
    pub fn validate(&self) -> Result<(), RealtimeError> {
        match self {
            TransportConfig::Simulated {
                tick_interval_ms, ..
            } => {
                if *tick_interval_ms == 0 {
                    return Err(RealtimeError::InvalidConfig(
                        "tick_interval_ms must be greater than zero".to_string(),
                    ));
                }
            }
            TransportConfig::WebSocket {
                url,
                connect_timeout_ms,
                idle_timeout_ms,
            } => {
                if !(url.starts_with("ws://") || url.starts_with("wss://")) {
                    return Err(RealtimeError::InvalidConfig(format!(
                        "websocket url must use ws:// or wss://: {}",
                        url
                    )));
                }
                if *connect_timeout_ms == 0 {
                    return Err(RealtimeError::InvalidConfig(
                        "connect_timeout_ms must be greater than zero".to_string(),
                    ));
                }
                if *idle_timeout_ms == Some(0) {
                    return Err(RealtimeError::InvalidConfig(
                        "idle_timeout_ms must be greater than zero when set".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Build the configured transport.
    pub fn build(&self) -> Result<Arc<dyn Transport>, RealtimeError> {
        self.validate()?;
        let transport: Arc<dyn Transport> = match self {
            TransportConfig::Simulated {
                tick_interval_ms,
                seed,
            } => {
                let mut transport =
                    SimulatedTransport::new(Duration::from_millis(*tick_interval_ms));
                if let Some(seed) = seed {
                    transport = transport.with_seed(*seed);
                }
                Arc::new(transport)
            }
            TransportConfig::WebSocket {
                url,
                connect_timeout_ms,
                idle_timeout_ms,
            } => {
                let mut transport = WebSocketTransport::new(url.clone())
                    .with_connect_timeout(Duration::from_millis(*connect_timeout_ms));
                if let Some(idle) = idle_timeout_ms {
                    transport = transport.with_idle_timeout(Duration::from_millis(*idle));
                }
                Arc::new(transport)
            }
        };
        Ok(transport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_simulated() {
        let config = TransportConfig::default();
        assert_eq!(
            config,
            TransportConfig::Simulated {
                tick_interval_ms: 15_000,
                seed: None
            }
        );
        assert_eq!(config.build().unwrap().name(), "simulated");
    }

    #[test]
    fn test_config_deserialization() {
        let config: TransportConfig =
            serde_json::from_str(r#"{"kind":"websocket","url":"ws://localhost:9001/events"}"#)
                .unwrap();
        assert_eq!(config, TransportConfig::websocket("ws://localhost:9001/events"));
        assert_eq!(config.build().unwrap().name(), "websocket");

        let config: TransportConfig = serde_json::from_str(
            r#"{"kind":"websocket","url":"ws://h/e","connect_timeout_ms":250,"idle_timeout_ms":30000}"#,
        )
        .unwrap();
        assert_eq!(
            config,
            TransportConfig::WebSocket {
                url: "ws://h/e".to_string(),
                connect_timeout_ms: 250,
                idle_timeout_ms: Some(30_000),
            }
        );

        let config: TransportConfig =
            serde_json::from_str(r#"{"kind":"simulated","seed":7}"#).unwrap();
        assert!(matches!(
            config,
            TransportConfig::Simulated {
                tick_interval_ms: 15_000,
                seed: Some(7)
            }
        ));
    }

    #[test]
    fn test_config_validation() {
        let zero = TransportConfig::Simulated {
            tick_interval_ms: 0,
            seed: None,
        };
        assert!(matches!(
            zero.validate(),
            Err(RealtimeError::InvalidConfig(_))
        ));

        let http = TransportConfig::websocket("http://localhost");
        assert!(http.build().is_err());

        let no_handshake_bound = TransportConfig::WebSocket {
            url: "ws://localhost".to_string(),
            connect_timeout_ms: 0,
            idle_timeout_ms: None,
        };
        assert!(no_handshake_bound.validate().is_err());

        let zero_idle = TransportConfig::WebSocket {
            url: "ws://localhost".to_string(),
            connect_timeout_ms: 1_000,
            idle_timeout_ms: Some(0),
        };
        assert!(zero_idle.validate().is_err());
    }
}
