//! Node configuration types.
//!
//! Settings are layered: built-in defaults, then an optional YAML file, then
//! `CALLBOARD__*` environment variables. Command-line flags are applied on
//! top by the binary.
//!
//! ```yaml
//! api_addr: "127.0.0.1:8080"
//! log_level: debug
//! log_format: json
//! transport:
//!   kind: websocket
//!   url: "ws://events.internal:9001/calls"
//!   connect_timeout_ms: 5000
//!   idle_timeout_ms: 60000
//! reconnect:
//!   base_delay_ms: 500
//!   max_attempts: 8
//! ```

use crate::observability::LogFormat;
use callboard_realtime::{RealtimeConfig, RealtimeError, ReconnectConfig, TransportConfig};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use thiserror::Error;

/// Environment variable prefix, e.g. `CALLBOARD__API_ADDR`.
pub const ENV_PREFIX: &str = "CALLBOARD";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum NodeConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error(transparent)]
    Invalid(#[from] RealtimeError),
}

/// Configuration for the Callboard node.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct NodeConfig {
    /// Status API listen address.
    #[serde(default = "default_api_addr")]
    pub api_addr: SocketAddr,
    /// Log level.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Log output format.
    #[serde(default)]
    pub log_format: LogFormat,
    /// Event source.
    #[serde(default)]
    pub transport: TransportConfig,
    /// Reconnection backoff.
    #[serde(default)]
    pub reconnect: ReconnectConfig,
}

fn default_api_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            api_addr: default_api_addr(),
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            transport: TransportConfig::default(),
            reconnect: ReconnectConfig::default(),
        }
    }
}

impl NodeConfig {
    /// Load settings from defaults, an optional file, and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, NodeConfigError> {
        let mut builder = ::config::Config::builder()
            .set_default("api_addr", default_api_addr().to_string())?
            .set_default("log_level", default_log_level())?
            .set_default("log_format", LogFormat::default().as_str())?;

        if let Some(path) = path {
            builder = builder.add_source(::config::File::from(path).required(true));
        }

        let settings = builder
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Check every setting.
    pub fn validate(&self) -> Result<(), NodeConfigError> {
        if self.api_addr.port() == 0 {
            return Err(NodeConfigError::InvalidAddress(format!(
                "api_addr {} has no port",
                self.api_addr
            )));
        }
        self.realtime().validate()?;
        Ok(())
    }

    /// The real-time pipeline settings.
    pub fn realtime(&self) -> RealtimeConfig {
        RealtimeConfig {
            transport: self.transport.clone(),
            reconnect: self.reconnect,
        }
    }
}
