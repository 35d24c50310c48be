//! Real-time core configuration.

use crate::backoff::{BackoffPolicy, DEFAULT_BASE_DELAY, DEFAULT_MAX_ATTEMPTS};
use crate::binding::RealtimeBinding;
use crate::bus::EventBus;
use crate::cache::QueryCache;
use crate::connection::ConnectionManager;
use crate::error::RealtimeError;
use crate::notification::NotificationSink;
use crate::transport::TransportConfig;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Settings for the whole real-time pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Event source.
    #[serde(default)]
    pub transport: TransportConfig,
    /// Reconnection backoff.
    #[serde(default)]
    pub reconnect: ReconnectConfig,
}

/// Reconnection backoff settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconnectConfig {
    /// Delay before the first retry, in milliseconds.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Automatic retries before giving up.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

fn default_base_delay_ms() -> u64 {
    DEFAULT_BASE_DELAY.as_millis() as u64
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: default_base_delay_ms(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl ReconnectConfig {
    /// Backoff policy described by these settings.
    pub fn policy(&self) -> BackoffPolicy {
        BackoffPolicy::new(Duration::from_millis(self.base_delay_ms), self.max_attempts)
    }
}

impl RealtimeConfig {
    /// Check every setting.
    pub fn validate(&self) -> Result<(), RealtimeError> {
        self.transport.validate()?;
        if self.reconnect.base_delay_ms == 0 {
            return Err(RealtimeError::InvalidConfig(
                "reconnect.base_delay_ms must be greater than zero".to_string(),
            ));
        }
        if self.reconnect.max_attempts == 0 {
            return Err(RealtimeError::InvalidConfig(
                "reconnect.max_attempts must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Wire a bus, connection manager, and binding from these settings.
    ///
    /// The returned binding is inactive.
    pub fn build(
        &self,
        cache: Arc<dyn QueryCache>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Result<RealtimeBinding, RealtimeError> {
        self.validate()?;

        let bus = Arc::new(EventBus::new());
        let connection = Arc::new(ConnectionManager::new(
            self.transport.build()?,
            bus.clone(),
            self.reconnect.policy(),
            notifier.clone(),
        ));
        Ok(RealtimeBinding::new(bus, connection, cache, notifier))
    }
}
