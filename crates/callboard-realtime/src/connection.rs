//! Connection lifecycle management.
//!
//! ```text
//!  Disconnected ──connect()──▶ Connecting ──established──▶ Connected
//!                                  ▲   │                       │
//!                          timer   │   │ failed          dropped
//!                                  │   ▼                       │
//!                              Reconnecting ◀──────────────────┘
//!                                  │
//!                                  │ attempt cap reached
//!                                  ▼
//!                                Failed ──connect()──▶ Connecting
//! ```
//!
//! `disconnect()` moves any state to `Disconnected` and cancels pending work.

use crate::backoff::BackoffPolicy;
use crate::bus::EventBus;
use crate::error::RealtimeError;
use crate::notification::{Notification, NotificationSink};
use crate::transport::Transport;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Connection state. Exactly one is current at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// Not connected and not trying to be.
    Disconnected,
    /// A connection attempt is in flight.
    Connecting,
    /// Events are flowing.
    Connected,
    /// Waiting for the backoff timer before the next attempt.
    Reconnecting,
    /// Attempt cap exhausted; waiting for a manual `connect()`.
    Failed,
}

impl ConnectionState {
    /// Whether the manager is connected or working towards it.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            ConnectionState::Connecting | ConnectionState::Connected | ConnectionState::Reconnecting
        )
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "disconnected"),
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::Connected => write!(f, "connected"),
            ConnectionState::Reconnecting => write!(f, "reconnecting"),
            ConnectionState::Failed => write!(f, "failed"),
        }
    }
}

/// Owns a transport's lifecycle and forwards its events to the bus.
pub struct ConnectionManager {
    shared: Arc<Shared>,
}

struct Shared {
    transport: Arc<dyn Transport>,
    bus: Arc<EventBus>,
    policy: BackoffPolicy,
    notifier: Arc<dyn NotificationSink>,
    control: Mutex<Control>,
    state_tx: watch::Sender<ConnectionState>,
}

/// Mutable bookkeeping. State changes happen only while this is locked.
struct Control {
    attempts: u32,
    /// Bumped by every `connect()`/`disconnect()`; driver tasks carrying an
    /// older value are stale and must not touch anything.
    generation: u64,
    task: Option<JoinHandle<()>>,
}

enum Retry {
    After { delay: Duration, attempt: u32 },
    GiveUp,
    Stale,
}

impl ConnectionManager {
    /// Create a manager in the `Disconnected` state.
    pub fn new(
        transport: Arc<dyn Transport>,
        bus: Arc<EventBus>,
        policy: BackoffPolicy,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            shared: Arc::new(Shared {
                transport,
                bus,
                policy,
                notifier,
                control: Mutex::new(Control {
                    attempts: 0,
                    generation: 0,
                    task: None,
                }),
                state_tx,
            }),
        }
    }

    /// Start connecting.
    ///
    /// From `Disconnected` or `Failed` this resets the attempt counter and
    /// enters `Connecting`. While already connecting, connected, or waiting
    /// to reconnect it does nothing.
    pub fn connect(&self) -> Result<(), RealtimeError> {
        let runtime = Handle::try_current().map_err(|_| RealtimeError::RuntimeUnavailable)?;

        let mut control = self.shared.control.lock();
        let state = *self.shared.state_tx.borrow();
        if state.is_active() {
            debug!(state = %state, "Connect ignored, connection already active");
            return Ok(());
        }

        if let Some(task) = control.task.take() {
            task.abort();
        }
        control.generation += 1;
        control.attempts = 0;
        self.shared.state_tx.send_replace(ConnectionState::Connecting);

        info!(
            transport = self.shared.transport.name(),
            previous = %state,
            "Connecting"
        );

        control.task = Some(runtime.spawn(drive(self.shared.clone(), control.generation)));
        Ok(())
    }

    /// Stop everything and enter `Disconnected`.
    ///
    /// Cancels the active connection and any pending retry. Never triggers
    /// reconnection.
    pub fn disconnect(&self) {
        let mut control = self.shared.control.lock();
        control.generation += 1;
        control.attempts = 0;
        if let Some(task) = control.task.take() {
            task.abort();
        }

        let previous = self
            .shared
            .state_tx
            .send_replace(ConnectionState::Disconnected);
        if previous != ConnectionState::Disconnected {
            info!(previous = %previous, "Disconnected");
        }
    }

    /// Current connection state.
    pub fn current_state(&self) -> ConnectionState {
        *self.shared.state_tx.borrow()
    }

    /// Retries made since the last successful connection.
    pub fn attempts(&self) -> u32 {
        self.shared.control.lock().attempts
    }

    /// Observe state transitions.
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.shared.state_tx.subscribe()
    }

    /// Backoff policy in use.
    pub fn policy(&self) -> BackoffPolicy {
        self.shared.policy
    }

    /// Name of the underlying transport.
    pub fn transport_name(&self) -> &'static str {
        self.shared.transport.name()
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        if let Some(task) = self.shared.control.lock().task.take() {
            task.abort();
        }
    }
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("transport", &self.shared.transport.name())
            .field("state", &self.current_state())
            .field("policy", &self.shared.policy)
            .finish_non_exhaustive()
    }
}

impl Shared {
    fn is_current(&self, generation: u64) -> bool {
        self.control.lock().generation == generation
    }

    fn transition<F>(&self, generation: u64, apply: F) -> bool
    where
        F: FnOnce(&mut Control) -> ConnectionState,
    {
        let mut control = self.control.lock();
        if control.generation != generation {
            return false;
        }
        let next = apply(&mut control);
        self.state_tx.send_replace(next);
        true
    }

    /// Raise the failure notification unless a later `connect()` or
    /// `disconnect()` superseded this cycle after it reached `Failed`.
    fn report_give_up(&self, generation: u64) -> bool {
        if !self.is_current(generation) {
            debug!("Give-up superseded, notification skipped");
            return false;
        }

        error!(
            transport = self.transport.name(),
            max_attempts = self.policy.max_attempts,
            "Reconnection attempts exhausted"
        );
        self.notifier.notify(Notification::error(
            "Connection lost",
            format!(
                "Real-time updates stopped after {} reconnection attempts",
                self.policy.max_attempts
            ),
        ));
        true
    }

    fn after_failure(&self, generation: u64) -> Retry {
        let mut control = self.control.lock();
        if control.generation != generation {
            return Retry::Stale;
        }

        match self.policy.next_delay(control.attempts) {
            Some(delay) => {
                control.attempts += 1;
                self.state_tx.send_replace(ConnectionState::Reconnecting);
                Retry::After {
                    delay,
                    attempt: control.attempts,
                }
            }
            None => {
                control.task = None;
                self.state_tx.send_replace(ConnectionState::Failed);
                Retry::GiveUp
            }
        }
    }
}

/// Drives one connect/stream/retry cycle until failure or cancellation.
async fn drive(shared: Arc<Shared>, generation: u64) {
    let transport = shared.transport.name();

    loop {
        match shared.transport.connect().await {
            Ok(mut session) => {
                let established = shared.transition(generation, |control| {
                    control.attempts = 0;
                    ConnectionState::Connected
                });
                if !established {
                    return;
                }
                info!(transport = transport, "Connected");

                let reason = loop {
                    match session.next_event().await {
                        Ok(event) => {
                            if !shared.is_current(generation) {
                                return;
                            }
                            shared.bus.emit(&event);
                        }
                        Err(e) => break e,
                    }
                };
                warn!(transport = transport, error = %reason, "Connection dropped");
            }
            Err(e) => {
                warn!(transport = transport, error = %e, "Connection attempt failed");
            }
        }

        match shared.after_failure(generation) {
            Retry::After { delay, attempt } => {
                warn!(
                    transport = transport,
                    attempt = attempt,
                    max_attempts = shared.policy.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    "Reconnecting after delay"
                );
                tokio::time::sleep(delay).await;
            }
            Retry::GiveUp => {
                shared.report_give_up(generation);
                return;
            }
            Retry::Stale => return,
        }

        if !shared.transition(generation, |_| ConnectionState::Connecting) {
            return;
        }
        debug!(transport = transport, "Retrying connection");
    }
}
