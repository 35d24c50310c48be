//! Binds incoming call events to cache invalidation and notifications.

use crate::bus::{EventBus, SubscriptionHandle};
use crate::cache::{QueryCache, QueryKey};
use crate::connection::ConnectionManager;
use crate::error::RealtimeError;
use crate::event::{CallEvent, CallEventType};
use crate::notification::{Notification, NotificationMetadata, NotificationSink};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info};

/// The consumer side of the real-time core.
///
/// While active it holds exactly four registrations on the bus, one per
/// event type, and removes exactly those on deactivation. It does not own the
/// bus or the connection manager.
pub struct RealtimeBinding {
    bus: Arc<EventBus>,
    connection: Arc<ConnectionManager>,
    cache: Arc<dyn QueryCache>,
    notifier: Arc<dyn NotificationSink>,
    handles: Mutex<Vec<SubscriptionHandle>>,
}

impl RealtimeBinding {
    /// Create an inactive binding.
    pub fn new(
        bus: Arc<EventBus>,
        connection: Arc<ConnectionManager>,
        cache: Arc<dyn QueryCache>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            bus,
            connection,
            cache,
            notifier,
            handles: Mutex::new(Vec::new()),
        }
    }

    /// Connect and subscribe the four handlers.
    ///
    /// Calling this while already active subscribes nothing new.
    pub fn activate(&self) -> Result<(), RealtimeError> {
        let mut handles = self.handles.lock();
        self.connection.connect()?;
        if !handles.is_empty() {
            debug!("Binding already active");
            return Ok(());
        }

        for event_type in CallEventType::ALL {
            let cache = self.cache.clone();
            let notifier = self.notifier.clone();
            let handle = self.bus.subscribe(event_type, move |event| {
                apply(event, cache.as_ref(), notifier.as_ref());
                Ok(())
            });
            handles.push(handle);
        }

        info!(subscriptions = handles.len(), "Realtime binding activated");
        Ok(())
    }

    /// Unsubscribe every handler registered by `activate` and disconnect.
    ///
    /// Safe to call any number of times, including before `activate`.
    pub fn deactivate(&self) {
        let handles = std::mem::take(&mut *self.handles.lock());
        let removed = handles
            .into_iter()
            .filter(|handle| self.bus.unsubscribe(*handle))
            .count();
        self.connection.disconnect();

        if removed > 0 {
            info!(subscriptions = removed, "Realtime binding deactivated");
        }
    }

    /// Whether the handlers are currently registered.
    pub fn is_active(&self) -> bool {
        !self.handles.lock().is_empty()
    }

    /// The bus the handlers are registered on.
    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    /// The connection manager this binding drives.
    pub fn connection(&self) -> &Arc<ConnectionManager> {
        &self.connection
    }
}

impl Drop for RealtimeBinding {
    fn drop(&mut self) {
        self.deactivate();
    }
}

fn apply(event: &CallEvent, cache: &dyn QueryCache, notifier: &dyn NotificationSink) {
    let call = event.data.call_id.as_deref().unwrap_or("unknown");
    let metadata = NotificationMetadata {
        call_id: event.data.call_id.clone(),
        agent_id: event.data.agent_id.clone(),
    };

    match event.event_type {
        CallEventType::CallStarted => {
            cache.invalidate(QueryKey::Calls);
            cache.invalidate(QueryKey::LiveMonitoring);
            notifier.notify(
                Notification::success("Call started", format!("New call started: {}", call))
                    .with_metadata(metadata),
            );
        }
        CallEventType::CallEnded => {
            cache.invalidate(QueryKey::Calls);
            cache.invalidate(QueryKey::LiveMonitoring);
            notifier.notify(
                Notification::info("Call ended", format!("Call ended: {}", call))
                    .with_metadata(metadata),
            );
        }
        CallEventType::AgentStatusChanged => {
            cache.invalidate(QueryKey::Agents);
            cache.invalidate(QueryKey::LiveMonitoring);
        }
        CallEventType::CallTransferred => {
            cache.invalidate(QueryKey::Calls);
            notifier.notify(
                Notification::info("Call transferred", format!("Call transferred: {}", call))
                    .with_metadata(metadata),
            );
        }
    }
}
