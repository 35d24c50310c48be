//! Type-keyed publish/subscribe event bus.

use crate::error::HandlerError;
use crate::event::{CallEvent, CallEventData, CallEventType};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error, trace};

/// Source of bus identifiers, so handles cannot cross buses.
static NEXT_BUS_ID: AtomicU64 = AtomicU64::new(1);

/// Subscriber callback.
pub type Handler = Arc<dyn Fn(&CallEvent) -> Result<(), HandlerError> + Send + Sync>;

/// Receives every handler fault raised during `emit`.
pub type ErrorObserver = Arc<dyn Fn(&HandlerFault) + Send + Sync>;

/// Opaque token identifying one `subscribe` registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle {
    bus_id: u64,
    id: u64,
    event_type: CallEventType,
}

impl SubscriptionHandle {
    /// Event type this registration listens to.
    pub fn event_type(&self) -> CallEventType {
        self.event_type
    }
}

/// A subscriber failed while handling an event.
#[derive(Debug, Clone)]
pub struct HandlerFault {
    /// The registration that failed.
    pub handle: SubscriptionHandle,
    /// Type of the event being delivered.
    pub event_type: CallEventType,
    /// Error message or panic payload.
    pub reason: String,
    /// Whether the handler panicked rather than returning an error.
    pub panicked: bool,
}

/// Bus statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BusStats {
    /// Current number of registrations across all types.
    pub subscribers: usize,
    /// Total `emit` calls.
    pub total_emits: u64,
    /// Total handler invocations.
    pub total_deliveries: u64,
    /// Total handler faults.
    pub total_faults: u64,
}

struct Registration {
    id: u64,
    handler: Handler,
}

/// In-process dispatcher keyed by [`CallEventType`].
///
/// Handlers for one type run synchronously in registration order. The
/// registry lock is released before any handler runs, so handlers may
/// subscribe or unsubscribe re-entrantly; such changes apply from the next
/// `emit` onward.
pub struct EventBus {
    id: u64,
    next_registration: AtomicU64,
    registry: RwLock<HashMap<CallEventType, Vec<Registration>>>,
    error_observer: RwLock<ErrorObserver>,
    stats: RwLock<BusStats>,
}

impl EventBus {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self {
            id: NEXT_BUS_ID.fetch_add(1, Ordering::Relaxed),
            next_registration: AtomicU64::new(0),
            registry: RwLock::new(HashMap::new()),
            error_observer: RwLock::new(Arc::new(log_fault)),
            stats: RwLock::new(BusStats::default()),
        }
    }

    /// Register `handler` for `event_type`.
    pub fn subscribe<F>(&self, event_type: CallEventType, handler: F) -> SubscriptionHandle
    where
        F: Fn(&CallEvent) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        let id = self.next_registration.fetch_add(1, Ordering::Relaxed);
        self.registry
            .write()
            .entry(event_type)
            .or_default()
            .push(Registration {
                id,
                handler: Arc::new(handler),
            });
        self.stats.write().subscribers += 1;

        debug!(event = %event_type, registration = id, "Handler subscribed");

        SubscriptionHandle {
            bus_id: self.id,
            id,
            event_type,
        }
    }

    /// Remove the registration identified by `handle`.
    ///
    /// Returns `false` when the handle was already removed or was issued by
    /// another bus.
    pub fn unsubscribe(&self, handle: SubscriptionHandle) -> bool {
        if handle.bus_id != self.id {
            return false;
        }

        let mut registry = self.registry.write();
        let Some(registrations) = registry.get_mut(&handle.event_type) else {
            return false;
        };
        let Some(position) = registrations.iter().position(|r| r.id == handle.id) else {
            return false;
        };

        registrations.remove(position);
        if registrations.is_empty() {
            registry.remove(&handle.event_type);
        }
        drop(registry);

        self.stats.write().subscribers -= 1;
        debug!(event = %handle.event_type, registration = handle.id, "Handler unsubscribed");
        true
    }

    /// Deliver `event` to every current subscriber of its type.
    ///
    /// Returns the number of handlers invoked. Handler faults are reported to
    /// the error observer and never abort delivery.
    pub fn emit(&self, event: &CallEvent) -> usize {
        let event_type = event.event_type;
        let snapshot: Vec<(u64, Handler)> = self
            .registry
            .read()
            .get(&event_type)
            .map(|regs| regs.iter().map(|r| (r.id, r.handler.clone())).collect())
            .unwrap_or_default();

        if snapshot.is_empty() {
            self.stats.write().total_emits += 1;
            trace!(event = %event_type, "No subscribers");
            return 0;
        }

        let mut faults = 0u64;
        for (id, handler) in &snapshot {
            let (reason, panicked) = match catch_unwind(AssertUnwindSafe(|| handler(event))) {
                Ok(Ok(())) => continue,
                Ok(Err(e)) => (e.to_string(), false),
                Err(payload) => (panic_message(payload.as_ref()), true),
            };

            faults += 1;
            let fault = HandlerFault {
                handle: SubscriptionHandle {
                    bus_id: self.id,
                    id: *id,
                    event_type,
                },
                event_type,
                reason,
                panicked,
            };
            let observer = self.error_observer.read().clone();
            observer(&fault);
        }

        let mut stats = self.stats.write();
        stats.total_emits += 1;
        stats.total_deliveries += snapshot.len() as u64;
        stats.total_faults += faults;
        drop(stats);

        debug!(
            event = %event_type,
            recipients = snapshot.len(),
            faults = faults,
            "Event dispatched"
        );

        snapshot.len()
    }

    /// Emit an event with the given parameters.
    pub fn emit_event(&self, event_type: CallEventType, data: CallEventData) -> usize {
        self.emit(&CallEvent::new(event_type, data))
    }

    /// Replace the handler fault observer.
    pub fn set_error_observer<F>(&self, observer: F)
    where
        F: Fn(&HandlerFault) + Send + Sync + 'static,
    {
        *self.error_observer.write() = Arc::new(observer);
    }

    /// Number of registrations for `event_type`.
    pub fn subscriber_count(&self, event_type: CallEventType) -> usize {
        self.registry
            .read()
            .get(&event_type)
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// Get bus statistics.
    pub fn stats(&self) -> BusStats {
        self.stats.read().clone()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("id", &self.id)
            .field("stats", &*self.stats.read())
            .finish_non_exhaustive()
    }
}

fn log_fault(fault: &HandlerFault) {
    error!(
        event = %fault.event_type,
        registration = fault.handle.id,
        panicked = fault.panicked,
        reason = %fault.reason,
        "Event handler failed"
    );
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "handler panicked".to_string()
    }
}
