//! # Callboard Real-time
//!
//! Real-time call event distribution for the Callboard call-center dashboard.
//!
//! This crate moves live call-center events from an event source to the parts
//! of the dashboard that care about them, and turns those events into cache
//! invalidations and user notifications.
//!
//! ## Features
//!
//! - **Event Bus**: Type-keyed publish/subscribe with opaque subscription handles
//! - **Connection Manager**: Connect/disconnect lifecycle with exponential backoff
//! - **Transports**: Simulated (periodic synthetic events) and live WebSocket
//! - **Binding**: Event-driven cache invalidation and notifications
//!
//! ## Event Types
//!
//! - `call_started` - A call was answered or placed
//! - `call_ended` - A call finished
//! - `call_transferred` - A call moved to another agent or queue
//! - `agent_status_changed` - An agent changed availability
//!
//! ## Example
//!
//! ```rust
//! use callboard_realtime::{CallEventData, CallEventType, EventBus};
//!
//! let bus = EventBus::new();
//!
//! let handle = bus.subscribe(CallEventType::CallStarted, |event| {
//!     println!("call started: {:?}", event.data.call_id);
//!     Ok(())
//! });
//!
//! bus.emit_event(
//!     CallEventType::CallStarted,
//!     CallEventData::now().with_call_id("call_42"),
//! );
//!
//! bus.unsubscribe(handle);
//! ```
//!
//! ## Wire Format
//!
//! ```json
//! {
//!   "type": "call_started",
//!   "data": {
//!     "call_id": "call_42",
//!     "agent_id": "agent_7",
//!     "timestamp": "2024-05-01T10:00:00Z",
//!     "details": {"duration": 120, "status": "active"}
//!   }
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐  events   ┌───────────────────┐  emit   ┌──────────┐
//! │ Transport  │──────────▶│ ConnectionManager │────────▶│ EventBus │
//! │ (sim / ws) │           │  state + backoff  │         └────┬─────┘
//! └────────────┘           └───────────────────┘              │
//!                                                             ▼
//!                                                  ┌──────────────────┐
//!                                                  │ RealtimeBinding  │
//!                                                  │  cache + notify  │
//!                                                  └──────────────────┘
//! ```

pub mod backoff;
pub mod binding;
pub mod bus;
pub mod cache;
pub mod config;
pub mod connection;
pub mod error;
pub mod event;
pub mod notification;
pub mod transport;

// Re-export main types
pub use backoff::BackoffPolicy;
pub use binding::RealtimeBinding;
pub use bus::{BusStats, ErrorObserver, EventBus, Handler, HandlerFault, SubscriptionHandle};
pub use cache::{InvalidationLog, QueryCache, QueryKey};
pub use config::{RealtimeConfig, ReconnectConfig};
pub use connection::{ConnectionManager, ConnectionState};
pub use error::{FrameError, HandlerError, RealtimeError, TransportError};
pub use event::{CallEvent, CallEventData, CallEventType};
pub use notification::{
    Notification, NotificationLevel, NotificationLog, NotificationMetadata, NotificationSink,
};
pub use transport::{
    SimulatedTransport, Transport, TransportConfig, TransportSession, WebSocketTransport,
};
