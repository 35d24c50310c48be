//! Call event types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A call-center occurrence delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallEvent {
    /// Event type identifier.
    #[serde(rename = "type")]
    pub event_type: CallEventType,

    /// Event payload data.
    pub data: CallEventData,
}

impl CallEvent {
    /// Create a new call event.
    pub fn new(event_type: CallEventType, data: CallEventData) -> Self {
        Self { event_type, data }
    }
}

/// The closed set of event types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallEventType {
    /// A call was answered or placed.
    CallStarted,
    /// A call finished.
    CallEnded,
    /// A call moved to another agent or queue.
    CallTransferred,
    /// An agent changed availability.
    AgentStatusChanged,
}

impl CallEventType {
    /// Every event type, in declaration order.
    pub const ALL: [CallEventType; 4] = [
        CallEventType::CallStarted,
        CallEventType::CallEnded,
        CallEventType::CallTransferred,
        CallEventType::AgentStatusChanged,
    ];

    /// Wire name of the event type.
    pub fn as_str(&self) -> &'static str {
        match self {
            CallEventType::CallStarted => "call_started",
            CallEventType::CallEnded => "call_ended",
            CallEventType::CallTransferred => "call_transferred",
            CallEventType::AgentStatusChanged => "agent_status_changed",
        }
    }
}

impl std::fmt::Display for CallEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload carried by every call event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallEventData {
    /// Call identifier, if the event concerns a call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_id: Option<String>,

    /// Agent identifier, if the event concerns an agent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,

    /// When the event occurred (ISO-8601 on the wire).
    pub timestamp: DateTime<Utc>,

    /// Open-ended extra fields (duration, status, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Map<String, serde_json::Value>>,
}

impl CallEventData {
    /// Empty payload stamped with the current time.
    pub fn now() -> Self {
        Self {
            call_id: None,
            agent_id: None,
            timestamp: Utc::now(),
            details: None,
        }
    }

    /// Set the call identifier.
    pub fn with_call_id(mut self, call_id: impl Into<String>) -> Self {
        self.call_id = Some(call_id.into());
        self
    }

    /// Set the agent identifier.
    pub fn with_agent_id(mut self, agent_id: impl Into<String>) -> Self {
        self.agent_id = Some(agent_id.into());
        self
    }

    /// Add a single detail entry.
    pub fn with_detail(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.details
            .get_or_insert_with(serde_json::Map::new)
            .insert(key.into(), value);
        self
    }
}
