//! Inbound frame parsing.

use crate::error::FrameError;
use crate::event::CallEvent;

/// Largest text frame accepted from a live socket.
pub const MAX_FRAME_BYTES: usize = 64 * 1024;

/// Parse a JSON text frame into a call event.
///
/// Unknown event types, missing timestamps, and timestamps that are not
/// ISO-8601 are all rejected.
pub fn parse_frame(text: &str) -> Result<CallEvent, FrameError> {
    if text.len() > MAX_FRAME_BYTES {
        return Err(FrameError::TooLarge(text.len()));
    }
    Ok(serde_json::from_str(text)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::CallEventType;

    #[test]
    fn test_parse_valid_frame() {
        let event = parse_frame(
            r#"{"type":"call_transferred","data":{"call_id":"call_9","agent_id":"agent_3","timestamp":"2024-05-01T10:00:00.123Z","details":{"to":"queue_2"}}}"#,
        )
        .unwrap();

        assert_eq!(event.event_type, CallEventType::CallTransferred);
        assert_eq!(event.data.call_id.as_deref(), Some("call_9"));
        assert_eq!(event.data.agent_id.as_deref(), Some("agent_3"));
        assert_eq!(event.data.details.unwrap()["to"], "queue_2");
    }

    #[test]
    fn test_parse_minimal_frame() {
        let event =
            parse_frame(r#"{"type":"agent_status_changed","data":{"timestamp":"2024-05-01T10:00:00+02:00"}}"#)
                .unwrap();
        assert_eq!(event.event_type, CallEventType::AgentStatusChanged);
        assert!(event.data.call_id.is_none());
        assert!(event.data.details.is_none());
    }

    #[test]
    fn test_reject_unknown_type() {
        let result = parse_frame(r#"{"type":"heartbeat","data":{"timestamp":"2024-05-01T10:00:00Z"}}"#);
        assert!(matches!(result, Err(FrameError::Malformed(_))));
    }

    #[test]
    fn test_reject_bad_timestamp() {
        assert!(parse_frame(r#"{"type":"call_ended","data":{"timestamp":"yesterday"}}"#).is_err());
        assert!(parse_frame(r#"{"type":"call_ended","data":{}}"#).is_err());
    }

    #[test]
    fn test_reject_garbage() {
        assert!(parse_frame("not json").is_err());
        assert!(parse_frame("").is_err());
    }

    #[test]
    fn test_reject_oversized() {
        let text = "x".repeat(MAX_FRAME_BYTES + 1);
        assert!(matches!(parse_frame(&text), Err(FrameError::TooLarge(_))));
    }
}
