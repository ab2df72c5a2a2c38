//! EventEnvelope — versioned wrapper around BridgeEvent for the host callback.

use serde::Serialize;

use imbridge_core::BridgeEvent;

/// Versioned envelope wrapping every event dispatched to the host.
///
/// Fields:
/// - `version`: Schema version (always 1 for now).
/// - `seq`: Monotonically increasing sequence number per bridge handle.
/// - `timestamp_ms`: UTC milliseconds when the envelope was created.
/// - `event`: The listener event.
#[derive(Debug, Clone, Serialize)]
pub struct EventEnvelope {
    pub version: u32,
    pub seq: u64,
    pub timestamp_ms: i64,
    pub event: BridgeEvent,
}

impl EventEnvelope {
    pub fn new(seq: u64, event: BridgeEvent) -> Self {
        Self {
            version: 1,
            seq,
            timestamp_ms: chrono::Utc::now().timestamp_millis(),
            event,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_envelope_serialization() {
        let event = BridgeEvent::new("connectListener", "onConnectSuccess", BTreeMap::new());
        let envelope = EventEnvelope::new(42, event);
        let json = serde_json::to_string(&envelope).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed["version"], 1);
        assert_eq!(parsed["seq"], 42);
        assert!(parsed["timestamp_ms"].as_i64().unwrap() > 0);
        assert_eq!(parsed["event"]["listener"], "connectListener");
        assert_eq!(parsed["event"]["type"], "onConnectSuccess");
        assert!(parsed["event"]["data"].as_object().unwrap().is_empty());
    }

    #[test]
    fn test_envelope_with_message_event() {
        let data = BTreeMap::from([
            ("id".to_string(), "L1".to_string()),
            ("message".to_string(), r#"{"clientMsgID":"c1"}"#.to_string()),
        ]);
        let event = BridgeEvent::new("advancedMsgListener", "onRecvNewMessage", data);
        let envelope = EventEnvelope::new(1, event);
        let json = serde_json::to_string(&envelope).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed["event"]["type"], "onRecvNewMessage");
        assert_eq!(parsed["event"]["data"]["id"], "L1");
        assert_eq!(parsed["event"]["data"]["message"], r#"{"clientMsgID":"c1"}"#);
        assert_eq!(parsed["seq"], 1);
    }
}
