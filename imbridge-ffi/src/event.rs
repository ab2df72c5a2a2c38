//! BridgeEvent → EventEnvelope JSON for the host's event callback.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use imbridge_core::{BridgeEvent, EventSink};

use crate::bridge::callback::CallbackSink;
use crate::bridge::envelope::EventEnvelope;

/// Event sink for one bridge handle.
///
/// The host may subscribe after creation; events emitted before a callback is
/// registered are dropped.
#[derive(Default)]
pub struct HandleEvents {
    callback: Mutex<Option<Arc<CallbackSink>>>,
    seq: AtomicU64,
}

impl HandleEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace the callback.
    pub fn subscribe(&self, sink: CallbackSink) {
        *self.callback.lock() = Some(Arc::new(sink));
    }

    pub fn unsubscribe(&self) {
        *self.callback.lock() = None;
    }

    /// Sequence number of the last dispatched envelope (0 if none).
    pub fn last_seq(&self) -> u64 {
        self.seq.load(Ordering::Acquire)
    }
}

/// Serialize an event into its envelope JSON.
pub fn envelope_json(seq: u64, event: BridgeEvent) -> Option<String> {
    match serde_json::to_string(&EventEnvelope::new(seq, event)) {
        Ok(json) => Some(json),
        Err(e) => {
            tracing::error!("failed to serialize event envelope: {e}");
            None
        }
    }
}

impl EventSink for HandleEvents {
    fn emit(&self, event: BridgeEvent) {
        // The host may subscribe, unsubscribe or destroy from inside its callback.
        let sink = self.callback.lock().clone();
        let Some(cb) = sink else {
            tracing::debug!(listener = %event.listener, kind = %event.kind, "no subscriber, dropping event");
            return;
        };
        let seq = self.seq.fetch_add(1, Ordering::AcqRel) + 1;
        if let Some(json) = envelope_json(seq, event) {
            cb.dispatch(&json);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::ffi::{CStr, c_char, c_void};

    unsafe extern "C" fn collect(ptr: *const c_char, _len: usize, user_data: *mut c_void) {
        let out = unsafe { &*(user_data as *const Mutex<Vec<String>>) };
        let json = unsafe { CStr::from_ptr(ptr) }.to_str().unwrap().to_string();
        out.lock().push(json);
    }

    fn event(kind: &str) -> BridgeEvent {
        BridgeEvent::new("connectListener", kind, BTreeMap::new())
    }

    #[test]
    fn test_events_before_subscribe_are_dropped() {
        let events = HandleEvents::new();
        events.emit(event("onConnecting"));
        assert_eq!(events.last_seq(), 0);
    }

    #[test]
    fn test_sequence_numbers() {
        let out: Mutex<Vec<String>> = Mutex::new(Vec::new());
        let events = HandleEvents::new();
        events.subscribe(CallbackSink::new(
            collect,
            &out as *const Mutex<Vec<String>> as *mut c_void,
        ));

        events.emit(event("onConnecting"));
        events.emit(event("onConnectSuccess"));

        let out = out.lock();
        assert_eq!(out.len(), 2);
        let first: serde_json::Value = serde_json::from_str(&out[0]).unwrap();
        let second: serde_json::Value = serde_json::from_str(&out[1]).unwrap();
        assert_eq!(first["seq"], 1);
        assert_eq!(first["event"]["type"], "onConnecting");
        assert_eq!(second["seq"], 2);
        assert_eq!(second["event"]["type"], "onConnectSuccess");
        assert_eq!(events.last_seq(), 2);
    }

    #[test]
    fn test_unsubscribe() {
        let out: Mutex<Vec<String>> = Mutex::new(Vec::new());
        let events = HandleEvents::new();
        events.subscribe(CallbackSink::new(
            collect,
            &out as *const Mutex<Vec<String>> as *mut c_void,
        ));
        events.unsubscribe();
        events.emit(event("onKickedOffline"));
        assert!(out.lock().is_empty());
    }

    unsafe extern "C" fn unsubscribe_on_event(_ptr: *const c_char, _len: usize, user_data: *mut c_void) {
        let events = unsafe { &*(user_data as *const HandleEvents) };
        events.unsubscribe();
    }

    #[test]
    fn test_unsubscribe_from_inside_callback() {
        let events = HandleEvents::new();
        events.subscribe(CallbackSink::new(
            unsubscribe_on_event,
            &events as *const HandleEvents as *mut c_void,
        ));
        events.emit(event("onKickedOffline"));
        events.emit(event("onUserSigExpired"));
        assert_eq!(events.last_seq(), 1);
    }
}
