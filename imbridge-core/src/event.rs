//! Named events emitted from native listener callbacks.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use crate::thread::MainThread;

/// Channel for connection status callbacks.
pub const CONNECT_LISTENER: &str = "connectListener";
/// Channel for message-level callbacks.
pub const ADVANCED_MSG_LISTENER: &str = "advancedMsgListener";

/// One listener callback, flattened for the UI channel.
///
/// `listener` names the channel, `kind` the callback; `data` is always a
/// flat string map regardless of what the callback carried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BridgeEvent {
    pub listener: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub data: BTreeMap<String, String>,
}

impl BridgeEvent {
    pub fn new(listener: &str, kind: &str, data: BTreeMap<String, String>) -> Self {
        Self {
            listener: listener.to_string(),
            kind: kind.to_string(),
            data,
        }
    }
}

/// The host's event channel. Fire-and-forget.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: BridgeEvent);
}

/// Posts events onto the delivery thread before handing them to the sink.
#[derive(Clone)]
pub struct EventEmitter {
    sink: Arc<dyn EventSink>,
    main: Arc<dyn MainThread>,
}

impl EventEmitter {
    pub fn new(sink: Arc<dyn EventSink>, main: Arc<dyn MainThread>) -> Self {
        Self { sink, main }
    }

    pub fn emit(&self, listener: &str, kind: &str, data: BTreeMap<String, String>) {
        let event = BridgeEvent::new(listener, kind, data);
        tracing::debug!(listener, kind, "emit event");
        let sink = Arc::clone(&self.sink);
        self.main.post(Box::new(move || sink.emit(event)));
    }
}
