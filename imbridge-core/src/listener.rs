//! Listener implementations handed to the native SDK.
//!
//! Each callback builds a fresh payload map and emits exactly one event.

use std::collections::BTreeMap;

use crate::event::{ADVANCED_MSG_LISTENER, CONNECT_LISTENER, EventEmitter};
use crate::sdk::{AdvancedMsgListener, ConnListener};

/// Forwards connection status callbacks on the `connectListener` channel.
pub struct ConnListenerImpl {
    emitter: EventEmitter,
}

impl ConnListenerImpl {
    pub fn new(emitter: EventEmitter) -> Self {
        Self { emitter }
    }

    fn emit(&self, kind: &str, data: BTreeMap<String, String>) {
        self.emitter.emit(CONNECT_LISTENER, kind, data);
    }
}

impl ConnListener for ConnListenerImpl {
    fn on_connecting(&self) {
        self.emit("onConnecting", BTreeMap::new());
    }

    fn on_connect_success(&self) {
        self.emit("onConnectSuccess", BTreeMap::new());
    }

    fn on_connect_failed(&self, code: i32, message: String) {
        let data = BTreeMap::from([
            ("errCode".to_string(), code.to_string()),
            ("errMsg".to_string(), message),
        ]);
        self.emit("onConnectFailed", data);
    }

    fn on_kicked_offline(&self) {
        self.emit("onKickedOffline", BTreeMap::new());
    }

    fn on_user_sig_expired(&self) {
        self.emit("onUserSigExpired", BTreeMap::new());
    }

    fn on_self_info_updated(&self, info: String) {
        self.emit("onSelfInfoUpdated", BTreeMap::from([("data".to_string(), info)]));
    }
}

/// Forwards message callbacks on the `advancedMsgListener` channel,
/// tagged with the id the UI side registered it under.
pub struct AdvancedMsgListenerImpl {
    id: String,
    emitter: EventEmitter,
}

impl AdvancedMsgListenerImpl {
    pub fn new(id: impl Into<String>, emitter: EventEmitter) -> Self {
        Self {
            id: id.into(),
            emitter,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    fn emit(&self, kind: &str, message: String) {
        let data = BTreeMap::from([
            ("id".to_string(), self.id.clone()),
            ("message".to_string(), message),
        ]);
        self.emitter.emit(ADVANCED_MSG_LISTENER, kind, data);
    }
}

impl AdvancedMsgListener for AdvancedMsgListenerImpl {
    fn on_recv_c2c_read_receipt(&self, message: String) {
        self.emit("onRecvC2CReadReceipt", message);
    }

    fn on_recv_message_revoked(&self, message: String) {
        self.emit("onRecvMessageRevoked", message);
    }

    fn on_recv_new_message(&self, message: String) {
        self.emit("onRecvNewMessage", message);
    }
}
