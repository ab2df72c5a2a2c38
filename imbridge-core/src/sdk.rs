//! The native SDK surface the bridge forwards into.
//!
//! Implementations wrap the precompiled messaging library (see the vtable
//! adapter in `imbridge-ffi`) or stand in for it in tests. The bridge never
//! interprets what these calls do.

use std::sync::Arc;

/// Calls into the native messaging SDK.
pub trait ImSdk: Send + Sync {
    /// Initialise the SDK. `config` is JSON text handed over untouched.
    fn init_sdk(&self, listener: Arc<dyn ConnListener>, operation_id: &str, config: &str) -> bool;

    /// Authenticate. Completion arrives on `callback`, possibly on another thread.
    fn login(&self, callback: Box<dyn BaseCallback>, operation_id: &str, uid: &str, token: &str);

    /// Terminate the current session.
    fn logout(&self, callback: Box<dyn BaseCallback>, operation_id: &str);

    fn get_login_status(&self) -> i32;

    fn get_login_uid(&self) -> String;

    /// Register the listener for incoming messages, read receipts and revocations.
    fn set_advanced_msg_listener(&self, listener: Arc<dyn AdvancedMsgListener>);

    fn force_reconnect(&self);
}

/// One-shot completion for an asynchronous SDK call.
///
/// Both methods consume the callback, so a result is delivered at most once.
pub trait BaseCallback: Send {
    fn on_error(self: Box<Self>, code: i32, message: String);
    fn on_success(self: Box<Self>, data: String);
}

/// Connection status notifications.
pub trait ConnListener: Send + Sync {
    fn on_connecting(&self);
    fn on_connect_success(&self);
    fn on_connect_failed(&self, code: i32, message: String);
    fn on_kicked_offline(&self);
    fn on_user_sig_expired(&self);
    fn on_self_info_updated(&self, info: String);
}

/// Message-level notifications. Every payload is the SDK's serialized JSON.
pub trait AdvancedMsgListener: Send + Sync {
    fn on_recv_c2c_read_receipt(&self, message: String);
    fn on_recv_message_revoked(&self, message: String);
    fn on_recv_new_message(&self, message: String);
}
