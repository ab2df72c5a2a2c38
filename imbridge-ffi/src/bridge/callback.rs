//! Safe wrappers around host C function pointers for events and replies.

use std::ffi::{CString, c_char, c_void};

use serde_json::Value;

use imbridge_core::MethodResult;
use imbridge_core::result::ReplyPayload;

/// C callback signature: receives a UTF-8 JSON string (pointer + length) and opaque user data.
pub type EventCallback =
    unsafe extern "C" fn(json_ptr: *const c_char, json_len: usize, user_data: *mut c_void);

/// C reply signature: the call ID returned by `imb_invoke`, the JSON reply, and user data.
pub type ReplyCallback = unsafe extern "C" fn(
    call_id: u64,
    json_ptr: *const c_char,
    json_len: usize,
    user_data: *mut c_void,
);

/// Hand a JSON string to a C callback as a NUL-terminated buffer.
///
/// Returns false if the string contains an interior NUL, in which case the
/// callback is not invoked.
fn with_c_json(json: &str, f: impl FnOnce(*const c_char, usize)) -> bool {
    let Ok(cstr) = CString::new(json) else {
        tracing::warn!("JSON contained interior NUL byte, dropping");
        return false;
    };
    f(cstr.as_ptr(), json.len());
    true
}

/// Wraps a C event callback with its user_data pointer.
///
/// The host is responsible for ensuring the callback and user_data remain valid
/// for the lifetime of the subscription.
pub struct CallbackSink {
    cb: EventCallback,
    user_data: *mut c_void,
}

// Safety: the host guarantees thread-safe access to user_data.
// The callback is only invoked from the delivery thread.
unsafe impl Send for CallbackSink {}
unsafe impl Sync for CallbackSink {}

impl CallbackSink {
    pub fn new(cb: EventCallback, user_data: *mut c_void) -> Self {
        Self { cb, user_data }
    }

    /// Dispatch a JSON string to the C callback.
    pub fn dispatch(&self, json: &str) {
        with_c_json(json, |ptr, len| unsafe { (self.cb)(ptr, len, self.user_data) });
    }
}

/// One pending reply: the host's C callback plus the call it answers.
///
/// Implements [`MethodResult`], so the core dispatcher consumes it exactly once.
pub struct CReply {
    call_id: u64,
    cb: ReplyCallback,
    user_data: *mut c_void,
}

// Safety: as for `CallbackSink`; the reply is moved to and invoked on the
// delivery thread.
unsafe impl Send for CReply {}

impl CReply {
    pub fn new(call_id: u64, cb: ReplyCallback, user_data: *mut c_void) -> Self {
        Self {
            call_id,
            cb,
            user_data,
        }
    }

    fn deliver(self, payload: ReplyPayload) {
        let json = match serde_json::to_string(&payload) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!(call_id = self.call_id, "failed to serialize reply: {e}");
                return;
            }
        };
        let delivered = with_c_json(&json, |ptr, len| unsafe {
            (self.cb)(self.call_id, ptr, len, self.user_data)
        });
        if !delivered {
            tracing::error!(call_id = self.call_id, "reply dropped");
        }
    }
}

impl MethodResult for CReply {
    fn success(self: Box<Self>, value: Value) {
        self.deliver(ReplyPayload::Success { value });
    }

    fn error(self: Box<Self>, code: String, message: String, details: Option<Value>) {
        self.deliver(ReplyPayload::Error {
            code,
            message,
            details,
        });
    }

    fn not_implemented(self: Box<Self>) {
        self.deliver(ReplyPayload::NotImplemented);
    }
}
