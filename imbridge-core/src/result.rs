//! Result relay back across the bridge.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::error::BridgeError;
use crate::sdk::BaseCallback;
use crate::thread::MainThread;

/// The host's reply handle for one method call.
///
/// Every method consumes the handle: a call gets exactly one reply.
pub trait MethodResult: Send + 'static {
    fn success(self: Box<Self>, value: Value);
    fn error(self: Box<Self>, code: String, message: String, details: Option<Value>);
    fn not_implemented(self: Box<Self>);
}

/// Reply in wire form, for hosts that take results as JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ReplyPayload {
    Success {
        value: Value,
    },
    Error {
        code: String,
        message: String,
        details: Option<Value>,
    },
    NotImplemented,
}

/// Pairs a [`MethodResult`] with the delivery thread.
///
/// Completion is always posted; the host's handle is never invoked on the
/// caller's thread.
pub struct Reply {
    method: String,
    result: Box<dyn MethodResult>,
    main: Arc<dyn MainThread>,
}

impl Reply {
    pub fn new(method: impl Into<String>, result: Box<dyn MethodResult>, main: Arc<dyn MainThread>) -> Self {
        Self {
            method: method.into(),
            result,
            main,
        }
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    /// Deliver a synchronous return value.
    pub fn value(self, value: impl Into<Value>) {
        self.success(value.into());
    }

    pub fn success(self, value: Value) {
        let Self { method, result, main } = self;
        tracing::debug!(%method, "reply success");
        main.post(Box::new(move || result.success(value)));
    }

    pub fn error(self, err: BridgeError) {
        let Self { method, result, main } = self;
        let code = err.code();
        let message = err.message();
        tracing::debug!(%method, %code, %message, "reply error");
        main.post(Box::new(move || result.error(code, message, None)));
    }

    pub fn not_implemented(self) {
        let Self { method, result, main } = self;
        tracing::debug!(%method, "reply not implemented");
        main.post(Box::new(move || result.not_implemented()));
    }
}

/// Completion handler for asynchronous SDK calls.
///
/// Native error codes and messages are forwarded without interpretation.
pub struct BaseListener {
    reply: Reply,
}

impl BaseListener {
    pub fn new(reply: Reply) -> Self {
        Self { reply }
    }
}

impl BaseCallback for BaseListener {
    fn on_error(self: Box<Self>, code: i32, message: String) {
        self.reply.error(BridgeError::Native { code, message });
    }

    fn on_success(self: Box<Self>, data: String) {
        self.reply.success(Value::String(data));
    }
}
