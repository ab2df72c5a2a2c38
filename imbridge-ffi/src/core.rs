//! BridgeCore — per-bridge state managed by the global handle table.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use imbridge_core::{Dispatcher, MethodCall, MethodResult};

use crate::event::HandleEvents;

/// Per-bridge state. One instance per `imb_create_bridge` call.
///
/// Stored in the global `HANDLES` table (see `bridge::abi`) behind an `Arc`.
pub struct BridgeCore {
    /// Unique handle ID (key in the HANDLES table).
    pub id: u64,
    /// Routes method calls into the native SDK.
    pub dispatcher: Dispatcher,
    /// Event subscription and sequencing.
    pub events: Arc<HandleEvents>,
    /// Name of the spawned delivery thread, or None when the host posts tasks itself.
    pub delivery_thread: Option<String>,
    next_call: AtomicU64,
    calls_dispatched: AtomicU64,
}

impl BridgeCore {
    pub fn new(
        id: u64,
        dispatcher: Dispatcher,
        events: Arc<HandleEvents>,
        delivery_thread: Option<String>,
    ) -> Self {
        Self {
            id,
            dispatcher,
            events,
            delivery_thread,
            next_call: AtomicU64::new(1),
            calls_dispatched: AtomicU64::new(0),
        }
    }

    /// Allocate the ID the host will see on the reply for the next call.
    pub fn next_call_id(&self) -> u64 {
        self.next_call.fetch_add(1, Ordering::Relaxed)
    }

    pub fn invoke(&self, call: MethodCall, result: Box<dyn MethodResult>) {
        self.calls_dispatched.fetch_add(1, Ordering::Relaxed);
        self.dispatcher.handle(call, result);
    }

    pub fn calls_dispatched(&self) -> u64 {
        self.calls_dispatched.load(Ordering::Relaxed)
    }
}
