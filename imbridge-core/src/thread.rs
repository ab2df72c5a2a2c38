//! Delivery-thread marshalling.
//!
//! The UI framework only accepts results and events on the thread it owns.
//! Everything outbound goes through [`MainThread::post`]; nothing is handed
//! to the host directly from a native callback thread.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::thread::ThreadId;

use tokio::sync::mpsc;

use crate::error::Result;

/// A unit of work to run on the delivery thread.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Schedules work onto the thread the host requires for delivery.
pub trait MainThread: Send + Sync {
    fn post(&self, task: Task);
}

/// A dedicated thread that runs posted tasks in order.
///
/// Used when the host does not provide its own looper. The thread exits once
/// every `DeliveryThread` handle has been dropped and the queue is drained.
pub struct DeliveryThread {
    tx: mpsc::UnboundedSender<Task>,
    thread_id: ThreadId,
    name: String,
}

impl DeliveryThread {
    pub fn spawn(name: &str) -> Result<Self> {
        let (tx, mut rx) = mpsc::unbounded_channel::<Task>();
        let thread_name = name.to_string();
        let handle = std::thread::Builder::new()
            .name(thread_name.clone())
            .spawn(move || {
                while let Some(task) = rx.blocking_recv() {
                    if catch_unwind(AssertUnwindSafe(task)).is_err() {
                        tracing::error!(thread = %thread_name, "delivery task panicked");
                    }
                }
                tracing::debug!(thread = %thread_name, "delivery thread exiting");
            })?;
        let thread_id = handle.thread().id();
        tracing::debug!(thread = name, "delivery thread started");
        Ok(Self {
            tx,
            thread_id,
            name: name.to_string(),
        })
    }

    pub fn thread_id(&self) -> ThreadId {
        self.thread_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the caller is running on this delivery thread.
    pub fn is_current(&self) -> bool {
        std::thread::current().id() == self.thread_id
    }
}

impl MainThread for DeliveryThread {
    fn post(&self, task: Task) {
        if self.tx.send(task).is_err() {
            tracing::warn!(thread = %self.name, "delivery thread stopped, dropping task");
        }
    }
}
