//! Host-driven delivery: tasks are handed to the host's UI loop as opaque
//! pointers and run back through `imb_run_task`.

use std::ffi::c_void;
use std::panic::{AssertUnwindSafe, catch_unwind};

use imbridge_core::{MainThread, Task};

/// C signature the host implements to schedule `task` on its UI thread.
///
/// The host must later pass `task` to exactly one of `imb_run_task` or
/// `imb_discard_task`, on the thread it wants delivery to happen on.
pub type PostCallback = unsafe extern "C" fn(task: *mut c_void, user_data: *mut c_void);

pub struct HostMainThread {
    post: PostCallback,
    user_data: *mut c_void,
}

// Safety: the host guarantees `post` may be called from any thread and that
// user_data outlives the bridge.
unsafe impl Send for HostMainThread {}
unsafe impl Sync for HostMainThread {}

impl HostMainThread {
    pub fn new(post: PostCallback, user_data: *mut c_void) -> Self {
        Self { post, user_data }
    }
}

impl MainThread for HostMainThread {
    fn post(&self, task: Task) {
        let raw = Box::into_raw(Box::new(task)).cast::<c_void>();
        unsafe { (self.post)(raw, self.user_data) };
    }
}

/// Run a task previously handed out through a [`PostCallback`].
///
/// Panics inside the task are caught and logged; they never unwind into the host.
///
/// # Safety
///
/// `task` must come from a [`PostCallback`] invocation and not have been run
/// or discarded already.
pub unsafe fn run_task(task: *mut c_void) {
    let task = unsafe { Box::from_raw(task.cast::<Task>()) };
    if catch_unwind(AssertUnwindSafe(move || (*task)())).is_err() {
        tracing::error!("posted task panicked");
    }
}

/// Free a posted task without running it.
///
/// # Safety
///
/// Same contract as [`run_task`].
pub unsafe fn discard_task(task: *mut c_void) {
    drop(unsafe { Box::from_raw(task.cast::<Task>()) });
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Collects posted task pointers so the test can run them on "its" UI thread.
    unsafe extern "C" fn queue_post(task: *mut c_void, user_data: *mut c_void) {
        let queue = unsafe { &*(user_data as *const Mutex<Vec<usize>>) };
        queue.lock().push(task as usize);
    }

    #[test]
    fn test_post_then_run() {
        let queue: Mutex<Vec<usize>> = Mutex::new(Vec::new());
        let main = HostMainThread::new(
            queue_post,
            &queue as *const Mutex<Vec<usize>> as *mut c_void,
        );

        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let counter = Arc::clone(&counter);
            main.post(Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }));
        }
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        let tasks = std::mem::take(&mut *queue.lock());
        assert_eq!(tasks.len(), 3);
        let (first, rest) = tasks.split_first().unwrap();
        for t in rest {
            unsafe { run_task(*t as *mut c_void) };
        }
        unsafe { discard_task(*first as *mut c_void) };
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_panicking_task_is_contained() {
        let queue: Mutex<Vec<usize>> = Mutex::new(Vec::new());
        let main = HostMainThread::new(
            queue_post,
            &queue as *const Mutex<Vec<usize>> as *mut c_void,
        );
        main.post(Box::new(|| panic!("boom")));
        let task = queue.lock().pop().unwrap();
        unsafe { run_task(task as *mut c_void) };
    }
}
