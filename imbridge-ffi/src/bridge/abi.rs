//! C ABI exports — the public surface consumed by native hosts.
//!
//! All functions are `extern "C"` and `#[no_mangle]`.
//! Handles are opaque `u64` IDs into a global `DashMap`.

use std::ffi::{CStr, CString, c_char, c_void};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use once_cell::sync::Lazy;

use imbridge_core::config::{BridgeConfig, LogConfig};
use imbridge_core::{DeliveryThread, Dispatcher, MainThread, MethodCall};

use crate::bridge::callback::{CReply, CallbackSink, EventCallback, ReplyCallback};
use crate::bridge::main_thread::{self, HostMainThread, PostCallback};
use crate::bridge::native::{ImSdkVTable, VTableSdk};
use crate::core::BridgeCore;
use crate::error::FfiResult;
use crate::event::HandleEvents;

/// Global handle table. Maps handle IDs → Arc<BridgeCore>.
static HANDLES: Lazy<DashMap<u64, Arc<BridgeCore>>> = Lazy::new(DashMap::new);

/// Monotonic handle counter.
static NEXT_HANDLE: AtomicU64 = AtomicU64::new(1);

/// Helper: read a C string pointer into a Rust String, returning None on null or invalid UTF-8.
unsafe fn read_c_str(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(ptr) }.to_str().ok().map(String::from)
}

fn get(handle: u64) -> Option<Arc<BridgeCore>> {
    HANDLES.get(&handle).map(|core| Arc::clone(&core))
}

// ─── Logging ─────────────────────────────────────────────────────────

/// Install a tracing subscriber writing to stderr.
///
/// `filter` holds `EnvFilter` directives, or null to use `RUST_LOG`.
/// Returns `Internal` if a subscriber is already installed or the filter is invalid.
///
/// # Safety
///
/// `filter` must be a valid, NUL-terminated UTF-8 C string, or null.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn imb_init_logging(filter: *const c_char, json: bool) -> i32 {
    let config = LogConfig {
        filter: unsafe { read_c_str(filter) },
        json,
    };
    match imbridge_core::logging::init(&config) {
        Ok(()) => FfiResult::Ok as i32,
        Err(e) => {
            eprintln!("imb_init_logging: {e}");
            FfiResult::Internal as i32
        }
    }
}

// ─── Create / Destroy ────────────────────────────────────────────────

/// Create a bridge over a native SDK.
///
/// # Safety
///
/// - `config_json` must be a valid, NUL-terminated UTF-8 C string, or null
///   for defaults.
/// - `sdk` must point to a fully initialised vtable whose entries and
///   `sdk_ctx` outlive the bridge. The vtable struct itself is copied.
/// - If `post` is non-null, `post_user_data` must stay valid for the lifetime
///   of the bridge and every posted task must be run or discarded.
///
/// Config JSON schema (all fields optional):
/// ```json
/// {
///   "delivery_thread": "imbridge-main",
///   "log": { "filter": "imbridge_core=debug", "json": false }
/// }
/// ```
///
/// When `post` is null, results and events are delivered on a dedicated
/// thread named by `delivery_thread`. Otherwise every delivery is handed to
/// `post` for the host to run on its UI thread via `imb_run_task`.
///
/// Returns a non-zero handle on success, or 0 on failure.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn imb_create_bridge(
    config_json: *const c_char,
    sdk: *const ImSdkVTable,
    post: Option<PostCallback>,
    post_user_data: *mut c_void,
) -> u64 {
    let config = if config_json.is_null() {
        BridgeConfig::default()
    } else {
        let Some(json_str) = (unsafe { read_c_str(config_json) }) else {
            tracing::error!("imb_create_bridge: config_json is not valid UTF-8");
            return 0;
        };
        match BridgeConfig::from_json(&json_str) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!("imb_create_bridge: {e}");
                return 0;
            }
        }
    };

    if config.log.filter.is_some() || config.log.json {
        // Another bridge or the host may already own the global subscriber.
        if let Err(e) = imbridge_core::logging::init(&config.log) {
            tracing::debug!("imb_create_bridge: logging not installed: {e}");
        }
    }

    let Some(sdk) = (unsafe { VTableSdk::from_raw(sdk) }) else {
        tracing::error!("imb_create_bridge: null sdk vtable");
        return 0;
    };

    let (main, delivery_thread): (Arc<dyn MainThread>, Option<String>) = match post {
        Some(post) => {
            let host: Arc<dyn MainThread> = Arc::new(HostMainThread::new(post, post_user_data));
            (host, None)
        }
        None => match DeliveryThread::spawn(&config.delivery_thread) {
            Ok(t) => {
                let thread: Arc<dyn MainThread> = Arc::new(t);
                (thread, Some(config.delivery_thread.clone()))
            }
            Err(e) => {
                tracing::error!("imb_create_bridge: failed to spawn delivery thread: {e}");
                return 0;
            }
        },
    };

    let events = Arc::new(HandleEvents::new());
    let dispatcher = Dispatcher::new(Arc::new(sdk), main, events.clone());

    let id = NEXT_HANDLE.fetch_add(1, Ordering::Relaxed);
    let core = Arc::new(BridgeCore::new(id, dispatcher, events, delivery_thread));

    HANDLES.insert(id, core);
    tracing::debug!("imb_create_bridge: created handle {id}");
    id
}

/// Destroy a bridge and release its event subscription.
///
/// Safe to call multiple times — second call is a no-op. Listeners already
/// handed to the native SDK stay alive until the SDK releases them; their
/// events are dropped from here on.
///
/// # Safety
///
/// `handle` must be a value previously returned by `imb_create_bridge`,
/// or the call is a no-op.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn imb_destroy_bridge(handle: u64) {
    if let Some((_, core)) = HANDLES.remove(&handle) {
        tracing::debug!("imb_destroy_bridge: destroying handle {handle}");
        core.events.unsubscribe();
    }
}

// ─── Subscribe ───────────────────────────────────────────────────────

/// Register the event callback for a bridge.
///
/// The callback is invoked on the delivery thread with JSON event envelopes.
/// Only one callback can be registered per bridge; subsequent calls replace the previous one.
///
/// # Safety
///
/// `cb` must be a valid function pointer. `user_data` must remain valid for the
/// lifetime of the subscription (until destroy, unsubscribe, or a replacement subscribe call).
#[unsafe(no_mangle)]
pub unsafe extern "C" fn imb_subscribe_events(
    handle: u64,
    cb: EventCallback,
    user_data: *mut c_void,
) -> i32 {
    let Some(core) = get(handle) else {
        return FfiResult::InvalidHandle as i32;
    };
    core.events.subscribe(CallbackSink::new(cb, user_data));
    tracing::debug!("imb_subscribe_events: callback registered for handle {handle}");
    FfiResult::Ok as i32
}

/// Remove the event callback for a bridge.
///
/// # Safety
///
/// `handle` must be a valid handle from `imb_create_bridge`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn imb_unsubscribe_events(handle: u64) -> i32 {
    let Some(core) = get(handle) else {
        return FfiResult::InvalidHandle as i32;
    };
    core.events.unsubscribe();
    FfiResult::Ok as i32
}

// ─── Method calls ────────────────────────────────────────────────────

/// Invoke a bridge method.
///
/// `args_json` is a JSON object of arguments (null or empty for none). On
/// `Ok`, exactly one reply is later delivered to `reply_cb` on the delivery
/// thread, tagged with the call ID written to `out_call_id` (if non-null).
/// Reply JSON:
/// ```json
/// { "status": "success", "value": ... }
/// { "status": "error", "code": "10002", "message": "...", "details": null }
/// { "status": "notImplemented" }
/// ```
/// Any other return code means no reply will be delivered and the native SDK
/// was not called.
///
/// # Safety
///
/// - `method` must be a valid, NUL-terminated UTF-8 C string, or null.
/// - `args_json` must be a valid, NUL-terminated UTF-8 C string, or null.
/// - `reply_cb` and `user_data` must remain valid until the reply is delivered.
/// - `out_call_id` must be null or valid for a `u64` write.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn imb_invoke(
    handle: u64,
    method: *const c_char,
    args_json: *const c_char,
    reply_cb: ReplyCallback,
    user_data: *mut c_void,
    out_call_id: *mut u64,
) -> i32 {
    let Some(core) = get(handle) else {
        return FfiResult::InvalidHandle as i32;
    };
    let Some(method) = (unsafe { read_c_str(method) }) else {
        return FfiResult::InvalidArgument as i32;
    };
    let args = if args_json.is_null() {
        String::new()
    } else {
        match unsafe { read_c_str(args_json) } {
            Some(s) => s,
            None => return FfiResult::InvalidArgument as i32,
        }
    };
    let call = match MethodCall::from_json(method, &args) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!("imb_invoke: {e}");
            return FfiResult::InvalidArgument as i32;
        }
    };

    let call_id = core.next_call_id();
    if !out_call_id.is_null() {
        unsafe { *out_call_id = call_id };
    }
    core.invoke(call, Box::new(CReply::new(call_id, reply_cb, user_data)));
    FfiResult::Ok as i32
}

// ─── Host-driven delivery ────────────────────────────────────────────

/// Run a task previously handed to the host's `post` callback.
///
/// Must be called on the thread the host wants results and events delivered on.
///
/// # Safety
///
/// `task` must come from the bridge's `post` callback and not have been run
/// or discarded already. Null is a no-op.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn imb_run_task(task: *mut c_void) {
    if !task.is_null() {
        unsafe { main_thread::run_task(task) };
    }
}

/// Free a posted task without running it (e.g. during host shutdown).
///
/// # Safety
///
/// Same contract as `imb_run_task`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn imb_discard_task(task: *mut c_void) {
    if !task.is_null() {
        unsafe { main_thread::discard_task(task) };
    }
}

// ─── Snapshot ────────────────────────────────────────────────────────

/// Get a JSON snapshot of the bridge state.
///
/// Returns a heap-allocated C string that must be freed with `imb_free_string`.
/// Returns null on invalid handle or allocation failure.
///
/// # Safety
///
/// `handle` must be a valid handle from `imb_create_bridge`.
///
/// Returns JSON:
/// ```json
/// {
///   "id": 1,
///   "delivery_thread": "imbridge-main",
///   "calls_dispatched": 3,
///   "events_emitted": 5
/// }
/// ```
#[unsafe(no_mangle)]
pub unsafe extern "C" fn imb_get_snapshot_json(handle: u64) -> *mut c_char {
    let Some(core) = get(handle) else {
        return std::ptr::null_mut();
    };

    let snapshot = serde_json::json!({
        "id": core.id,
        "delivery_thread": core.delivery_thread,
        "calls_dispatched": core.calls_dispatched(),
        "events_emitted": core.events.last_seq(),
    });

    match CString::new(snapshot.to_string()) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => std::ptr::null_mut(),
    }
}

/// Free a string previously returned by `imb_get_snapshot_json`.
///
/// # Safety
///
/// `ptr` must be null or a pointer previously returned by `imb_get_snapshot_json`.
/// Must not be called more than once for the same pointer.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn imb_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(unsafe { CString::from_raw(ptr) });
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
