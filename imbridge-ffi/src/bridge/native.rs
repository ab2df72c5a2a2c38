//! Native SDK adapter: drives the precompiled messaging library through a
//! host-supplied table of C function pointers.
//!
//! Rust listener and callback objects cross the boundary as `ctx` pointers
//! paired with `extern "C"` trampolines. Ownership rules:
//! - [`CBaseCallback`]: the SDK must call exactly one of `on_error` /
//!   `on_success`, exactly once. That call frees `ctx`.
//! - [`CConnListener`] / [`CAdvancedMsgListener`]: valid until the SDK calls
//!   `release(ctx)`, after which no other entry may be called.

use std::ffi::{CStr, CString, c_char, c_void};
use std::sync::Arc;

use imbridge_core::{AdvancedMsgListener, BaseCallback, ConnListener, ImSdk};

/// Error code reported through a [`BaseCallback`] when an argument cannot be
/// passed to C (interior NUL byte). The native SDK is not called.
pub const ARGUMENT_NOT_C_STRING: i32 = -1;

/// One-shot completion handed to an asynchronous SDK call.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct CBaseCallback {
    pub ctx: *mut c_void,
    pub on_error: unsafe extern "C" fn(ctx: *mut c_void, code: i32, message: *const c_char),
    pub on_success: unsafe extern "C" fn(ctx: *mut c_void, data: *const c_char),
}

/// Connection listener handed to `init_sdk`.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct CConnListener {
    pub ctx: *mut c_void,
    pub on_connecting: unsafe extern "C" fn(ctx: *mut c_void),
    pub on_connect_success: unsafe extern "C" fn(ctx: *mut c_void),
    pub on_connect_failed: unsafe extern "C" fn(ctx: *mut c_void, code: i32, message: *const c_char),
    pub on_kicked_offline: unsafe extern "C" fn(ctx: *mut c_void),
    pub on_user_sig_expired: unsafe extern "C" fn(ctx: *mut c_void),
    pub on_self_info_updated: unsafe extern "C" fn(ctx: *mut c_void, info: *const c_char),
    pub release: unsafe extern "C" fn(ctx: *mut c_void),
}

/// Message listener handed to `set_advanced_msg_listener`.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct CAdvancedMsgListener {
    pub ctx: *mut c_void,
    pub on_recv_c2c_read_receipt: unsafe extern "C" fn(ctx: *mut c_void, message: *const c_char),
    pub on_recv_message_revoked: unsafe extern "C" fn(ctx: *mut c_void, message: *const c_char),
    pub on_recv_new_message: unsafe extern "C" fn(ctx: *mut c_void, message: *const c_char),
    pub release: unsafe extern "C" fn(ctx: *mut c_void),
}

/// Entry points of the native SDK, supplied by the host at bridge creation.
///
/// `sdk_ctx` is passed back as the first argument of every entry. String
/// arguments are NUL-terminated UTF-8 and only valid for the duration of the
/// call.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct ImSdkVTable {
    pub sdk_ctx: *mut c_void,
    pub init_sdk: unsafe extern "C" fn(
        sdk_ctx: *mut c_void,
        listener: CConnListener,
        operation_id: *const c_char,
        config: *const c_char,
    ) -> bool,
    pub login: unsafe extern "C" fn(
        sdk_ctx: *mut c_void,
        callback: CBaseCallback,
        operation_id: *const c_char,
        uid: *const c_char,
        token: *const c_char,
    ),
    pub logout:
        unsafe extern "C" fn(sdk_ctx: *mut c_void, callback: CBaseCallback, operation_id: *const c_char),
    pub get_login_status: unsafe extern "C" fn(sdk_ctx: *mut c_void) -> i32,
    /// Returns a string owned by the SDK, released through `free_string`.
    pub get_login_uid: unsafe extern "C" fn(sdk_ctx: *mut c_void) -> *mut c_char,
    pub free_string: unsafe extern "C" fn(sdk_ctx: *mut c_void, s: *mut c_char),
    pub set_advanced_msg_listener:
        unsafe extern "C" fn(sdk_ctx: *mut c_void, listener: CAdvancedMsgListener),
    pub force_reconnect: unsafe extern "C" fn(sdk_ctx: *mut c_void),
}

/// [`ImSdk`] implemented over an [`ImSdkVTable`].
pub struct VTableSdk {
    vtable: ImSdkVTable,
}

// Safety: the host guarantees the SDK entry points are callable from any thread.
unsafe impl Send for VTableSdk {}
unsafe impl Sync for VTableSdk {}

impl VTableSdk {
    /// Copy the vtable out of host memory.
    ///
    /// # Safety
    ///
    /// `vtable` must be null or point to a fully initialised [`ImSdkVTable`]
    /// whose entries and `sdk_ctx` stay valid for the lifetime of the bridge.
    pub unsafe fn from_raw(vtable: *const ImSdkVTable) -> Option<Self> {
        if vtable.is_null() {
            return None;
        }
        Some(Self {
            vtable: unsafe { *vtable },
        })
    }
}

/// Read a borrowed C string; null reads as empty, invalid UTF-8 is replaced.
unsafe fn lossy(ptr: *const c_char) -> String {
    if ptr.is_null() {
        return String::new();
    }
    unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
}

fn c_args<const N: usize>(args: [&str; N]) -> Option<[CString; N]> {
    let mut out = Vec::with_capacity(N);
    for a in args {
        out.push(CString::new(a).ok()?);
    }
    out.try_into().ok()
}

// ─── BaseCallback trampolines ────────────────────────────────────────

fn base_callback(callback: Box<dyn BaseCallback>) -> CBaseCallback {
    CBaseCallback {
        ctx: Box::into_raw(Box::new(callback)).cast(),
        on_error: base_on_error,
        on_success: base_on_success,
    }
}

unsafe extern "C" fn base_on_error(ctx: *mut c_void, code: i32, message: *const c_char) {
    let callback = unsafe { Box::from_raw(ctx.cast::<Box<dyn BaseCallback>>()) };
    let message = unsafe { lossy(message) };
    callback.on_error(code, message);
}

unsafe extern "C" fn base_on_success(ctx: *mut c_void, data: *const c_char) {
    let callback = unsafe { Box::from_raw(ctx.cast::<Box<dyn BaseCallback>>()) };
    let data = unsafe { lossy(data) };
    callback.on_success(data);
}

// ─── ConnListener trampolines ────────────────────────────────────────

fn conn_listener(listener: Arc<dyn ConnListener>) -> CConnListener {
    CConnListener {
        ctx: Box::into_raw(Box::new(listener)).cast(),
        on_connecting: conn_on_connecting,
        on_connect_success: conn_on_connect_success,
        on_connect_failed: conn_on_connect_failed,
        on_kicked_offline: conn_on_kicked_offline,
        on_user_sig_expired: conn_on_user_sig_expired,
        on_self_info_updated: conn_on_self_info_updated,
        release: conn_release,
    }
}

unsafe fn conn<'a>(ctx: *mut c_void) -> &'a Arc<dyn ConnListener> {
    unsafe { &*ctx.cast::<Arc<dyn ConnListener>>() }
}

unsafe extern "C" fn conn_on_connecting(ctx: *mut c_void) {
    unsafe { conn(ctx) }.on_connecting();
}

unsafe extern "C" fn conn_on_connect_success(ctx: *mut c_void) {
    unsafe { conn(ctx) }.on_connect_success();
}

unsafe extern "C" fn conn_on_connect_failed(ctx: *mut c_void, code: i32, message: *const c_char) {
    let message = unsafe { lossy(message) };
    unsafe { conn(ctx) }.on_connect_failed(code, message);
}

unsafe extern "C" fn conn_on_kicked_offline(ctx: *mut c_void) {
    unsafe { conn(ctx) }.on_kicked_offline();
}

unsafe extern "C" fn conn_on_user_sig_expired(ctx: *mut c_void) {
    unsafe { conn(ctx) }.on_user_sig_expired();
}

unsafe extern "C" fn conn_on_self_info_updated(ctx: *mut c_void, info: *const c_char) {
    let info = unsafe { lossy(info) };
    unsafe { conn(ctx) }.on_self_info_updated(info);
}

unsafe extern "C" fn conn_release(ctx: *mut c_void) {
    drop(unsafe { Box::from_raw(ctx.cast::<Arc<dyn ConnListener>>()) });
}

// ─── AdvancedMsgListener trampolines ─────────────────────────────────

fn advanced_msg_listener(listener: Arc<dyn AdvancedMsgListener>) -> CAdvancedMsgListener {
    CAdvancedMsgListener {
        ctx: Box::into_raw(Box::new(listener)).cast(),
        on_recv_c2c_read_receipt: adv_on_recv_c2c_read_receipt,
        on_recv_message_revoked: adv_on_recv_message_revoked,
        on_recv_new_message: adv_on_recv_new_message,
        release: adv_release,
    }
}

unsafe fn adv<'a>(ctx: *mut c_void) -> &'a Arc<dyn AdvancedMsgListener> {
    unsafe { &*ctx.cast::<Arc<dyn AdvancedMsgListener>>() }
}

unsafe extern "C" fn adv_on_recv_c2c_read_receipt(ctx: *mut c_void, message: *const c_char) {
    let message = unsafe { lossy(message) };
    unsafe { adv(ctx) }.on_recv_c2c_read_receipt(message);
}

unsafe extern "C" fn adv_on_recv_message_revoked(ctx: *mut c_void, message: *const c_char) {
    let message = unsafe { lossy(message) };
    unsafe { adv(ctx) }.on_recv_message_revoked(message);
}

unsafe extern "C" fn adv_on_recv_new_message(ctx: *mut c_void, message: *const c_char) {
    let message = unsafe { lossy(message) };
    unsafe { adv(ctx) }.on_recv_new_message(message);
}

unsafe extern "C" fn adv_release(ctx: *mut c_void) {
    drop(unsafe { Box::from_raw(ctx.cast::<Arc<dyn AdvancedMsgListener>>()) });
}

// ─── ImSdk over the vtable ───────────────────────────────────────────

impl ImSdk for VTableSdk {
    fn init_sdk(&self, listener: Arc<dyn ConnListener>, operation_id: &str, config: &str) -> bool {
        let Some([op, config]) = c_args([operation_id, config]) else {
            tracing::warn!("init_sdk: argument contains NUL byte, not calling SDK");
            return false;
        };
        let v = &self.vtable;
        unsafe { (v.init_sdk)(v.sdk_ctx, conn_listener(listener), op.as_ptr(), config.as_ptr()) }
    }

    fn login(&self, callback: Box<dyn BaseCallback>, operation_id: &str, uid: &str, token: &str) {
        let Some([op, uid, token]) = c_args([operation_id, uid, token]) else {
            callback.on_error(ARGUMENT_NOT_C_STRING, "login: argument contains NUL byte".into());
            return;
        };
        let v = &self.vtable;
        unsafe {
            (v.login)(
                v.sdk_ctx,
                base_callback(callback),
                op.as_ptr(),
                uid.as_ptr(),
                token.as_ptr(),
            )
        }
    }

    fn logout(&self, callback: Box<dyn BaseCallback>, operation_id: &str) {
        let Some([op]) = c_args([operation_id]) else {
            callback.on_error(ARGUMENT_NOT_C_STRING, "logout: argument contains NUL byte".into());
            return;
        };
        let v = &self.vtable;
        unsafe { (v.logout)(v.sdk_ctx, base_callback(callback), op.as_ptr()) }
    }

    fn get_login_status(&self) -> i32 {
        let v = &self.vtable;
        unsafe { (v.get_login_status)(v.sdk_ctx) }
    }

    fn get_login_uid(&self) -> String {
        let v = &self.vtable;
        let ptr = unsafe { (v.get_login_uid)(v.sdk_ctx) };
        if ptr.is_null() {
            return String::new();
        }
        let uid = unsafe { lossy(ptr) };
        unsafe { (v.free_string)(v.sdk_ctx, ptr) };
        uid
    }

    fn set_advanced_msg_listener(&self, listener: Arc<dyn AdvancedMsgListener>) {
        let v = &self.vtable;
        unsafe { (v.set_advanced_msg_listener)(v.sdk_ctx, advanced_msg_listener(listener)) }
    }

    fn force_reconnect(&self) {
        let v = &self.vtable;
        unsafe { (v.force_reconnect)(v.sdk_ctx) }
    }
}

/// A fake native SDK written against the C vtable, shared by the FFI tests.
#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    pub struct FakeNative {
        pub log: Mutex<Vec<String>>,
        /// Error to report from login/logout; `None` reports success.
        pub fail_with: Mutex<Option<(i32, String)>>,
        pub conn: Mutex<Option<CConnListener>>,
        pub adv: Mutex<Option<CAdvancedMsgListener>>,
    }

    unsafe fn fake<'a>(ctx: *mut c_void) -> &'a FakeNative {
        unsafe { &*(ctx as *const FakeNative) }
    }

    unsafe extern "C" fn init_sdk(
        ctx: *mut c_void,
        listener: CConnListener,
        op: *const c_char,
        config: *const c_char,
    ) -> bool {
        let f = unsafe { fake(ctx) };
        let line = unsafe { format!("initSDK {} {}", lossy(op), lossy(config)) };
        f.log.lock().push(line);
        if let Some(old) = f.conn.lock().replace(listener) {
            unsafe { (old.release)(old.ctx) };
        }
        true
    }

    unsafe fn complete(f: &FakeNative, cb: CBaseCallback) {
        let outcome = f.fail_with.lock().clone();
        match outcome {
            Some((code, msg)) => {
                let msg = CString::new(msg).unwrap();
                unsafe { (cb.on_error)(cb.ctx, code, msg.as_ptr()) };
            }
            None => unsafe { (cb.on_success)(cb.ctx, c"".as_ptr()) },
        }
    }

    unsafe extern "C" fn login(
        ctx: *mut c_void,
        cb: CBaseCallback,
        op: *const c_char,
        uid: *const c_char,
        token: *const c_char,
    ) {
        let f = unsafe { fake(ctx) };
        let line = unsafe { format!("login {} {} {}", lossy(op), lossy(uid), lossy(token)) };
        f.log.lock().push(line);
        unsafe { complete(f, cb) };
    }

    unsafe extern "C" fn logout(ctx: *mut c_void, cb: CBaseCallback, op: *const c_char) {
        let f = unsafe { fake(ctx) };
        let line = unsafe { format!("logout {}", lossy(op)) };
        f.log.lock().push(line);
        unsafe { complete(f, cb) };
    }

    unsafe extern "C" fn get_login_status(ctx: *mut c_void) -> i32 {
        unsafe { fake(ctx) }.log.lock().push("getLoginStatus".into());
        101
    }

    unsafe extern "C" fn get_login_uid(ctx: *mut c_void) -> *mut c_char {
        unsafe { fake(ctx) }.log.lock().push("getLoginUid".into());
        CString::new("u-native").unwrap().into_raw()
    }

    unsafe extern "C" fn free_string(ctx: *mut c_void, s: *mut c_char) {
        unsafe { fake(ctx) }.log.lock().push("free".into());
        drop(unsafe { CString::from_raw(s) });
    }

    unsafe extern "C" fn set_advanced_msg_listener(ctx: *mut c_void, listener: CAdvancedMsgListener) {
        let f = unsafe { fake(ctx) };
        f.log.lock().push("setAdvancedMsgListener".into());
        if let Some(old) = f.adv.lock().replace(listener) {
            unsafe { (old.release)(old.ctx) };
        }
    }

    unsafe extern "C" fn force_reconnect(ctx: *mut c_void) {
        unsafe { fake(ctx) }.log.lock().push("forceReConn".into());
    }

    impl FakeNative {
        pub fn vtable(&self) -> ImSdkVTable {
            ImSdkVTable {
                sdk_ctx: self as *const FakeNative as *mut c_void,
                init_sdk,
                login,
                logout,
                get_login_status,
                get_login_uid,
                free_string,
                set_advanced_msg_listener,
                force_reconnect,
            }
        }

        pub fn log(&self) -> Vec<String> {
            self.log.lock().clone()
        }

        /// Fire a new-message callback through the registered C listener.
        pub fn push_new_message(&self, message: &str) {
            let listener = (*self.adv.lock()).expect("no advanced listener");
            let message = CString::new(message).unwrap();
            unsafe { (listener.on_recv_new_message)(listener.ctx, message.as_ptr()) };
        }

        pub fn push_connect_failed(&self, code: i32, message: &str) {
            let listener = (*self.conn.lock()).expect("no conn listener");
            let message = CString::new(message).unwrap();
            unsafe { (listener.on_connect_failed)(listener.ctx, code, message.as_ptr()) };
        }
    }

    impl Drop for FakeNative {
        fn drop(&mut self) {
            if let Some(l) = self.conn.lock().take() {
                unsafe { (l.release)(l.ctx) };
            }
            if let Some(l) = self.adv.lock().take() {
                unsafe { (l.release)(l.ctx) };
            }
        }
    }
}
