//! C ABI bridge around imbridge-core.
//!
//! Exposes an `extern "C"` surface a native host (C# P/Invoke, a JNI shim,
//! Dart FFI) can call. The messaging SDK itself is handed in as a vtable of C
//! function pointers; results and events come back as UTF-8 JSON through C
//! callbacks, always from the delivery thread. Bridges live in a global handle
//! table keyed by opaque `u64` IDs.

pub mod bridge;
pub mod core;
pub mod error;
pub mod event;
