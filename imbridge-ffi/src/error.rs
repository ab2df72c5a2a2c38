//! FFI error codes returned by all `imb_*` functions.

/// Error codes for the C ABI surface.
///
/// Every `imb_*` function that returns `i32` uses these values.
/// Hosts should check for `Ok` (0) and handle errors accordingly.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiResult {
    /// Success.
    Ok = 0,
    /// The handle does not exist in the global handle table.
    InvalidHandle = 1,
    /// A required argument was null or not valid UTF-8.
    InvalidArgument = 2,
    /// An internal error occurred (logged via tracing).
    Internal = 3,
}
