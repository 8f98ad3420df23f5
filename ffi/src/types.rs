//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Host values cross the boundary as `FfiValue` trees: a tag plus the one
//! payload field the tag selects. Arrays and objects point at a contiguous
//! run of child values; objects add a parallel run of key strings. The
//! bridge and promise handles are opaque to C.

use std::ffi::c_void;
use std::os::raw::c_char;

/// Opaque handle to a `Bridge`. Created by `fetchbridge_new`, released by
/// `fetchbridge_free`.
pub struct FfiBridge {
    pub(crate) inner: fetchbridge_core::Bridge,
}

/// Opaque handle to a pending or settled request. Released by
/// `fetchbridge_promise_free`; registered callbacks still fire after that.
pub struct FfiPromise {
    pub(crate) inner: fetchbridge_core::Promise,
}

/// Which payload field of an `FfiValue` is meaningful.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiValueTag {
    Null = 0,
    Bool = 1,
    Number = 2,
    String = 3,
    Array = 4,
    Object = 5,
}

/// A host-native structured value.
///
/// - `Bool`: `boolean`.
/// - `Number`: `number`.
/// - `String`: `string`, NUL-terminated UTF-8.
/// - `Array`: `len` elements at `items`.
/// - `Object`: `len` entries; key `i` is `keys[i]`, value `i` is `items[i]`.
///
/// Unused pointer fields are null. Values passed in by the host are only
/// read; values returned by this library are freed with
/// `fetchbridge_value_free`.
#[repr(C)]
#[derive(Debug)]
pub struct FfiValue {
    pub tag: FfiValueTag,
    pub boolean: bool,
    pub number: f64,
    pub string: *mut c_char,
    pub items: *mut FfiValue,
    pub keys: *mut *mut c_char,
    pub len: u32,
}

impl FfiValue {
    pub(crate) fn empty(tag: FfiValueTag) -> Self {
        Self {
            tag,
            boolean: false,
            number: 0.0,
            string: std::ptr::null_mut(),
            items: std::ptr::null_mut(),
            keys: std::ptr::null_mut(),
            len: 0,
        }
    }
}

/// Terminal state reported to a settlement callback.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiSettleState {
    Resolved = 0,
    Rejected = 1,
}

/// Called once when a promise settles.
///
/// `value` is the response envelope when resolved, or `{"error": ...}` when
/// rejected. It is only valid for the duration of the call. The callback may
/// run on a worker thread.
pub type FfiSettleCallback =
    extern "C" fn(user_data: *mut c_void, state: FfiSettleState, value: *const FfiValue);

/// Caller context carried to a worker thread and handed back untouched.
pub(crate) struct UserData(*mut c_void);

// The pointer is never dereferenced here; the host owns its thread-safety.
unsafe impl Send for UserData {}

impl UserData {
    pub(crate) fn new(ptr: *mut c_void) -> Self {
        Self(ptr)
    }

    pub(crate) fn get(&self) -> *mut c_void {
        self.0
    }
}
