//! C-ABI wrapper around `fetchbridge-core`.
//!
//! # Overview
//! Exposes `processJSON`, `extractFields` and `makeRequest` through
//! `extern "C"` functions so a host that can neither parse JSON nor block
//! on I/O can call them with its own structured values.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - Arguments are positional: a pointer to `argc` `FfiValue`s. Inputs are
//!   read, never freed.
//! - The JSON operations return an owned `FfiValue`: a string on success or
//!   an `{"error": ...}` object. Free it with `fetchbridge_value_free`.
//! - `fetchbridge_make_request` and `fetchbridge_get` return an `FfiPromise`
//!   immediately. The host
//!   registers a callback with `fetchbridge_promise_then`; it fires exactly
//!   once, possibly on a worker thread.

mod marshal;
pub mod types;

use std::ffi::c_void;
use std::panic::{catch_unwind, AssertUnwindSafe};

use fetchbridge_core::{Bridge, BridgeOptions, ErrorOutcome, Promise, Settlement};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use types::*;

/// Environment variable holding the `tracing` filter directive.
pub const LOG_ENV: &str = "FETCHBRIDGE_LOG";

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

/// Create a bridge with its worker runtime.
///
/// Reads `FETCHBRIDGE_WORKERS` for the worker thread count. Returns null if
/// the runtime cannot start. Free with `fetchbridge_free`.
#[unsafe(no_mangle)]
pub extern "C" fn fetchbridge_new() -> *mut FfiBridge {
    catch_unwind(|| match Bridge::with_options(BridgeOptions::from_env()) {
        Ok(bridge) => Box::into_raw(Box::new(FfiBridge { inner: bridge })),
        Err(err) => {
            tracing::error!(error = %err, "failed to create bridge");
            std::ptr::null_mut()
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a bridge created by `fetchbridge_new`. Safe to call with null.
///
/// Requests already in flight still settle their promises.
#[unsafe(no_mangle)]
pub extern "C" fn fetchbridge_free(bridge: *mut FfiBridge) {
    if !bridge.is_null() {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            drop(unsafe { Box::from_raw(bridge) });
        }));
    }
}

/// Install a stderr log subscriber filtered by `FETCHBRIDGE_LOG`
/// (default `info`).
///
/// Returns false if a global subscriber is already installed.
#[unsafe(no_mangle)]
pub extern "C" fn fetchbridge_init_logging() -> bool {
    catch_unwind(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init()
            .is_ok()
    })
    .unwrap_or(false)
}

// ---------------------------------------------------------------------------
// Synchronous operations
// ---------------------------------------------------------------------------

/// `processJSON(text)`.
///
/// Returns a string value holding the normalized JSON, or an
/// `{"error": ...}` object. Never returns null.
#[unsafe(no_mangle)]
pub extern "C" fn fetchbridge_process_json(args: *const FfiValue, argc: u32) -> *mut FfiValue {
    catch_unwind(AssertUnwindSafe(|| {
        let args = unsafe { marshal::args_from_ffi(args, argc) };
        boxed_value(&fetchbridge_core::process_json(&args))
    }))
    .unwrap_or_else(|_| panic_value("panic in fetchbridge_process_json"))
}

/// `extractFields(text, fieldNames)`.
///
/// Returns a string value holding the projected object's JSON, or an
/// `{"error": ...}` object. Never returns null.
#[unsafe(no_mangle)]
pub extern "C" fn fetchbridge_extract_fields(args: *const FfiValue, argc: u32) -> *mut FfiValue {
    catch_unwind(AssertUnwindSafe(|| {
        let args = unsafe { marshal::args_from_ffi(args, argc) };
        boxed_value(&fetchbridge_core::extract_fields(&args))
    }))
    .unwrap_or_else(|_| panic_value("panic in fetchbridge_extract_fields"))
}

// ---------------------------------------------------------------------------
// Asynchronous request
// ---------------------------------------------------------------------------

/// `makeRequest(url, config?)`.
///
/// Returns a promise before any work starts. A null `bridge` yields an
/// already-rejected promise. Never returns null. Free with
/// `fetchbridge_promise_free`.
#[unsafe(no_mangle)]
pub extern "C" fn fetchbridge_make_request(
    bridge: *const FfiBridge,
    args: *const FfiValue,
    argc: u32,
) -> *mut FfiPromise {
    spawn_promise(bridge, args, argc, "fetchbridge_make_request", Bridge::make_request)
}

/// `get(url, config?)`: `makeRequest` with the method forced to `GET`.
///
/// Same ownership and null handling as `fetchbridge_make_request`.
#[unsafe(no_mangle)]
pub extern "C" fn fetchbridge_get(
    bridge: *const FfiBridge,
    args: *const FfiValue,
    argc: u32,
) -> *mut FfiPromise {
    spawn_promise(bridge, args, argc, "fetchbridge_get", Bridge::get)
}

/// Register `callback` to run once when `promise` settles.
///
/// If the promise has already settled the callback runs before this
/// function returns. `user_data` is passed through untouched. Returns false
/// if `promise` or `callback` is null.
#[unsafe(no_mangle)]
pub extern "C" fn fetchbridge_promise_then(
    promise: *const FfiPromise,
    callback: Option<FfiSettleCallback>,
    user_data: *mut c_void,
) -> bool {
    let (Some(promise), Some(callback)) = (unsafe { promise.as_ref() }, callback) else {
        return false;
    };
    let user_data = UserData::new(user_data);
    catch_unwind(AssertUnwindSafe(|| {
        promise.inner.then(move |settlement| {
            let (state, value) = match settlement {
                Settlement::Resolved(v) => (FfiSettleState::Resolved, v.clone()),
                Settlement::Rejected(e) => (FfiSettleState::Rejected, e.to_value()),
            };
            let ffi = marshal::to_ffi(&value);
            callback(user_data.get(), state, &ffi);
            unsafe { marshal::free_ffi(ffi) };
        });
    }))
    .is_ok()
}

/// Whether `promise` has settled. False for null.
#[unsafe(no_mangle)]
pub extern "C" fn fetchbridge_promise_is_settled(promise: *const FfiPromise) -> bool {
    match unsafe { promise.as_ref() } {
        Some(promise) => promise.inner.is_settled(),
        None => false,
    }
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free a promise handle. Safe to call with null.
///
/// Does not cancel the request; registered callbacks still fire.
#[unsafe(no_mangle)]
pub extern "C" fn fetchbridge_promise_free(promise: *mut FfiPromise) {
    if !promise.is_null() {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            drop(unsafe { Box::from_raw(promise) });
        }));
    }
}

/// Free a value returned by `fetchbridge_process_json` or
/// `fetchbridge_extract_fields`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn fetchbridge_value_free(value: *mut FfiValue) {
    if value.is_null() {
        return;
    }
    let _ = catch_unwind(AssertUnwindSafe(|| {
        let value = unsafe { Box::from_raw(value) };
        unsafe { marshal::free_ffi(*value) };
    }));
}

fn spawn_promise(
    bridge: *const FfiBridge,
    args: *const FfiValue,
    argc: u32,
    name: &str,
    start: fn(&Bridge, &[Value]) -> Promise,
) -> *mut FfiPromise {
    let promise = catch_unwind(AssertUnwindSafe(|| {
        let Some(bridge) = (unsafe { bridge.as_ref() }) else {
            return Promise::rejected(ErrorOutcome::new("null argument: bridge"));
        };
        let args = unsafe { marshal::args_from_ffi(args, argc) };
        start(&bridge.inner, &args)
    }))
    .unwrap_or_else(|_| Promise::rejected(ErrorOutcome::new(format!("panic in {name}"))));
    Box::into_raw(Box::new(FfiPromise { inner: promise }))
}

fn boxed_value(value: &Value) -> *mut FfiValue {
    Box::into_raw(Box::new(marshal::to_ffi(value)))
}

fn panic_value(msg: &str) -> *mut FfiValue {
    boxed_value(&ErrorOutcome::new(msg).to_value())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
