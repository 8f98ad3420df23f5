//! Conversion between host values (`FfiValue`) and `serde_json::Value`.
//!
//! Every value crossing the boundary goes through `to_ffi` or `from_ffi`;
//! nothing else in the crate reads or builds `FfiValue` trees by hand.

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use serde_json::{Map, Number, Value};

use crate::types::{FfiValue, FfiValueTag};

/// Largest integer a host double represents exactly.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Build an owned host value. Release it with [`free_ffi`].
pub(crate) fn to_ffi(value: &Value) -> FfiValue {
    match value {
        Value::Null => FfiValue::empty(FfiValueTag::Null),
        Value::Bool(b) => FfiValue {
            boolean: *b,
            ..FfiValue::empty(FfiValueTag::Bool)
        },
        Value::Number(n) => FfiValue {
            number: n.as_f64().unwrap_or(f64::NAN),
            ..FfiValue::empty(FfiValueTag::Number)
        },
        Value::String(s) => FfiValue {
            string: c_string(s),
            ..FfiValue::empty(FfiValueTag::String)
        },
        Value::Array(items) => {
            let items: Vec<FfiValue> = items.iter().map(to_ffi).collect();
            let len = items.len() as u32;
            FfiValue {
                items: into_raw_slice(items),
                len,
                ..FfiValue::empty(FfiValueTag::Array)
            }
        }
        Value::Object(map) => {
            let keys: Vec<*mut c_char> = map.keys().map(|k| c_string(k)).collect();
            let items: Vec<FfiValue> = map.values().map(to_ffi).collect();
            let len = items.len() as u32;
            FfiValue {
                keys: into_raw_slice(keys),
                items: into_raw_slice(items),
                len,
                ..FfiValue::empty(FfiValueTag::Object)
            }
        }
    }
}

/// Read a host value. A null pointer reads as `null`.
///
/// # Safety
/// `value` must be null or point to a well-formed `FfiValue` tree whose
/// strings are NUL-terminated and whose arrays hold `len` elements.
pub(crate) unsafe fn from_ffi(value: *const FfiValue) -> Value {
    let Some(value) = (unsafe { value.as_ref() }) else {
        return Value::Null;
    };
    match value.tag {
        FfiValueTag::Null => Value::Null,
        FfiValueTag::Bool => Value::Bool(value.boolean),
        FfiValueTag::Number => number(value.number),
        FfiValueTag::String => Value::String(unsafe { read_string(value.string) }),
        FfiValueTag::Array => {
            let items = unsafe { view(value.items, value.len) };
            Value::Array(items.iter().map(|v| unsafe { from_ffi(v) }).collect())
        }
        FfiValueTag::Object => {
            let keys = unsafe { view(value.keys.cast_const(), value.len) };
            let items = unsafe { view(value.items, value.len) };
            let mut map = Map::new();
            for (key, item) in keys.iter().zip(items) {
                map.insert(unsafe { read_string(*key) }, unsafe { from_ffi(item) });
            }
            Value::Object(map)
        }
    }
}

/// Read `argc` positional arguments.
///
/// # Safety
/// `args` must be null or point to `argc` well-formed values.
pub(crate) unsafe fn args_from_ffi(args: *const FfiValue, argc: u32) -> Vec<Value> {
    unsafe { view(args, argc) }
        .iter()
        .map(|v| unsafe { from_ffi(v) })
        .collect()
}

/// Release everything [`to_ffi`] allocated for `value`.
///
/// # Safety
/// `value` must have been produced by [`to_ffi`] and not freed before.
pub(crate) unsafe fn free_ffi(value: FfiValue) {
    if !value.string.is_null() {
        drop(unsafe { CString::from_raw(value.string) });
    }
    if !value.keys.is_null() {
        let keys = unsafe { from_raw_slice(value.keys, value.len) };
        for key in keys.iter() {
            if !key.is_null() {
                drop(unsafe { CString::from_raw(*key) });
            }
        }
    }
    if !value.items.is_null() {
        let items = unsafe { from_raw_slice(value.items, value.len) };
        for item in items.into_vec() {
            unsafe { free_ffi(item) };
        }
    }
}

/// Host numbers are doubles; whole numbers come back as integers so they
/// re-encode without a fractional part. Non-finite numbers have no JSON
/// form and read as `null`.
fn number(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        Value::Number(Number::from(n as i64))
    } else {
        Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
    }
}

/// Allocate a C string. Interior NULs are dropped rather than truncating.
fn c_string(s: &str) -> *mut c_char {
    let bytes: Vec<u8> = s.bytes().filter(|b| *b != 0).collect();
    CString::new(bytes).unwrap_or_default().into_raw()
}

unsafe fn read_string(ptr: *const c_char) -> String {
    if ptr.is_null() {
        return String::new();
    }
    unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
}

unsafe fn view<'a, T>(ptr: *const T, len: u32) -> &'a [T] {
    if ptr.is_null() || len == 0 {
        return &[];
    }
    unsafe { std::slice::from_raw_parts(ptr, len as usize) }
}

fn into_raw_slice<T>(items: Vec<T>) -> *mut T {
    if items.is_empty() {
        return std::ptr::null_mut();
    }
    Box::into_raw(items.into_boxed_slice()) as *mut T
}

unsafe fn from_raw_slice<T>(ptr: *mut T, len: u32) -> Box<[T]> {
    unsafe { Box::from_raw(std::ptr::slice_from_raw_parts_mut(ptr, len as usize)) }
}
