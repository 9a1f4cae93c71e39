//! Region markers for external instrumentation
//!
//! A dynamic-instrumentation tool can hook these symbols by name to bracket
//! the same region the DRAM counters measure. They do nothing on their own.

#![allow(non_snake_case)]

use std::sync::atomic::{compiler_fence, Ordering};

#[no_mangle]
#[inline(never)]
pub extern "C" fn PIN_MARKER_START() {
    compiler_fence(Ordering::SeqCst);
}

#[no_mangle]
#[inline(never)]
pub extern "C" fn PIN_MARKER_END() {
    compiler_fence(Ordering::SeqCst);
}
