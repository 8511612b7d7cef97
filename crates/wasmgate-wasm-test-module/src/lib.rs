//! Test guest module for bridge validation.
//!
//! Speaks the bridge ABI: `allocate`/`free` for host-driven buffers,
//! compute exports with the `(ptr, len) -> result_ptr` shape returning
//! zero-terminated UTF-8 JSON, and the `env::native_console_log` import
//! for logging through the host.
//!
//! Build with: `cargo build --target wasm32-unknown-unknown --release`

use std::alloc::{alloc as std_alloc, dealloc as std_dealloc, Layout};

#[link(wasm_import_module = "env")]
extern "C" {
    /// Host logging: forwards `len` bytes at `ptr` to the host's sink.
    fn native_console_log(ptr: *const u8, len: i32);
}

fn log(message: &str) {
    unsafe { native_console_log(message.as_ptr(), message.len() as i32) };
}

/// Allocate memory for the host to write into.
#[no_mangle]
pub extern "C" fn allocate(size: i32) -> i32 {
    let layout = Layout::from_size_align(size as usize, 8).unwrap();
    unsafe { std_alloc(layout) as i32 }
}

/// Free memory previously returned by `allocate` with the same size.
#[no_mangle]
pub extern "C" fn free(ptr: i32, size: i32) {
    let layout = Layout::from_size_align(size as usize, 8).unwrap();
    unsafe { std_dealloc(ptr as *mut u8, layout) };
}

/// Copy `json` into a fresh allocation with a trailing zero byte and
/// return its address. The buffer stays guest-owned; the host only
/// scans and reads it.
fn into_result(json: &str) -> i32 {
    let bytes = json.as_bytes();
    let ptr = allocate(bytes.len() as i32 + 1);
    let dest = ptr as *mut u8;
    for (i, &byte) in bytes.iter().enumerate() {
        unsafe { *dest.add(i) = byte };
    }
    unsafe { *dest.add(bytes.len()) = 0 };
    ptr
}

/// Echo the payload back unchanged.
#[no_mangle]
pub extern "C" fn echo(ptr: i32, len: i32) -> i32 {
    let payload = unsafe { std::slice::from_raw_parts(ptr as *const u8, len as usize) };
    // The payload is already JSON text; hand it straight back.
    let text = std::str::from_utf8(payload).unwrap_or("null");
    into_result(text)
}

/// Ignore the input and report a fixed status object.
#[no_mangle]
pub extern "C" fn do_something(_ptr: i32, _len: i32) -> i32 {
    log("do_something invoked");
    into_result("{\"status\":\"ok\"}")
}

/// Version number for ABI compatibility.
#[no_mangle]
pub extern "C" fn version() -> i32 {
    1
}
