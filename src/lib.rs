pub mod block;
pub mod compiler;
pub mod edit;
pub mod error;
pub mod json;
pub mod language;
pub mod parser;
pub mod scope;
pub mod value;

pub use block::{Block, BlockId, BlockKind, ConditionalBlock, ElseKind};
pub use compiler::{compile, Compiler};
pub use error::{Diagnostic, Error, Result};
pub use language::{LanguageService, Python};
pub use parser::{parse, parse_with_diagnostics, ParseOutput};
pub use scope::{names_visible_at, visible_names};
pub use value::Value;

use serde_json::json;

// ── WASM FFI ────────────────────────────────────────────────────────
//
// The editor talks to the core through JSON strings. Every `wasm_*`
// function returns a null-terminated JSON document that the caller frees
// with `dealloc(ptr, strlen(ptr) + 1)`.

/// Allocate `len` bytes in WASM memory, returning a pointer (null on failure).
/// The caller must free the returned pointer with `dealloc(ptr, len)`.
#[no_mangle]
pub extern "C" fn alloc(len: usize) -> *mut u8 {
    match std::alloc::Layout::from_size_align(len, 1) {
        Ok(layout) => unsafe { std::alloc::alloc(layout) },
        Err(_) => std::ptr::null_mut(),
    }
}

/// Free a buffer previously returned by `alloc` or by any of the
/// `wasm_*` functions.
#[no_mangle]
pub unsafe extern "C" fn dealloc(ptr: *mut u8, len: usize) {
    if let Ok(layout) = std::alloc::Layout::from_size_align(len, 1) {
        unsafe { std::alloc::dealloc(ptr, layout) };
    }
}

/// Compile a JSON block tree.
/// Returns `{"source": "..."}` or `{"error": "..."}`.
#[no_mangle]
pub unsafe extern "C" fn wasm_compile(json_ptr: *const u8, json_len: usize) -> *const u8 {
    let reply = match unsafe { str_from_raw(json_ptr, json_len) }
        .and_then(json::from_json)
        .and_then(|blocks| compile(&blocks))
    {
        Ok(source) => json!({ "source": source }),
        Err(err) => json!({ "error": err.to_string() }),
    };
    string_to_c_ptr(reply.to_string())
}

/// Parse source text.
/// Returns `{"blocks": [...], "diagnostics": [...]}` or `{"error": "..."}`.
#[no_mangle]
pub unsafe extern "C" fn wasm_parse(src_ptr: *const u8, src_len: usize) -> *const u8 {
    let reply = match unsafe { str_from_raw(src_ptr, src_len) } {
        Ok(source) => {
            let output = parse_with_diagnostics(source);
            serde_json::to_value(&output).unwrap_or_else(|err| json!({ "error": err.to_string() }))
        }
        Err(err) => json!({ "error": err.to_string() }),
    };
    string_to_c_ptr(reply.to_string())
}

/// Names in scope just before block `id` of a JSON block tree; an empty `id`
/// means the end of the tree.
/// Returns a JSON array of names or `{"error": "..."}`.
#[no_mangle]
pub unsafe extern "C" fn wasm_visible_names(
    json_ptr: *const u8,
    json_len: usize,
    id_ptr: *const u8,
    id_len: usize,
) -> *const u8 {
    let names = unsafe { str_from_raw(json_ptr, json_len) }
        .and_then(json::from_json)
        .and_then(|blocks| {
            let id = unsafe { str_from_raw(id_ptr, id_len) }?;
            Ok(if id.is_empty() {
                visible_names(&blocks, None, &[])
            } else {
                names_visible_at(&blocks, &BlockId::new(id))
            })
        });
    let reply = match names {
        Ok(names) => json!(names),
        Err(err) => json!({ "error": err.to_string() }),
    };
    string_to_c_ptr(reply.to_string())
}

/// Borrow a UTF-8 string from WASM memory. A zero length never touches `ptr`.
unsafe fn str_from_raw<'a>(ptr: *const u8, len: usize) -> Result<&'a str> {
    if len == 0 {
        return Ok("");
    }
    let bytes = unsafe { std::slice::from_raw_parts(ptr, len) };
    std::str::from_utf8(bytes)
        .map_err(|err| Error::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, err)))
}

/// Convert a String to a null-terminated C pointer with exact allocation size.
/// The allocation size is exactly `s.len() + 1` bytes, so the caller can
/// free with `dealloc(ptr, strlen(ptr) + 1)`.
fn string_to_c_ptr(s: String) -> *const u8 {
    let mut bytes = s.into_bytes();
    bytes.push(0);
    // into_boxed_slice guarantees allocation size == bytes.len()
    let boxed = bytes.into_boxed_slice();
    Box::into_raw(boxed) as *mut u8
}
