//! `extern "C"` entry points
//!
//! Each forwards to the dispatched primitive of the same name; the C types in
//! the signatures are the only difference.

use super::CResult;
use crate::dispatch::{self, Primitive};
use std::os::raw::{c_char, c_int, c_void};

/// Resolve the dispatch table now instead of on the first call
#[no_mangle]
pub extern "C" fn tiermem_init() -> CResult {
    crate::init();
    CResult::Success
}

/// NUL-terminated version string with static lifetime
#[no_mangle]
pub extern "C" fn tiermem_version() -> *const c_char {
    concat!(env!("CARGO_PKG_VERSION"), "\0").as_ptr().cast()
}

/// Write the name of the variant bound to primitive `index` into `buf`.
///
/// `index` follows the order of [`Primitive::ALL`]. The name is truncated to
/// `len - 1` bytes and always terminated when `len > 0`.
///
/// # Safety
///
/// `buf` must be valid for `len` writes.
#[no_mangle]
pub unsafe extern "C" fn tiermem_variant_name(index: c_int, buf: *mut c_char, len: usize) -> CResult {
    let Some(primitive) = usize::try_from(index).ok().and_then(|i| Primitive::ALL.get(i).copied()) else {
        return CResult::InvalidInput;
    };
    if buf.is_null() || len == 0 {
        return CResult::InvalidInput;
    }
    let name = dispatch::resolved().variant(primitive).to_string();
    let n = name.len().min(len - 1);
    unsafe {
        dispatch::memcpy(buf.cast(), name.as_ptr(), n);
        *buf.add(n) = 0;
    }
    CResult::Success
}

/// # Safety
///
/// See [`dispatch::memcpy`].
#[no_mangle]
pub unsafe extern "C" fn tiermem_memcpy(dst: *mut c_void, src: *const c_void, n: usize) -> *mut c_void {
    unsafe { dispatch::memcpy(dst.cast(), src.cast(), n).cast() }
}

/// # Safety
///
/// See [`dispatch::mempcpy`].
#[no_mangle]
pub unsafe extern "C" fn tiermem_mempcpy(dst: *mut c_void, src: *const c_void, n: usize) -> *mut c_void {
    unsafe { dispatch::mempcpy(dst.cast(), src.cast(), n).cast() }
}

/// # Safety
///
/// See [`dispatch::memmove`].
#[no_mangle]
pub unsafe extern "C" fn tiermem_memmove(dst: *mut c_void, src: *const c_void, n: usize) -> *mut c_void {
    unsafe { dispatch::memmove(dst.cast(), src.cast(), n).cast() }
}

/// # Safety
///
/// See [`dispatch::memset`].
#[no_mangle]
pub unsafe extern "C" fn tiermem_memset(dst: *mut c_void, c: c_int, n: usize) -> *mut c_void {
    unsafe { dispatch::memset(dst.cast(), c, n).cast() }
}

/// # Safety
///
/// See [`dispatch::memcmp`].
#[no_mangle]
pub unsafe extern "C" fn tiermem_memcmp(a: *const c_void, b: *const c_void, n: usize) -> c_int {
    unsafe { dispatch::memcmp(a.cast(), b.cast(), n) }
}

/// # Safety
///
/// See [`dispatch::memchr`].
#[no_mangle]
pub unsafe extern "C" fn tiermem_memchr(s: *const c_void, c: c_int, n: usize) -> *mut c_void {
    unsafe { dispatch::memchr(s.cast(), c, n) as *mut c_void }
}

/// # Safety
///
/// See [`dispatch::strlen`].
#[no_mangle]
pub unsafe extern "C" fn tiermem_strlen(s: *const c_char) -> usize {
    unsafe { dispatch::strlen(s.cast()) }
}

/// # Safety
///
/// See [`dispatch::strcpy`].
#[no_mangle]
pub unsafe extern "C" fn tiermem_strcpy(dst: *mut c_char, src: *const c_char) -> *mut c_char {
    unsafe { dispatch::strcpy(dst.cast(), src.cast()).cast() }
}

/// # Safety
///
/// See [`dispatch::strncpy`].
#[no_mangle]
pub unsafe extern "C" fn tiermem_strncpy(dst: *mut c_char, src: *const c_char, n: usize) -> *mut c_char {
    unsafe { dispatch::strncpy(dst.cast(), src.cast(), n).cast() }
}

/// # Safety
///
/// See [`dispatch::strcat`].
#[no_mangle]
pub unsafe extern "C" fn tiermem_strcat(dst: *mut c_char, src: *const c_char) -> *mut c_char {
    unsafe { dispatch::strcat(dst.cast(), src.cast()).cast() }
}

/// # Safety
///
/// See [`dispatch::strncat`].
#[no_mangle]
pub unsafe extern "C" fn tiermem_strncat(dst: *mut c_char, src: *const c_char, n: usize) -> *mut c_char {
    unsafe { dispatch::strncat(dst.cast(), src.cast(), n).cast() }
}

/// # Safety
///
/// See [`dispatch::strcmp`].
#[no_mangle]
pub unsafe extern "C" fn tiermem_strcmp(a: *const c_char, b: *const c_char) -> c_int {
    unsafe { dispatch::strcmp(a.cast(), b.cast()) }
}

/// # Safety
///
/// See [`dispatch::strncmp`].
#[no_mangle]
pub unsafe extern "C" fn tiermem_strncmp(a: *const c_char, b: *const c_char, n: usize) -> c_int {
    unsafe { dispatch::strncmp(a.cast(), b.cast(), n) }
}

/// # Safety
///
/// See [`dispatch::strchr`].
#[no_mangle]
pub unsafe extern "C" fn tiermem_strchr(s: *const c_char, c: c_int) -> *mut c_char {
    unsafe { dispatch::strchr(s.cast(), c) as *mut c_char }
}

/// # Safety
///
/// See [`dispatch::strstr`].
#[no_mangle]
pub unsafe extern "C" fn tiermem_strstr(haystack: *const c_char, needle: *const c_char) -> *mut c_char {
    unsafe { dispatch::strstr(haystack.cast(), needle.cast()) as *mut c_char }
}
