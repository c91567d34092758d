//! Runtime dispatch of the memory and string primitives
//!
//! The first call to any primitive (or to [`resolved`]) probes the CPU, derives
//! thresholds, reads the `TIERMEM_*` tunables and binds one engine entry point
//! per primitive. The bound table is immutable afterwards; every later call is
//! a single indirect call through it.
//!
//! # Examples
//!
//! ```rust
//! let src = *b"hello, world";
//! let mut dst = [0u8; 12];
//! unsafe { tiermem::dispatch::memcpy(dst.as_mut_ptr(), src.as_ptr(), src.len()) };
//! assert_eq!(dst, src);
//!
//! let resolution = tiermem::dispatch::resolved();
//! println!("memcpy bound to {}", resolution.variant(tiermem::dispatch::Primitive::Memcpy));
//! ```

pub mod resolver;
pub(crate) mod table;
pub mod variant;

pub use resolver::{resolve_with, ConfigSource, Resolution};
pub use variant::{detect_generation, Generation, Primitive, VariantIndex, VectorPolicy, GENERATION_RULES};

use crate::config::{Config, TunableConfig};
use crate::system::{cache_geometry, probe};
use std::sync::OnceLock;
use table::DispatchTable;

struct Dispatcher {
    resolution: Resolution,
    table: DispatchTable,
}

static DISPATCHER: OnceLock<Dispatcher> = OnceLock::new();

fn load_tunables() -> TunableConfig {
    match TunableConfig::from_env() {
        Ok(tunables) => tunables,
        Err(e) => {
            log::warn!("Ignoring tunables ({}): {}", e.category(), e);
            TunableConfig::default()
        }
    }
}

#[inline]
fn dispatcher() -> &'static Dispatcher {
    DISPATCHER.get_or_init(|| {
        let (features, vendor_match) = probe();
        let geometry = *cache_geometry();
        let resolution = resolve_with(features, vendor_match, geometry, &load_tunables());
        let table = DispatchTable::from_resolution(&resolution);
        log::debug!("Dispatch table bound, thresholds: {:?}", resolution.thresholds);
        Dispatcher { resolution, table }
    })
}

/// The process-wide resolution, resolving on first use
pub fn resolved() -> &'static Resolution {
    &dispatcher().resolution
}

/// Copy `n` bytes from `src` to `dst` and return `dst`.
///
/// # Safety
///
/// `src` must be valid for `n` reads and `dst` for `n` writes, and the two
/// ranges must not overlap.
#[inline]
pub unsafe fn memcpy(dst: *mut u8, src: *const u8, n: usize) -> *mut u8 {
    let d = dispatcher();
    unsafe { (d.table.memcpy)(&d.resolution.thresholds, dst, src, n) }
}

/// Copy like [`memcpy`] but return `dst + n`.
///
/// # Safety
///
/// Same contract as [`memcpy`].
#[inline]
pub unsafe fn mempcpy(dst: *mut u8, src: *const u8, n: usize) -> *mut u8 {
    let d = dispatcher();
    unsafe { (d.table.mempcpy)(&d.resolution.thresholds, dst, src, n) }
}

/// Copy `n` bytes between possibly overlapping ranges and return `dst`.
///
/// # Safety
///
/// `src` must be valid for `n` reads and `dst` for `n` writes.
#[inline]
pub unsafe fn memmove(dst: *mut u8, src: *const u8, n: usize) -> *mut u8 {
    let d = dispatcher();
    unsafe { (d.table.memmove)(&d.resolution.thresholds, dst, src, n) }
}

/// Fill `n` bytes at `dst` with `c & 0xFF` and return `dst`.
///
/// # Safety
///
/// `dst` must be valid for `n` writes.
#[inline]
pub unsafe fn memset(dst: *mut u8, c: i32, n: usize) -> *mut u8 {
    let d = dispatcher();
    unsafe { (d.table.memset)(&d.resolution.thresholds, dst, c, n) }
}

/// Compare `n` bytes as unsigned values.
///
/// Returns zero when equal, otherwise a value with the sign of the first
/// differing byte of `a` minus that of `b`.
///
/// # Safety
///
/// Both pointers must be valid for `n` reads.
#[inline]
pub unsafe fn memcmp(a: *const u8, b: *const u8, n: usize) -> i32 {
    unsafe { (dispatcher().table.memcmp)(a, b, n) }
}

/// First occurrence of `c & 0xFF` in the `n` bytes at `s`, or null.
///
/// # Safety
///
/// `s` must be valid for `n` reads.
#[inline]
pub unsafe fn memchr(s: *const u8, c: i32, n: usize) -> *const u8 {
    unsafe { (dispatcher().table.memchr)(s, c, n) }
}

/// Length of the NUL-terminated string at `s`.
///
/// # Safety
///
/// `s` must point to a NUL-terminated string.
#[inline]
pub unsafe fn strlen(s: *const u8) -> usize {
    unsafe { (dispatcher().table.strlen)(s) }
}

/// Copy the string at `src`, terminator included, and return `dst`.
///
/// # Safety
///
/// `src` must be NUL-terminated, `dst` must have room for it, and the two
/// must not overlap.
#[inline]
pub unsafe fn strcpy(dst: *mut u8, src: *const u8) -> *mut u8 {
    let d = dispatcher();
    unsafe { (d.table.strcpy)(&d.resolution.thresholds, dst, src) }
}

/// Copy at most `n` bytes of `src`, zero-fill the rest of `n`, return `dst`.
///
/// No terminator is written when `src` is `n` bytes or longer.
///
/// # Safety
///
/// `src` must be NUL-terminated or valid for `n` reads, `dst` must be valid
/// for `n` writes, and the two must not overlap.
#[inline]
pub unsafe fn strncpy(dst: *mut u8, src: *const u8, n: usize) -> *mut u8 {
    let d = dispatcher();
    unsafe { (d.table.strncpy)(&d.resolution.thresholds, dst, src, n) }
}

/// Append the string at `src` to the string at `dst` and return `dst`.
///
/// # Safety
///
/// Both must be NUL-terminated, `dst` must have room for the result, and the
/// two must not overlap.
#[inline]
pub unsafe fn strcat(dst: *mut u8, src: *const u8) -> *mut u8 {
    let d = dispatcher();
    unsafe { (d.table.strcat)(&d.resolution.thresholds, dst, src) }
}

/// Append at most `n` bytes of `src` plus a terminator and return `dst`.
///
/// # Safety
///
/// As [`strcat`], with `src` read for at most `n` bytes.
#[inline]
pub unsafe fn strncat(dst: *mut u8, src: *const u8, n: usize) -> *mut u8 {
    let d = dispatcher();
    unsafe { (d.table.strncat)(&d.resolution.thresholds, dst, src, n) }
}

/// Compare two NUL-terminated strings as unsigned bytes.
///
/// # Safety
///
/// Both must be NUL-terminated.
#[inline]
pub unsafe fn strcmp(a: *const u8, b: *const u8) -> i32 {
    unsafe { (dispatcher().table.strcmp)(a, b) }
}

/// Compare at most `n` bytes of two NUL-terminated strings.
///
/// # Safety
///
/// Each must be NUL-terminated or valid for `n` reads.
#[inline]
pub unsafe fn strncmp(a: *const u8, b: *const u8, n: usize) -> i32 {
    unsafe { (dispatcher().table.strncmp)(a, b, n) }
}

/// First occurrence of `c & 0xFF` in the string at `s`, or null.
///
/// Searching for `0` returns the terminator.
///
/// # Safety
///
/// `s` must be NUL-terminated.
#[inline]
pub unsafe fn strchr(s: *const u8, c: i32) -> *const u8 {
    unsafe { (dispatcher().table.strchr)(s, c) }
}

/// First occurrence of `needle` in `haystack`, or null.
///
/// An empty needle matches at `haystack`.
///
/// # Safety
///
/// Both must be NUL-terminated.
#[inline]
pub unsafe fn strstr(haystack: *const u8, needle: *const u8) -> *const u8 {
    unsafe { (dispatcher().table.strstr)(haystack, needle) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolved_is_stable() {
        let a = resolved() as *const Resolution;
        let b = resolved() as *const Resolution;
        assert_eq!(a, b);
    }

    #[test]
    fn test_bound_variants_are_runnable() {
        let r = resolved();
        let (features, _) = probe();
        for (p, v) in r.variants() {
            assert!(v.is_supported_by(features), "{:?} bound to {}", p, v);
        }
    }

    #[test]
    fn test_public_entry_points() {
        let src: Vec<u8> = (0..5000u32).map(|i| (i % 251) as u8).collect();
        let mut dst = vec![0u8; 5000];
        unsafe {
            assert_eq!(memcpy(dst.as_mut_ptr(), src.as_ptr(), 5000), dst.as_mut_ptr());
            assert_eq!(memcmp(dst.as_ptr(), src.as_ptr(), 5000), 0);
            assert_eq!(mempcpy(dst.as_mut_ptr(), src.as_ptr(), 10), dst.as_mut_ptr().add(10));

            memmove(dst.as_mut_ptr().add(1), dst.as_ptr(), 4999);
            assert_eq!(&dst[1..], &src[..4999]);

            memset(dst.as_mut_ptr(), 0x141, 100);
            assert!(dst[..100].iter().all(|&b| b == 0x41));
            assert_eq!(memchr(dst.as_ptr(), 0x41, 100), dst.as_ptr());
            assert!(memchr(dst.as_ptr().add(100), 0x41, 0).is_null());

            let s = b"dispatch\0";
            assert_eq!(strlen(s.as_ptr()), 8);
            let mut buf = [0u8; 32];
            strcpy(buf.as_mut_ptr(), s.as_ptr());
            strcat(buf.as_mut_ptr(), b"er\0".as_ptr());
            assert_eq!(&buf[..11], b"dispatcher\0");
            assert_eq!(strcmp(buf.as_ptr(), b"dispatcher\0".as_ptr()), 0);
            assert!(strncmp(buf.as_ptr(), b"dispatchEE\0".as_ptr(), 10) > 0);
            assert_eq!(strchr(buf.as_ptr(), i32::from(b't')), buf.as_ptr().add(5));
            assert_eq!(strstr(buf.as_ptr(), b"che\0".as_ptr()), buf.as_ptr().add(6));

            strncpy(buf.as_mut_ptr(), b"ab\0".as_ptr(), 6);
            assert_eq!(&buf[..7], b"ab\0\0\0\0c");
            strncat(buf.as_mut_ptr(), b"cdef\0".as_ptr(), 2);
            assert_eq!(&buf[..5], b"abcd\0");
        }
    }
}
