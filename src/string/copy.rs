//! `strcpy` / `strncpy` / `strcat` / `strncat`
//!
//! Each measures first and then hands the byte count to the engine's copy,
//! so long strings get the same tiers as `memcpy`.

use super::length::{strlen, strnlen};
use crate::config::ThresholdSet;
use crate::memory::copy::{copy, Profile};
use crate::memory::set::set;
use crate::simd::vector::Vector;

/// Copy the string at `src`, terminator included
#[inline(always)]
pub(crate) unsafe fn strcpy<V: Vector>(t: &ThresholdSet, dst: *mut u8, src: *const u8, profile: &Profile) -> *mut u8 {
    unsafe {
        let len = strlen::<V>(src);
        copy::<V>(t, dst, src, len + 1, profile);
    }
    dst
}

/// Copy at most `n` bytes of `src` and zero-fill `dst` up to `n`
#[inline(always)]
pub(crate) unsafe fn strncpy<V: Vector>(
    t: &ThresholdSet,
    dst: *mut u8,
    src: *const u8,
    n: usize,
    profile: &Profile,
) -> *mut u8 {
    unsafe {
        let len = strnlen::<V>(src, n);
        copy::<V>(t, dst, src, len, profile);
        set::<V>(t, dst.add(len), 0, n - len, profile);
    }
    dst
}

/// Append the string at `src` to the string at `dst`
#[inline(always)]
pub(crate) unsafe fn strcat<V: Vector>(t: &ThresholdSet, dst: *mut u8, src: *const u8, profile: &Profile) -> *mut u8 {
    unsafe {
        let end = dst.add(strlen::<V>(dst));
        strcpy::<V>(t, end, src, profile);
    }
    dst
}

/// Append at most `n` bytes of `src`, then a terminator
#[inline(always)]
pub(crate) unsafe fn strncat<V: Vector>(
    t: &ThresholdSet,
    dst: *mut u8,
    src: *const u8,
    n: usize,
    profile: &Profile,
) -> *mut u8 {
    unsafe {
        let end = dst.add(strlen::<V>(dst));
        let len = strnlen::<V>(src, n);
        copy::<V>(t, end, src, len, profile);
        *end.add(len) = 0;
    }
    dst
}
