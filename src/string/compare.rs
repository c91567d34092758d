//! `strcmp` / `strncmp`
//!
//! The two strings are rarely co-aligned, so vectors are read unaligned and
//! only when neither read crosses into the next page; otherwise the loop
//! advances one byte until both cursors are clear of the boundary.

use crate::simd::fits_in_page;
use crate::simd::vector::Vector;

#[inline(always)]
fn diff(x: u8, y: u8) -> i32 {
    i32::from(x) - i32::from(y)
}

/// Bit set for each lane that differs or where `a` ends
#[inline(always)]
unsafe fn stop_mask<V: Vector>(a: *const u8, b: *const u8) -> u64 {
    unsafe {
        let va = V::loadu(a);
        let vb = V::loadu(b);
        (!va.eq_mask(vb) | va.zero_mask()) & V::LANE_MASK
    }
}

/// Compare two NUL-terminated strings
#[inline(always)]
pub(crate) unsafe fn strcmp<V: Vector>(a: *const u8, b: *const u8) -> i32 {
    let w = V::WIDTH;
    let mut i = 0usize;
    unsafe {
        loop {
            let (pa, pb) = (a.add(i), b.add(i));
            if fits_in_page(pa as usize, w) && fits_in_page(pb as usize, w) {
                let m = stop_mask::<V>(pa, pb);
                if m != 0 {
                    let j = m.trailing_zeros() as usize;
                    return diff(*pa.add(j), *pb.add(j));
                }
                i += w;
            } else {
                let (x, y) = (*pa, *pb);
                if x != y || x == 0 {
                    return diff(x, y);
                }
                i += 1;
            }
        }
    }
}

/// Compare at most `n` bytes of two NUL-terminated strings
#[inline(always)]
pub(crate) unsafe fn strncmp<V: Vector>(a: *const u8, b: *const u8, n: usize) -> i32 {
    let w = V::WIDTH;
    let mut i = 0usize;
    unsafe {
        while i < n {
            let (pa, pb) = (a.add(i), b.add(i));
            if n - i >= w && fits_in_page(pa as usize, w) && fits_in_page(pb as usize, w) {
                let m = stop_mask::<V>(pa, pb);
                if m != 0 {
                    let j = m.trailing_zeros() as usize;
                    return diff(*pa.add(j), *pb.add(j));
                }
                i += w;
            } else {
                let (x, y) = (*pa, *pb);
                if x != y || x == 0 {
                    return diff(x, y);
                }
                i += 1;
            }
        }
    }
    0
}
