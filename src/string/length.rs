//! NUL-terminated length
//!
//! Vectors are read from `W`-aligned addresses only. An aligned vector never
//! straddles a page, so reading the whole vector that holds a valid byte can
//! not fault even when the terminator sits at the end of a mapped page.

use crate::simd::vector::Vector;

/// Length of the string at `s`, excluding the terminator
#[inline(always)]
pub(crate) unsafe fn strlen<V: Vector>(s: *const u8) -> usize {
    let w = V::WIDTH;
    let shift = s as usize & (w - 1);
    let base = s.wrapping_sub(shift);
    unsafe {
        let m = V::load_aligned(base).zero_mask() >> shift;
        if m != 0 {
            return m.trailing_zeros() as usize;
        }

        // Single vectors until the cursor is aligned to a 4-vector block
        let mut off = w;
        while (base as usize + off) & (4 * w - 1) != 0 {
            let m = V::load_aligned(base.wrapping_add(off)).zero_mask();
            if m != 0 {
                return off - shift + m.trailing_zeros() as usize;
            }
            off += w;
        }

        loop {
            let p = base.wrapping_add(off);
            let a = V::load_aligned(p);
            let b = V::load_aligned(p.wrapping_add(w));
            let c = V::load_aligned(p.wrapping_add(2 * w));
            let d = V::load_aligned(p.wrapping_add(3 * w));
            // A zero lane survives the unsigned minimum
            if a.min_u8(b).min_u8(c.min_u8(d)).zero_mask() != 0 {
                for (k, v) in [a, b, c, d].into_iter().enumerate() {
                    let m = v.zero_mask();
                    if m != 0 {
                        return off + k * w - shift + m.trailing_zeros() as usize;
                    }
                }
            }
            off += 4 * w;
        }
    }
}

/// Length of the string at `s`, but at most `maxlen`; never reads a vector
/// that starts at or past `s + maxlen`
#[inline(always)]
pub(crate) unsafe fn strnlen<V: Vector>(s: *const u8, maxlen: usize) -> usize {
    if maxlen == 0 {
        return 0;
    }
    let w = V::WIDTH;
    let shift = s as usize & (w - 1);
    let base = s.wrapping_sub(shift);
    unsafe {
        let m = V::load_aligned(base).zero_mask() >> shift;
        if m != 0 {
            return (m.trailing_zeros() as usize).min(maxlen);
        }

        let mut off = w - shift;
        while off < maxlen {
            let m = V::load_aligned(s.wrapping_add(off)).zero_mask();
            if m != 0 {
                return (off + m.trailing_zeros() as usize).min(maxlen);
            }
            off += w;
        }
        maxlen
    }
}
