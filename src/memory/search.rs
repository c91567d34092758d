//! Bounded byte search

use crate::simd::vector::Vector;

/// Index of the first `byte` in `src[..n]`.
///
/// One unaligned vector, then aligned blocks, then one overlapping vector
/// ending at `n`. Nothing past `n` is read.
#[inline(always)]
pub(crate) unsafe fn find<V: Vector>(src: *const u8, byte: u8, n: usize) -> Option<usize> {
    let w = V::WIDTH;
    unsafe {
        if n < w {
            return V::find_short(src, byte, n);
        }

        let needle = V::splat(byte);
        let m = V::loadu(src).eq_mask(needle);
        if m != 0 {
            return Some(m.trailing_zeros() as usize);
        }

        let mut off = w - (src as usize & (w - 1));
        while off + 4 * w <= n {
            let m0 = V::load_aligned(src.add(off)).eq_mask(needle);
            let m1 = V::load_aligned(src.add(off + w)).eq_mask(needle);
            let m2 = V::load_aligned(src.add(off + 2 * w)).eq_mask(needle);
            let m3 = V::load_aligned(src.add(off + 3 * w)).eq_mask(needle);
            if m0 | m1 | m2 | m3 != 0 {
                let (base, m) = if m0 != 0 {
                    (off, m0)
                } else if m1 != 0 {
                    (off + w, m1)
                } else if m2 != 0 {
                    (off + 2 * w, m2)
                } else {
                    (off + 3 * w, m3)
                };
                return Some(base + m.trailing_zeros() as usize);
            }
            off += 4 * w;
        }

        while off + w <= n {
            let m = V::load_aligned(src.add(off)).eq_mask(needle);
            if m != 0 {
                return Some(off + m.trailing_zeros() as usize);
            }
            off += w;
        }

        if off < n {
            let m = V::loadu(src.add(n - w)).eq_mask(needle);
            if m != 0 {
                return Some(n - w + m.trailing_zeros() as usize);
            }
        }
        None
    }
}

/// Pointer form of [`find`]: null when absent
#[inline(always)]
pub(crate) unsafe fn find_ptr<V: Vector>(src: *const u8, byte: u8, n: usize) -> *const u8 {
    match unsafe { find::<V>(src, byte, n) } {
        Some(i) => src.wrapping_add(i),
        None => std::ptr::null(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simd::Word;

    fn check_find<V: Vector>() {
        let w = V::WIDTH;
        for n in (0..=12 * w).chain([100 * w + 3]) {
            for off in [0, 1, w - 1] {
                let buf = vec![0u8; n + off + 1];
                let base = unsafe { buf.as_ptr().add(off) };
                assert_eq!(unsafe { find::<V>(base, 7, n) }, None);

                for pos in [0, n / 2, n.saturating_sub(1)] {
                    if pos >= n {
                        continue;
                    }
                    let mut hay = buf.clone();
                    hay[off + pos] = 7;
                    if pos + 1 < n {
                        hay[off + n - 1] = 7;
                    }
                    let p = unsafe { hay.as_ptr().add(off) };
                    assert_eq!(unsafe { find::<V>(p, 7, n) }, Some(pos), "n={} off={} pos={}", n, off, pos);
                }

                // A match one past the end is invisible
                let mut hay = buf.clone();
                hay[off + n] = 7;
                let p = unsafe { hay.as_ptr().add(off) };
                assert_eq!(unsafe { find::<V>(p, 7, n) }, None, "n={} off={}", n, off);
            }
        }
    }

    #[test]
    fn test_word_find() {
        check_find::<Word>();
    }

    #[test]
    #[cfg(target_arch = "x86_64")]
    fn test_sse2_find() {
        check_find::<crate::simd::Sse2>();
    }

    #[test]
    fn test_find_ptr() {
        let hay = b"abcdefghijklmnopqrstuvwxyz";
        unsafe {
            assert_eq!(find_ptr::<Word>(hay.as_ptr(), b'q', hay.len()), hay.as_ptr().add(16));
            assert!(find_ptr::<Word>(hay.as_ptr(), b'!', hay.len()).is_null());
            assert!(find_ptr::<Word>(hay.as_ptr(), b'a', 0).is_null());
        }
    }
}
