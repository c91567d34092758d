//! Byte-wise lexicographic compare

use crate::simd::vector::Vector;

/// Signed difference at the first mismatching lane of the vectors at `off`
#[inline(always)]
unsafe fn mismatch<V: Vector>(a: *const u8, b: *const u8, off: usize) -> Option<i32> {
    unsafe {
        let eq = V::loadu(a.add(off)).eq_mask(V::loadu(b.add(off)));
        let diff = !eq & V::LANE_MASK;
        (diff != 0).then(|| {
            let i = off + diff.trailing_zeros() as usize;
            i32::from(*a.add(i)) - i32::from(*b.add(i))
        })
    }
}

/// First mismatch among four consecutive vectors starting at `off`
#[inline(always)]
unsafe fn mismatch4<V: Vector>(a: *const u8, b: *const u8, off: usize) -> Option<i32> {
    let w = V::WIDTH;
    unsafe {
        let m0 = !V::loadu(a.add(off)).eq_mask(V::loadu(b.add(off))) & V::LANE_MASK;
        let m1 = !V::loadu(a.add(off + w)).eq_mask(V::loadu(b.add(off + w))) & V::LANE_MASK;
        let m2 = !V::loadu(a.add(off + 2 * w)).eq_mask(V::loadu(b.add(off + 2 * w))) & V::LANE_MASK;
        let m3 = !V::loadu(a.add(off + 3 * w)).eq_mask(V::loadu(b.add(off + 3 * w))) & V::LANE_MASK;
        if m0 | m1 | m2 | m3 == 0 {
            return None;
        }
        let (base, m) = if m0 != 0 {
            (off, m0)
        } else if m1 != 0 {
            (off + w, m1)
        } else if m2 != 0 {
            (off + 2 * w, m2)
        } else {
            (off + 3 * w, m3)
        };
        let i = base + m.trailing_zeros() as usize;
        Some(i32::from(*a.add(i)) - i32::from(*b.add(i)))
    }
}

/// Compare `n` bytes; returns `a[i] - b[i]` at the first mismatch, else 0.
///
/// Blocks are checked in ascending order and overlapping blocks only re-check
/// bytes already known equal, so the first mismatch found is the first one.
#[inline(always)]
pub(crate) unsafe fn compare<V: Vector>(a: *const u8, b: *const u8, n: usize) -> i32 {
    let w = V::WIDTH;
    unsafe {
        if n < w {
            return V::compare_short(a, b, n);
        }

        if n <= 2 * w {
            return mismatch::<V>(a, b, 0)
                .or_else(|| mismatch::<V>(a, b, n - w))
                .unwrap_or(0);
        }

        if n <= 4 * w {
            return mismatch::<V>(a, b, 0)
                .or_else(|| mismatch::<V>(a, b, w))
                .or_else(|| mismatch::<V>(a, b, n - 2 * w))
                .or_else(|| mismatch::<V>(a, b, n - w))
                .unwrap_or(0);
        }

        let mut off = 0;
        while n - off > 4 * w {
            if let Some(r) = mismatch4::<V>(a, b, off) {
                return r;
            }
            off += 4 * w;
        }
        mismatch4::<V>(a, b, n - 4 * w).unwrap_or(0)
    }
}
