//! Overlap-aware move

use super::copy::{copy, copy_small, forward_blocks, Profile};
use crate::config::ThresholdSet;
use crate::simd::prefetch::prefetch_behind;
use crate::simd::vector::Vector;

/// How a move's source and destination ranges relate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlap {
    /// No shared byte
    Disjoint,
    /// Same start address; nothing to do
    Identical,
    /// `src < dst < src + n`: copy high to low
    DstAfterSrc,
    /// `dst < src < dst + n`: copy low to high
    DstBeforeSrc,
}

impl Overlap {
    /// Classify a `(dst, src, n)` triple by address only
    #[inline(always)]
    pub fn classify(dst: *const u8, src: *const u8, n: usize) -> Self {
        let (d, s) = (dst as usize, src as usize);
        if d == s {
            Overlap::Identical
        } else if d > s && d - s < n {
            Overlap::DstAfterSrc
        } else if s > d && s - d < n {
            Overlap::DstBeforeSrc
        } else {
            Overlap::Disjoint
        }
    }
}

/// High-to-low block copy of `n > 4W` bytes.
///
/// The first four vectors and the last one are read before the loop and
/// written after it, which keeps the copy correct when `src < dst` overlap.
#[inline(always)]
pub(crate) unsafe fn backward_blocks<V: Vector>(dst: *mut u8, src: *const u8, n: usize, profile: &Profile) {
    let w = V::WIDTH;
    debug_assert!(n > 4 * w);
    let p = profile.blocks.temporal();
    unsafe {
        let h0 = V::loadu(src);
        let h1 = V::loadu(src.add(w));
        let h2 = V::loadu(src.add(2 * w));
        let h3 = V::loadu(src.add(3 * w));
        let last = V::loadu(src.add(n - w));

        let (load, store) = p.modes::<V>(dst as usize, src as usize);
        let mut end = n - (p.anchor(dst, src).wrapping_add(n) & (w - 1));
        while end > 4 * w {
            end -= 4 * w;
            if let Some(locality) = p.prefetch {
                prefetch_behind(src.add(end), locality);
            }
            let d = V::load(src.add(end + 3 * w), load);
            let c = V::load(src.add(end + 2 * w), load);
            let b = V::load(src.add(end + w), load);
            let a = V::load(src.add(end), load);
            d.store(dst.add(end + 3 * w), store);
            c.store(dst.add(end + 2 * w), store);
            b.store(dst.add(end + w), store);
            a.store(dst.add(end), store);
        }

        if end > 3 * w {
            h3.storeu(dst.add(3 * w));
        }
        if end > 2 * w {
            h2.storeu(dst.add(2 * w));
        }
        if end > w {
            h1.storeu(dst.add(w));
        }
        h0.storeu(dst);
        last.storeu(dst.add(n - w));
    }
}

/// Move `n` bytes between possibly overlapping ranges.
///
/// Only disjoint ranges reach the rep and streaming tiers.
#[inline(always)]
pub(crate) unsafe fn move_bytes<V: Vector>(t: &ThresholdSet, dst: *mut u8, src: *const u8, n: usize, profile: &Profile) {
    unsafe {
        if n <= 8 * V::WIDTH {
            copy_small::<V>(dst, src, n);
            return;
        }
        match Overlap::classify(dst, src, n) {
            Overlap::Disjoint => copy::<V>(t, dst, src, n, profile),
            Overlap::Identical => {}
            Overlap::DstBeforeSrc => forward_blocks::<V>(dst, src, n, profile.blocks.temporal()),
            Overlap::DstAfterSrc => backward_blocks::<V>(dst, src, n, profile),
        }
    }
}
