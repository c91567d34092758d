//! Size-tiered forward copy
//!
//! In units of the vector width `W`:
//!
//! 1. `n <= 2W`: overlapping head/tail vectors (scalar cases below `W`)
//! 2. `n <= 8W`: 2+2 or 4+4 head/tail vectors, no loop
//! 3. block loop: unaligned head, 4-vector loop on an aligned address,
//!    1..4 vector tail ending at `n`
//! 4. `rep movsb` inside the rep-move window
//! 5. non-temporal block loop from `nt_start`, fenced before returning
//!
//! Tiers 4 and 5 are only consulted by engines whose [`Profile`] enables them.

use crate::config::ThresholdSet;
use crate::dispatch::VectorPolicy;
use crate::simd::erms::{self, RepWidth};
use crate::simd::prefetch::{prefetch_ahead, PrefetchLocality};
use crate::simd::vector::{store_fence, LoadMode, StoreMode, Vector};

/// How the 4-vector block loop touches memory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BlockPolicy {
    /// Align the loop on the source address instead of the destination
    pub align_src: bool,
    /// Load mode on the aligned side (or both sides when co-aligned)
    pub load: LoadMode,
    /// Store mode on the aligned side (or both sides when co-aligned)
    pub store: StoreMode,
    /// Prefetch ahead of the loop
    pub prefetch: Option<PrefetchLocality>,
}

impl BlockPolicy {
    /// Loop shape for a tunable vector policy
    pub const fn of(policy: VectorPolicy, prefetch: Option<PrefetchLocality>) -> Self {
        let (align_src, load, store) = match policy {
            VectorPolicy::Unaligned => (false, LoadMode::Unaligned, StoreMode::Unaligned),
            VectorPolicy::Aligned => (false, LoadMode::Aligned, StoreMode::Aligned),
            VectorPolicy::AlignedLoad => (true, LoadMode::Aligned, StoreMode::Unaligned),
            VectorPolicy::AlignedStore => (false, LoadMode::Unaligned, StoreMode::Aligned),
            VectorPolicy::NonTemporal => (false, LoadMode::Stream, StoreMode::Stream),
            VectorPolicy::NonTemporalLoad => (true, LoadMode::Stream, StoreMode::Unaligned),
            VectorPolicy::NonTemporalStore => (false, LoadMode::Unaligned, StoreMode::Stream),
        };
        Self { align_src, load, store, prefetch }
    }

    /// Whether stores bypass the cache and need a fence
    #[inline(always)]
    pub const fn is_streaming(&self) -> bool {
        matches!(self.store, StoreMode::Stream)
    }

    /// Same loop with every streaming access made temporal.
    ///
    /// Overlapping moves must not stream: the next block may read what the
    /// previous one wrote.
    pub const fn temporal(self) -> Self {
        let load = match self.load {
            LoadMode::Stream => LoadMode::Aligned,
            other => other,
        };
        let store = match self.store {
            StoreMode::Stream => StoreMode::Aligned,
            other => other,
        };
        Self { load, store, ..self }
    }

    /// Effective modes for a concrete `(dst, src)` pair.
    ///
    /// The anchor side is always aligned inside the loop; the other side keeps
    /// its requested mode only when both addresses share the same misalignment.
    #[inline(always)]
    pub(crate) fn modes<V: Vector>(&self, dst: usize, src: usize) -> (LoadMode, StoreMode) {
        let co_aligned = (dst ^ src) & (V::WIDTH - 1) == 0;
        let load = if self.align_src || co_aligned { self.load } else { LoadMode::Unaligned };
        let store = if !self.align_src || co_aligned { self.store } else { StoreMode::Unaligned };
        (load, store)
    }

    #[inline(always)]
    pub(crate) fn anchor(&self, dst: *mut u8, src: *const u8) -> usize {
        if self.align_src {
            src as usize
        } else {
            dst as usize
        }
    }
}

/// Streaming loop used by the large-size tier
pub(crate) const STREAM_BLOCKS: BlockPolicy =
    BlockPolicy::of(VectorPolicy::NonTemporalStore, Some(PrefetchLocality::NonTemporal));

/// Per-engine tier configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Profile {
    /// Loop used between the head/tail tiers and the large tiers
    pub blocks: BlockPolicy,
    /// Consult the rep and non-temporal windows of the threshold set
    pub size_tiers: bool,
    /// Only enter the rep window once `n >= vec_loop_stop`
    pub rep_after_loop: bool,
}

impl Profile {
    /// Profile for a tunable variant: its own loop at every size
    pub const fn tunable(policy: VectorPolicy) -> Self {
        Self {
            blocks: BlockPolicy::of(policy, None),
            size_tiers: false,
            rep_after_loop: false,
        }
    }

    #[inline(always)]
    pub(crate) fn rep_floor(&self, t: &ThresholdSet) -> usize {
        if self.rep_after_loop {
            t.vec_loop_stop
        } else {
            0
        }
    }
}

/// Copy `n <= 8W` bytes. All loads precede all stores, so overlap is fine.
#[inline(always)]
pub(crate) unsafe fn copy_small<V: Vector>(dst: *mut u8, src: *const u8, n: usize) {
    let w = V::WIDTH;
    debug_assert!(n <= 8 * w);
    unsafe {
        if n < w {
            V::copy_short(dst, src, n);
        } else if n <= 2 * w {
            let a = V::loadu(src);
            let b = V::loadu(src.add(n - w));
            a.storeu(dst);
            b.storeu(dst.add(n - w));
        } else if n <= 4 * w {
            let a = V::loadu(src);
            let b = V::loadu(src.add(w));
            let c = V::loadu(src.add(n - 2 * w));
            let d = V::loadu(src.add(n - w));
            a.storeu(dst);
            b.storeu(dst.add(w));
            c.storeu(dst.add(n - 2 * w));
            d.storeu(dst.add(n - w));
        } else {
            let h0 = V::loadu(src);
            let h1 = V::loadu(src.add(w));
            let h2 = V::loadu(src.add(2 * w));
            let h3 = V::loadu(src.add(3 * w));
            let t0 = V::loadu(src.add(n - 4 * w));
            let t1 = V::loadu(src.add(n - 3 * w));
            let t2 = V::loadu(src.add(n - 2 * w));
            let t3 = V::loadu(src.add(n - w));
            h0.storeu(dst);
            h1.storeu(dst.add(w));
            h2.storeu(dst.add(2 * w));
            h3.storeu(dst.add(3 * w));
            t0.storeu(dst.add(n - 4 * w));
            t1.storeu(dst.add(n - 3 * w));
            t2.storeu(dst.add(n - 2 * w));
            t3.storeu(dst.add(n - w));
        }
    }
}

/// Low-to-high block copy of `n > 4W` bytes.
///
/// The first vector and the last four are read before the loop and written
/// after it, which keeps the copy correct when `dst < src` overlap.
#[inline(always)]
pub(crate) unsafe fn forward_blocks<V: Vector>(dst: *mut u8, src: *const u8, n: usize, p: BlockPolicy) {
    let w = V::WIDTH;
    debug_assert!(n > 4 * w);
    unsafe {
        let head = V::loadu(src);
        let t0 = V::loadu(src.add(n - w));
        let t1 = V::loadu(src.add(n - 2 * w));
        let t2 = V::loadu(src.add(n - 3 * w));
        let t3 = V::loadu(src.add(n - 4 * w));

        let (load, store) = p.modes::<V>(dst as usize, src as usize);
        let mut off = w - (p.anchor(dst, src) & (w - 1));

        while n - off > 4 * w {
            if let Some(locality) = p.prefetch {
                prefetch_ahead(src.add(off), locality);
            }
            let a = V::load(src.add(off), load);
            let b = V::load(src.add(off + w), load);
            let c = V::load(src.add(off + 2 * w), load);
            let d = V::load(src.add(off + 3 * w), load);
            a.store(dst.add(off), store);
            b.store(dst.add(off + w), store);
            c.store(dst.add(off + 2 * w), store);
            d.store(dst.add(off + 3 * w), store);
            off += 4 * w;
        }

        let rest = n - off;
        t0.storeu(dst.add(n - w));
        if rest > w {
            t1.storeu(dst.add(n - 2 * w));
        }
        if rest > 2 * w {
            t2.storeu(dst.add(n - 3 * w));
        }
        if rest > 3 * w {
            t3.storeu(dst.add(n - 4 * w));
        }
        head.storeu(dst);
    }
}

/// Tiered copy of `n` bytes between disjoint ranges
#[inline(always)]
pub(crate) unsafe fn copy<V: Vector>(t: &ThresholdSet, dst: *mut u8, src: *const u8, n: usize, profile: &Profile) {
    unsafe {
        if n <= 8 * V::WIDTH {
            copy_small::<V>(dst, src, n);
            return;
        }

        if profile.size_tiers {
            if t.use_non_temporal(n) {
                forward_blocks::<V>(dst, src, n, STREAM_BLOCKS);
                store_fence();
                return;
            }
            if n >= profile.rep_floor(t) && t.use_rep_move(n) {
                erms::rep_move(dst, src, n, RepWidth::Byte);
                return;
            }
        }

        forward_blocks::<V>(dst, src, n, profile.blocks);
        if profile.blocks.is_streaming() {
            store_fence();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simd::Word;

    fn thresholds(rep: (usize, usize), nt_start: usize) -> ThresholdSet {
        ThresholdSet {
            repmov_start: rep.0,
            repmov_stop: rep.1,
            repstore_start: rep.0,
            repstore_stop: rep.1,
            nt_start,
            nt_stop: usize::MAX,
            vec_loop_stop: 1024,
        }
    }

    fn pattern(n: usize, seed: u8) -> Vec<u8> {
        (0..n).map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed)).collect()
    }

    fn check_copy<V: Vector>(t: &ThresholdSet, profile: &Profile, sizes: &[usize]) {
        let w = V::WIDTH;
        for &n in sizes {
            for s_off in [0, 1, w - 1] {
                for d_off in [0, 3, w / 2] {
                    let src = pattern(n + s_off, n as u8);
                    let mut dst = vec![0xEEu8; n + d_off + 8];
                    unsafe { copy::<V>(t, dst.as_mut_ptr().add(d_off), src.as_ptr().add(s_off), n, profile) };
                    assert_eq!(&dst[d_off..d_off + n], &src[s_off..], "n={} s_off={} d_off={}", n, s_off, d_off);
                    assert!(dst[..d_off].iter().all(|&b| b == 0xEE), "underrun n={}", n);
                    assert!(dst[d_off + n..].iter().all(|&b| b == 0xEE), "overrun n={}", n);
                }
            }
        }
    }

    fn tier_sizes(w: usize) -> Vec<usize> {
        let mut sizes = vec![0, 1, 2, 3, 4, 7, 8, 15, 16, 31, 32, 33];
        for k in [1, 2, 4, 8, 9, 16, 40] {
            sizes.extend([k * w - 1, k * w, k * w + 1]);
        }
        sizes.extend([1000, 4095, 4096, 5000]);
        sizes
    }

    #[test]
    fn test_block_policy_modes() {
        let p = BlockPolicy::of(VectorPolicy::Aligned, None);
        // Co-aligned: both sides keep aligned modes
        assert_eq!(p.modes::<Word>(0x1003, 0x2003), (LoadMode::Aligned, StoreMode::Aligned));
        // Misaligned source degrades the load only
        assert_eq!(p.modes::<Word>(0x1003, 0x2005), (LoadMode::Unaligned, StoreMode::Aligned));

        let p = BlockPolicy::of(VectorPolicy::AlignedLoad, None);
        assert_eq!(p.modes::<Word>(0x1001, 0x2000), (LoadMode::Aligned, StoreMode::Unaligned));

        let p = BlockPolicy::of(VectorPolicy::NonTemporal, None);
        assert!(p.is_streaming());
        assert!(!p.temporal().is_streaming());
        assert_eq!(p.temporal().load, LoadMode::Aligned);
    }

    #[test]
    fn test_word_copy_all_policies() {
        let t = thresholds((0, 0), usize::MAX);
        for policy in VectorPolicy::ALL {
            check_copy::<Word>(&t, &Profile::tunable(policy), &tier_sizes(8));
        }
    }

    #[test]
    fn test_word_copy_size_tiers() {
        let profile = Profile { blocks: BlockPolicy::of(VectorPolicy::AlignedStore, None), size_tiers: true, rep_after_loop: true };
        // Rep window 2000..=4096, streaming from 4097
        let t = thresholds((2000, 4096), 4097);
        check_copy::<Word>(&t, &profile, &tier_sizes(8));
    }

    #[test]
    #[cfg(target_arch = "x86_64")]
    fn test_sse2_copy_all_tiers() {
        use crate::simd::Sse2;
        let t = thresholds((0, 0), usize::MAX);
        for policy in VectorPolicy::ALL {
            check_copy::<Sse2>(&t, &Profile::tunable(policy), &tier_sizes(16));
        }

        let profile = Profile { blocks: BlockPolicy::of(VectorPolicy::Unaligned, None), size_tiers: true, rep_after_loop: false };
        check_copy::<Sse2>(&thresholds((300, 2048), 3000), &profile, &tier_sizes(16));
    }

    #[test]
    fn test_forward_blocks_overlap_dst_before_src() {
        for shift in [1, 7, 8, 9, 64, 100] {
            let n = 700;
            let mut buf = pattern(n + shift, 5);
            let expected = buf[shift..shift + n].to_vec();
            unsafe {
                let base = buf.as_mut_ptr();
                forward_blocks::<Word>(base, base.add(shift), n, BlockPolicy::of(VectorPolicy::AlignedStore, None));
            }
            assert_eq!(&buf[..n], &expected[..], "shift={}", shift);
        }
    }
}
