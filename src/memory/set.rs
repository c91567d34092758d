//! Size-tiered fill

use super::copy::{Profile, STREAM_BLOCKS};
use crate::config::ThresholdSet;
use crate::simd::erms;
use crate::simd::vector::{store_fence, StoreMode, Vector};

/// Fill `n > 4W` bytes: unaligned head, aligned 4-vector loop, 1..4 vector tail
#[inline(always)]
unsafe fn set_blocks<V: Vector>(dst: *mut u8, v: V, n: usize, store: StoreMode) {
    let w = V::WIDTH;
    debug_assert!(n > 4 * w);
    unsafe {
        v.storeu(dst);
        let mut off = w - (dst as usize & (w - 1));
        while n - off > 4 * w {
            v.store(dst.add(off), store);
            v.store(dst.add(off + w), store);
            v.store(dst.add(off + 2 * w), store);
            v.store(dst.add(off + 3 * w), store);
            off += 4 * w;
        }

        let rest = n - off;
        v.storeu(dst.add(n - w));
        if rest > w {
            v.storeu(dst.add(n - 2 * w));
        }
        if rest > 2 * w {
            v.storeu(dst.add(n - 3 * w));
        }
        if rest > 3 * w {
            v.storeu(dst.add(n - 4 * w));
        }
    }
}

/// Fill `n` bytes at `dst` with `byte`
#[inline(always)]
pub(crate) unsafe fn set<V: Vector>(t: &ThresholdSet, dst: *mut u8, byte: u8, n: usize, profile: &Profile) {
    let w = V::WIDTH;
    unsafe {
        if n < w {
            V::set_short(dst, byte, n);
            return;
        }

        let v = V::splat(byte);
        if n <= 2 * w {
            v.storeu(dst);
            v.storeu(dst.add(n - w));
        } else if n <= 4 * w {
            v.storeu(dst);
            v.storeu(dst.add(w));
            v.storeu(dst.add(n - 2 * w));
            v.storeu(dst.add(n - w));
        } else if n <= 8 * w {
            for k in 0..4 {
                v.storeu(dst.add(k * w));
                v.storeu(dst.add(n - (k + 1) * w));
            }
        } else if profile.size_tiers && t.use_non_temporal(n) {
            set_blocks::<V>(dst, v, n, STREAM_BLOCKS.store);
            store_fence();
        } else if profile.size_tiers && n >= profile.rep_floor(t) && t.use_rep_store(n) {
            erms::rep_store(dst, byte, n);
        } else {
            // Fill always anchors on the destination; a source-aligned policy
            // has nothing to align and stores unaligned.
            set_blocks::<V>(dst, v, n, profile.blocks.store);
            if profile.blocks.is_streaming() {
                store_fence();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::VectorPolicy;
    use crate::memory::copy::BlockPolicy;
    use crate::simd::Word;

    fn check_set<V: Vector>(t: &ThresholdSet, profile: &Profile) {
        let w = V::WIDTH;
        let mut sizes: Vec<usize> = (0..=10 * w).collect();
        sizes.extend([40 * w - 1, 40 * w, 40 * w + 3, 3000, 5000]);
        for n in sizes {
            for off in [0, 1, w - 1] {
                let mut buf = vec![0x11u8; n + off + 8];
                unsafe { set::<V>(t, buf.as_mut_ptr().add(off), 0xC4, n, profile) };
                assert!(buf[..off].iter().all(|&b| b == 0x11), "underrun n={}", n);
                assert!(buf[off..off + n].iter().all(|&b| b == 0xC4), "fill n={}", n);
                assert!(buf[off + n..].iter().all(|&b| b == 0x11), "overrun n={}", n);
            }
        }
    }

    fn thresholds(rep: (usize, usize), nt_start: usize) -> ThresholdSet {
        ThresholdSet {
            repmov_start: rep.0,
            repmov_stop: rep.1,
            repstore_start: rep.0,
            repstore_stop: rep.1,
            nt_start,
            nt_stop: usize::MAX,
            vec_loop_stop: 0,
        }
    }

    #[test]
    fn test_word_set_with_sentinels() {
        for policy in VectorPolicy::ALL {
            check_set::<Word>(&thresholds((0, 0), usize::MAX), &Profile::tunable(policy));
        }
        let tiered = Profile { blocks: BlockPolicy::of(VectorPolicy::AlignedStore, None), size_tiers: true, rep_after_loop: false };
        check_set::<Word>(&thresholds((200, 2000), 4000), &tiered);
    }

    #[test]
    #[cfg(target_arch = "x86_64")]
    fn test_sse2_set_with_sentinels() {
        use crate::simd::Sse2;
        for policy in [VectorPolicy::Unaligned, VectorPolicy::Aligned, VectorPolicy::NonTemporal] {
            check_set::<Sse2>(&thresholds((0, 0), usize::MAX), &Profile::tunable(policy));
        }
        let tiered = Profile { blocks: BlockPolicy::of(VectorPolicy::AlignedStore, None), size_tiers: true, rep_after_loop: false };
        check_set::<Sse2>(&thresholds((200, 2000), 4000), &tiered);
    }

    #[test]
    fn test_zero_length_touches_nothing() {
        let mut buf = [9u8; 4];
        let t = thresholds((0, 0), usize::MAX);
        unsafe { set::<Word>(&t, buf.as_mut_ptr().add(2), 0, 0, &Profile::tunable(VectorPolicy::Unaligned)) };
        assert_eq!(buf, [9; 4]);
    }
}
