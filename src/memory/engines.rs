//! Concrete memory engines bound by the dispatcher
//!
//! Each engine instantiates the generic kernels for one vector type and one
//! [`Profile`]. Only these entry points carry `#[target_feature]`; the kernels
//! inline into them.

use super::compare::compare;
use super::copy::{self, BlockPolicy, Profile};
use super::overlap::{move_bytes, Overlap};
use super::search::find_ptr;
use super::set::set;
use crate::config::ThresholdSet;
use crate::dispatch::table::MemoryFns;
use crate::dispatch::{Generation, VariantIndex, VectorPolicy};
use crate::simd::erms::{self, RepWidth};
use crate::simd::prefetch::PrefetchLocality;

/// Baseline engine: destination-aligned loop, every size tier
pub(crate) const SYSTEM_PROFILE: Profile = Profile {
    blocks: BlockPolicy::of(VectorPolicy::AlignedStore, None),
    size_tiers: true,
    rep_after_loop: false,
};

/// Zen 1 / Zen 2: unaligned loop, no software prefetch
pub(crate) const ZEN12_PROFILE: Profile = Profile {
    blocks: BlockPolicy::of(VectorPolicy::Unaligned, None),
    size_tiers: true,
    rep_after_loop: true,
};

/// Zen 3 and later: destination-aligned loop with prefetch
pub(crate) const ZEN3_PROFILE: Profile = Profile {
    blocks: BlockPolicy::of(VectorPolicy::AlignedStore, Some(PrefetchLocality::L1Temporal)),
    size_tiers: true,
    rep_after_loop: true,
};

macro_rules! vector_engine {
    ($(#[$meta:meta])* $name:ident, $v:ty, $profile:expr) => {
        pub(crate) mod $name {
            use super::*;

            const PROFILE: Profile = $profile;

            $(#[$meta])*
            pub(crate) unsafe fn memcpy(t: &ThresholdSet, dst: *mut u8, src: *const u8, n: usize) -> *mut u8 {
                unsafe { copy::copy::<$v>(t, dst, src, n, &PROFILE) };
                dst
            }

            $(#[$meta])*
            pub(crate) unsafe fn mempcpy(t: &ThresholdSet, dst: *mut u8, src: *const u8, n: usize) -> *mut u8 {
                unsafe { copy::copy::<$v>(t, dst, src, n, &PROFILE) };
                dst.wrapping_add(n)
            }

            $(#[$meta])*
            pub(crate) unsafe fn memmove(t: &ThresholdSet, dst: *mut u8, src: *const u8, n: usize) -> *mut u8 {
                unsafe { move_bytes::<$v>(t, dst, src, n, &PROFILE) };
                dst
            }

            $(#[$meta])*
            pub(crate) unsafe fn memset(t: &ThresholdSet, dst: *mut u8, c: i32, n: usize) -> *mut u8 {
                unsafe { set::<$v>(t, dst, c as u8, n, &PROFILE) };
                dst
            }

            $(#[$meta])*
            pub(crate) unsafe fn memcmp(a: *const u8, b: *const u8, n: usize) -> i32 {
                unsafe { compare::<$v>(a, b, n) }
            }

            $(#[$meta])*
            pub(crate) unsafe fn memchr(s: *const u8, c: i32, n: usize) -> *const u8 {
                unsafe { find_ptr::<$v>(s, c as u8, n) }
            }

            pub(crate) static FNS: MemoryFns = MemoryFns { memcpy, mempcpy, memmove, memset, memcmp, memchr };
        }
    };
}

macro_rules! erms_engine {
    ($name:ident, $width:expr) => {
        pub(crate) mod $name {
            use super::*;

            const WIDTH: RepWidth = $width;

            pub(crate) unsafe fn memcpy(_t: &ThresholdSet, dst: *mut u8, src: *const u8, n: usize) -> *mut u8 {
                unsafe { erms::rep_move(dst, src, n, WIDTH) };
                dst
            }

            pub(crate) unsafe fn mempcpy(_t: &ThresholdSet, dst: *mut u8, src: *const u8, n: usize) -> *mut u8 {
                unsafe { erms::rep_move(dst, src, n, WIDTH) };
                dst.wrapping_add(n)
            }

            pub(crate) unsafe fn memmove(_t: &ThresholdSet, dst: *mut u8, src: *const u8, n: usize) -> *mut u8 {
                unsafe {
                    match Overlap::classify(dst, src, n) {
                        Overlap::Identical => {}
                        Overlap::DstAfterSrc => erms::rep_move_backward(dst, src, n),
                        Overlap::Disjoint | Overlap::DstBeforeSrc => erms::rep_move(dst, src, n, WIDTH),
                    }
                }
                dst
            }

            pub(crate) unsafe fn memset(_t: &ThresholdSet, dst: *mut u8, c: i32, n: usize) -> *mut u8 {
                unsafe { erms::rep_store(dst, c as u8, n) };
                dst
            }

            pub(crate) unsafe fn memcmp(a: *const u8, b: *const u8, n: usize) -> i32 {
                unsafe { erms::rep_compare(a, b, n, WIDTH) }
            }

            pub(crate) static FNS: MemoryFns = MemoryFns {
                memcpy,
                mempcpy,
                memmove,
                memset,
                memcmp,
                memchr: crate::memory::engines::system::memchr,
            };
        }
    };
}

#[cfg(target_arch = "x86_64")]
vector_engine!(system, crate::simd::Sse2, SYSTEM_PROFILE);
#[cfg(not(target_arch = "x86_64"))]
vector_engine!(system, crate::simd::Word, SYSTEM_PROFILE);

#[cfg(target_arch = "x86_64")]
mod x86 {
    use super::*;
    use crate::simd::Avx2;

    vector_engine!(#[target_feature(enable = "avx2")] zen12, Avx2, ZEN12_PROFILE);
    vector_engine!(#[target_feature(enable = "avx2")] zen3, Avx2, ZEN3_PROFILE);

    vector_engine!(#[target_feature(enable = "avx2")] avx2_unaligned, Avx2, Profile::tunable(VectorPolicy::Unaligned));
    vector_engine!(#[target_feature(enable = "avx2")] avx2_aligned, Avx2, Profile::tunable(VectorPolicy::Aligned));
    vector_engine!(#[target_feature(enable = "avx2")] avx2_aligned_load, Avx2, Profile::tunable(VectorPolicy::AlignedLoad));
    vector_engine!(#[target_feature(enable = "avx2")] avx2_aligned_store, Avx2, Profile::tunable(VectorPolicy::AlignedStore));
    vector_engine!(#[target_feature(enable = "avx2")] avx2_nt, Avx2, Profile::tunable(VectorPolicy::NonTemporal));
    vector_engine!(#[target_feature(enable = "avx2")] avx2_nt_load, Avx2, Profile::tunable(VectorPolicy::NonTemporalLoad));
    vector_engine!(#[target_feature(enable = "avx2")] avx2_nt_store, Avx2, Profile::tunable(VectorPolicy::NonTemporalStore));

    pub(crate) fn avx2(policy: VectorPolicy) -> &'static MemoryFns {
        match policy {
            VectorPolicy::Unaligned => &avx2_unaligned::FNS,
            VectorPolicy::Aligned => &avx2_aligned::FNS,
            VectorPolicy::AlignedLoad => &avx2_aligned_load::FNS,
            VectorPolicy::AlignedStore => &avx2_aligned_store::FNS,
            VectorPolicy::NonTemporal => &avx2_nt::FNS,
            VectorPolicy::NonTemporalLoad => &avx2_nt_load::FNS,
            VectorPolicy::NonTemporalStore => &avx2_nt_store::FNS,
        }
    }

    erms_engine!(erms_b, RepWidth::Byte);
    erms_engine!(erms_w, RepWidth::Word);
    erms_engine!(erms_d, RepWidth::Dword);
    erms_engine!(erms_q, RepWidth::Qword);

    pub(crate) fn erms(width: RepWidth) -> &'static MemoryFns {
        match width {
            RepWidth::Byte => &erms_b::FNS,
            RepWidth::Word => &erms_w::FNS,
            RepWidth::Dword => &erms_d::FNS,
            RepWidth::Qword => &erms_q::FNS,
        }
    }
}

#[cfg(all(target_arch = "x86_64", tiermem_avx512))]
mod x86_avx512 {
    use super::*;
    use crate::simd::Avx512;

    vector_engine!(#[target_feature(enable = "avx512f,avx512bw,avx512vl")] zen45, Avx512, ZEN3_PROFILE);

    vector_engine!(#[target_feature(enable = "avx512f,avx512bw,avx512vl")] avx512_unaligned, Avx512, Profile::tunable(VectorPolicy::Unaligned));
    vector_engine!(#[target_feature(enable = "avx512f,avx512bw,avx512vl")] avx512_aligned, Avx512, Profile::tunable(VectorPolicy::Aligned));
    vector_engine!(#[target_feature(enable = "avx512f,avx512bw,avx512vl")] avx512_aligned_load, Avx512, Profile::tunable(VectorPolicy::AlignedLoad));
    vector_engine!(#[target_feature(enable = "avx512f,avx512bw,avx512vl")] avx512_aligned_store, Avx512, Profile::tunable(VectorPolicy::AlignedStore));
    vector_engine!(#[target_feature(enable = "avx512f,avx512bw,avx512vl")] avx512_nt, Avx512, Profile::tunable(VectorPolicy::NonTemporal));
    vector_engine!(#[target_feature(enable = "avx512f,avx512bw,avx512vl")] avx512_nt_load, Avx512, Profile::tunable(VectorPolicy::NonTemporalLoad));
    vector_engine!(#[target_feature(enable = "avx512f,avx512bw,avx512vl")] avx512_nt_store, Avx512, Profile::tunable(VectorPolicy::NonTemporalStore));

    pub(crate) fn avx512(policy: VectorPolicy) -> &'static MemoryFns {
        match policy {
            VectorPolicy::Unaligned => &avx512_unaligned::FNS,
            VectorPolicy::Aligned => &avx512_aligned::FNS,
            VectorPolicy::AlignedLoad => &avx512_aligned_load::FNS,
            VectorPolicy::AlignedStore => &avx512_aligned_store::FNS,
            VectorPolicy::NonTemporal => &avx512_nt::FNS,
            VectorPolicy::NonTemporalLoad => &avx512_nt_load::FNS,
            VectorPolicy::NonTemporalStore => &avx512_nt_store::FNS,
        }
    }
}

/// Memory entry points for a variant.
///
/// Variants whose code is not compiled into this build fall back to the
/// baseline engine; the resolver never selects them in that case.
pub(crate) fn memory_fns(variant: VariantIndex) -> &'static MemoryFns {
    match variant {
        VariantIndex::System | VariantIndex::Threshold | VariantIndex::Arch(Generation::Unknown) => &system::FNS,

        #[cfg(target_arch = "x86_64")]
        VariantIndex::Arch(Generation::Zen1 | Generation::Zen2) => &x86::zen12::FNS,
        #[cfg(target_arch = "x86_64")]
        VariantIndex::Arch(Generation::Zen3) => &x86::zen3::FNS,
        #[cfg(target_arch = "x86_64")]
        VariantIndex::Avx2(policy) => x86::avx2(policy),
        #[cfg(target_arch = "x86_64")]
        VariantIndex::Erms(width) => x86::erms(width),

        #[cfg(all(target_arch = "x86_64", tiermem_avx512))]
        VariantIndex::Arch(Generation::Zen4 | Generation::Zen5) => &x86_avx512::zen45::FNS,
        #[cfg(all(target_arch = "x86_64", tiermem_avx512))]
        VariantIndex::Avx512(policy) => x86_avx512::avx512(policy),

        #[allow(unreachable_patterns)]
        _ => &system::FNS,
    }
}
