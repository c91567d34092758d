//! Concrete string engines bound by the dispatcher

use super::compare::{strcmp, strncmp};
use super::copy;
use super::length::strlen;
use super::search::{strchr, strstr};
use crate::config::ThresholdSet;
use crate::dispatch::table::StringFns;
use crate::dispatch::{Generation, VariantIndex};
use crate::memory::copy::Profile;
use crate::memory::engines::{SYSTEM_PROFILE, ZEN3_PROFILE};

macro_rules! string_engine {
    ($(#[$meta:meta])* $name:ident, $v:ty, $profile:expr) => {
        pub(crate) mod $name {
            use super::*;

            const PROFILE: Profile = $profile;

            $(#[$meta])*
            pub(crate) unsafe fn strlen_entry(s: *const u8) -> usize {
                unsafe { strlen::<$v>(s) }
            }

            $(#[$meta])*
            pub(crate) unsafe fn strcpy_entry(t: &ThresholdSet, dst: *mut u8, src: *const u8) -> *mut u8 {
                unsafe { copy::strcpy::<$v>(t, dst, src, &PROFILE) }
            }

            $(#[$meta])*
            pub(crate) unsafe fn strncpy_entry(t: &ThresholdSet, dst: *mut u8, src: *const u8, n: usize) -> *mut u8 {
                unsafe { copy::strncpy::<$v>(t, dst, src, n, &PROFILE) }
            }

            $(#[$meta])*
            pub(crate) unsafe fn strcat_entry(t: &ThresholdSet, dst: *mut u8, src: *const u8) -> *mut u8 {
                unsafe { copy::strcat::<$v>(t, dst, src, &PROFILE) }
            }

            $(#[$meta])*
            pub(crate) unsafe fn strncat_entry(t: &ThresholdSet, dst: *mut u8, src: *const u8, n: usize) -> *mut u8 {
                unsafe { copy::strncat::<$v>(t, dst, src, n, &PROFILE) }
            }

            $(#[$meta])*
            pub(crate) unsafe fn strcmp_entry(a: *const u8, b: *const u8) -> i32 {
                unsafe { strcmp::<$v>(a, b) }
            }

            $(#[$meta])*
            pub(crate) unsafe fn strncmp_entry(a: *const u8, b: *const u8, n: usize) -> i32 {
                unsafe { strncmp::<$v>(a, b, n) }
            }

            $(#[$meta])*
            pub(crate) unsafe fn strchr_entry(s: *const u8, c: i32) -> *const u8 {
                unsafe { strchr::<$v>(s, c as u8) }
            }

            $(#[$meta])*
            pub(crate) unsafe fn strstr_entry(haystack: *const u8, needle: *const u8) -> *const u8 {
                unsafe { strstr::<$v>(haystack, needle) }
            }

            pub(crate) static FNS: StringFns = StringFns {
                strlen: strlen_entry,
                strcpy: strcpy_entry,
                strncpy: strncpy_entry,
                strcat: strcat_entry,
                strncat: strncat_entry,
                strcmp: strcmp_entry,
                strncmp: strncmp_entry,
                strchr: strchr_entry,
                strstr: strstr_entry,
            };
        }
    };
}

#[cfg(target_arch = "x86_64")]
string_engine!(system, crate::simd::Sse2, SYSTEM_PROFILE);
#[cfg(not(target_arch = "x86_64"))]
string_engine!(system, crate::simd::Word, SYSTEM_PROFILE);

#[cfg(target_arch = "x86_64")]
string_engine!(#[target_feature(enable = "avx2")] avx2, crate::simd::Avx2, ZEN3_PROFILE);

#[cfg(all(target_arch = "x86_64", tiermem_avx512))]
string_engine!(#[target_feature(enable = "avx512f,avx512bw,avx512vl")] avx512, crate::simd::Avx512, ZEN3_PROFILE);

/// String entry points for a variant.
///
/// Strings have a single engine per vector width, so the policy and rep
/// width of a variant do not matter here.
pub(crate) fn string_fns(variant: VariantIndex) -> &'static StringFns {
    match variant {
        #[cfg(target_arch = "x86_64")]
        VariantIndex::Avx2(_) | VariantIndex::Arch(Generation::Zen1 | Generation::Zen2 | Generation::Zen3) => {
            &avx2::FNS
        }

        #[cfg(all(target_arch = "x86_64", tiermem_avx512))]
        VariantIndex::Avx512(_) | VariantIndex::Arch(Generation::Zen4 | Generation::Zen5) => &avx512::FNS,

        _ => &system::FNS,
    }
}
