//! # SIMD Building Blocks
//!
//! Register abstractions and instruction-level helpers shared by the memory
//! and string engines:
//!
//! - [`vector`]: the width-generic [`Vector`] trait with SSE2, AVX2 and
//!   AVX-512 implementations plus a portable 8-byte word
//! - [`prefetch`]: software prefetch hints used inside block loops
//! - [`erms`]: `rep movs` / `rep stos` / `repe cmps` wrappers

pub mod erms;
pub mod prefetch;
pub mod vector;

pub use erms::RepWidth;
pub use prefetch::{PrefetchLocality, PREFETCH_DISTANCE};
pub use vector::{store_fence, LoadMode, StoreMode, Vector, Word};

#[cfg(target_arch = "x86_64")]
pub use vector::{Avx2, Sse2};

#[cfg(all(target_arch = "x86_64", tiermem_avx512))]
pub use vector::Avx512;

/// Smallest page size on every supported target; reads never cross it blindly
pub const PAGE_SIZE: usize = 4096;

/// Whether a `width`-byte read at `addr` stays inside one page
#[inline(always)]
pub fn fits_in_page(addr: usize, width: usize) -> bool {
    (addr & (PAGE_SIZE - 1)) <= PAGE_SIZE - width
}
