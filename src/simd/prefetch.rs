//! Software prefetch hints for the block loops
//!
//! Prefetch never faults, so addresses past the end of a buffer are fine;
//! they are formed with wrapping arithmetic for that reason.

/// Distance ahead of the current block that loops prefetch, in bytes
pub const PREFETCH_DISTANCE: usize = 512;

/// Prefetch locality hints for different cache levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefetchLocality {
    /// Temporal L1 cache (T0): data reused immediately
    L1Temporal,
    /// Non-temporal (NTA): streamed once, minimize pollution
    NonTemporal,
}

/// Issue one prefetch for the cache line holding `addr`
#[inline(always)]
pub fn prefetch(addr: *const u8, locality: PrefetchLocality) {
    #[cfg(target_arch = "x86_64")]
    {
        use std::arch::x86_64::{_mm_prefetch, _MM_HINT_NTA, _MM_HINT_T0};
        // SAFETY: prefetch is a hint and cannot fault on any address
        unsafe {
            match locality {
                PrefetchLocality::L1Temporal => _mm_prefetch::<_MM_HINT_T0>(addr as *const i8),
                PrefetchLocality::NonTemporal => _mm_prefetch::<_MM_HINT_NTA>(addr as *const i8),
            }
        }
    }

    #[cfg(target_arch = "aarch64")]
    unsafe {
        match locality {
            PrefetchLocality::L1Temporal => {
                std::arch::asm!("prfm pldl1keep, [{0}]", in(reg) addr, options(nostack, readonly, preserves_flags));
            }
            PrefetchLocality::NonTemporal => {
                std::arch::asm!("prfm pldl1strm, [{0}]", in(reg) addr, options(nostack, readonly, preserves_flags));
            }
        }
    }

    #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
    {
        let _ = (addr, locality);
    }
}

/// Prefetch the line [`PREFETCH_DISTANCE`] bytes past `addr`
#[inline(always)]
pub fn prefetch_ahead(addr: *const u8, locality: PrefetchLocality) {
    prefetch(addr.wrapping_add(PREFETCH_DISTANCE), locality);
}

/// Prefetch the line [`PREFETCH_DISTANCE`] bytes before `addr` (backward loops)
#[inline(always)]
pub fn prefetch_behind(addr: *const u8, locality: PrefetchLocality) {
    prefetch(addr.wrapping_sub(PREFETCH_DISTANCE), locality);
}
