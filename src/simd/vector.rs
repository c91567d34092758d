//! Width-generic vector abstraction
//!
//! Every engine in `memory` and `string` is written once against [`Vector`]
//! and monomorphized per width. Implementations:
//!
//! | Type       | Width | Available                               |
//! |------------|-------|-----------------------------------------|
//! | [`Word`]   | 8     | everywhere (portable system engine)     |
//! | [`Sse2`]   | 16    | x86_64 baseline (system engine)         |
//! | [`Avx2`]   | 32    | x86_64 with AVX2                        |
//! | [`Avx512`] | 64    | x86_64 with AVX-512 F/BW/VL             |
//!
//! Trait methods are `#[inline(always)]` and carry no `#[target_feature]`;
//! the engine entry points do. Inlining the whole kernel into the entry point
//! is what places the intrinsics in a context where the feature is enabled,
//! so callers must only reach `Avx2`/`Avx512` code through those entry points.

use std::ptr;

/// How a vector is read from memory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    /// Any address
    Unaligned,
    /// Address must be a multiple of the vector width
    Aligned,
    /// Non-temporal hint; aligned address required
    Stream,
}

/// How a vector is written to memory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreMode {
    /// Any address
    Unaligned,
    /// Address must be a multiple of the vector width
    Aligned,
    /// Cache-bypassing store; aligned address required, fence before return
    Stream,
}

/// A SIMD register of `WIDTH` bytes
///
/// # Safety
///
/// All methods are raw memory or register operations. Pointers must be valid
/// for `WIDTH` bytes (or `n` bytes for the `*_short` helpers), and aligned
/// when the method name says so.
pub trait Vector: Copy {
    /// Register width in bytes
    const WIDTH: usize;

    /// Mask with one bit per lane
    const LANE_MASK: u64 = if Self::WIDTH >= 64 {
        u64::MAX
    } else {
        (1u64 << Self::WIDTH) - 1
    };

    /// Unaligned load
    unsafe fn loadu(src: *const u8) -> Self;
    /// Aligned load
    unsafe fn load_aligned(src: *const u8) -> Self;
    /// Non-temporal load (aligned)
    unsafe fn load_stream(src: *const u8) -> Self;
    /// Unaligned store
    unsafe fn storeu(self, dst: *mut u8);
    /// Aligned store
    unsafe fn store_aligned(self, dst: *mut u8);
    /// Non-temporal store (aligned)
    unsafe fn store_stream(self, dst: *mut u8);

    /// Broadcast one byte to every lane
    unsafe fn splat(byte: u8) -> Self;
    /// All-zero register
    unsafe fn zero() -> Self;
    /// Bit `i` set when lane `i` of both operands is equal
    unsafe fn eq_mask(self, other: Self) -> u64;
    /// Lane-wise unsigned minimum
    unsafe fn min_u8(self, other: Self) -> Self;
    /// Bitwise xor
    unsafe fn xor(self, other: Self) -> Self;

    /// Bit `i` set when lane `i` is zero
    #[inline(always)]
    unsafe fn zero_mask(self) -> u64 {
        unsafe { self.eq_mask(Self::zero()) }
    }

    /// Load with a runtime-selected mode
    #[inline(always)]
    unsafe fn load(src: *const u8, mode: LoadMode) -> Self {
        unsafe {
            match mode {
                LoadMode::Unaligned => Self::loadu(src),
                LoadMode::Aligned => Self::load_aligned(src),
                LoadMode::Stream => Self::load_stream(src),
            }
        }
    }

    /// Store with a runtime-selected mode
    #[inline(always)]
    unsafe fn store(self, dst: *mut u8, mode: StoreMode) {
        unsafe {
            match mode {
                StoreMode::Unaligned => self.storeu(dst),
                StoreMode::Aligned => self.store_aligned(dst),
                StoreMode::Stream => self.store_stream(dst),
            }
        }
    }

    /// Copy `n < WIDTH` bytes
    #[inline(always)]
    unsafe fn copy_short(dst: *mut u8, src: *const u8, n: usize) {
        unsafe { short::copy_lt_32(dst, src, n) }
    }

    /// Fill `n < WIDTH` bytes
    #[inline(always)]
    unsafe fn set_short(dst: *mut u8, byte: u8, n: usize) {
        unsafe { short::set_lt_32(dst, byte, n) }
    }

    /// Compare `n < WIDTH` bytes; sign of the first differing byte pair
    #[inline(always)]
    unsafe fn compare_short(a: *const u8, b: *const u8, n: usize) -> i32 {
        unsafe { short::compare_words(a, b, n) }
    }

    /// Index of the first `byte` within `n < WIDTH` bytes
    #[inline(always)]
    unsafe fn find_short(src: *const u8, byte: u8, n: usize) -> Option<usize> {
        unsafe { short::find_bytes(src, byte, n) }
    }
}

/// Register-free helpers for sizes below one vector
pub(crate) mod short {
    use std::ptr;

    /// Copy `n < 32` bytes with overlapping head/tail scalar moves.
    ///
    /// All loads happen before the stores, so overlapping ranges are safe.
    #[inline(always)]
    pub unsafe fn copy_lt_32(dst: *mut u8, src: *const u8, n: usize) {
        unsafe {
            if n >= 16 {
                let head = ptr::read_unaligned(src as *const u128);
                let tail = ptr::read_unaligned(src.add(n - 16) as *const u128);
                ptr::write_unaligned(dst as *mut u128, head);
                ptr::write_unaligned(dst.add(n - 16) as *mut u128, tail);
            } else if n >= 8 {
                let head = ptr::read_unaligned(src as *const u64);
                let tail = ptr::read_unaligned(src.add(n - 8) as *const u64);
                ptr::write_unaligned(dst as *mut u64, head);
                ptr::write_unaligned(dst.add(n - 8) as *mut u64, tail);
            } else if n >= 4 {
                let head = ptr::read_unaligned(src as *const u32);
                let tail = ptr::read_unaligned(src.add(n - 4) as *const u32);
                ptr::write_unaligned(dst as *mut u32, head);
                ptr::write_unaligned(dst.add(n - 4) as *mut u32, tail);
            } else if n >= 2 {
                let head = ptr::read_unaligned(src as *const u16);
                let tail = ptr::read_unaligned(src.add(n - 2) as *const u16);
                ptr::write_unaligned(dst as *mut u16, head);
                ptr::write_unaligned(dst.add(n - 2) as *mut u16, tail);
            } else if n == 1 {
                *dst = *src;
            }
        }
    }

    /// Fill `n < 32` bytes
    #[inline(always)]
    pub unsafe fn set_lt_32(dst: *mut u8, byte: u8, n: usize) {
        let pattern = u64::from_ne_bytes([byte; 8]);
        unsafe {
            if n >= 16 {
                let wide = u128::from(pattern) | (u128::from(pattern) << 64);
                ptr::write_unaligned(dst as *mut u128, wide);
                ptr::write_unaligned(dst.add(n - 16) as *mut u128, wide);
            } else if n >= 8 {
                ptr::write_unaligned(dst as *mut u64, pattern);
                ptr::write_unaligned(dst.add(n - 8) as *mut u64, pattern);
            } else if n >= 4 {
                ptr::write_unaligned(dst as *mut u32, pattern as u32);
                ptr::write_unaligned(dst.add(n - 4) as *mut u32, pattern as u32);
            } else if n >= 2 {
                ptr::write_unaligned(dst as *mut u16, pattern as u16);
                ptr::write_unaligned(dst.add(n - 2) as *mut u16, pattern as u16);
            } else if n == 1 {
                *dst = byte;
            }
        }
    }

    /// Compare `n` bytes eight at a time, then bytewise.
    #[inline(always)]
    pub unsafe fn compare_words(a: *const u8, b: *const u8, n: usize) -> i32 {
        let mut i = 0;
        unsafe {
            while i + 8 <= n {
                let x = ptr::read_unaligned(a.add(i) as *const u64);
                let y = ptr::read_unaligned(b.add(i) as *const u64);
                if x != y {
                    let lane = first_differing_lane(x, y);
                    return i32::from(*a.add(i + lane)) - i32::from(*b.add(i + lane));
                }
                i += 8;
            }
            while i < n {
                let (x, y) = (*a.add(i), *b.add(i));
                if x != y {
                    return i32::from(x) - i32::from(y);
                }
                i += 1;
            }
        }
        0
    }

    /// Index of the first memory-order byte where two words differ
    #[inline(always)]
    fn first_differing_lane(x: u64, y: u64) -> usize {
        let diff = x ^ y;
        if cfg!(target_endian = "little") {
            (diff.trailing_zeros() / 8) as usize
        } else {
            (diff.leading_zeros() / 8) as usize
        }
    }

    /// Linear scan of `n` bytes
    #[inline(always)]
    pub unsafe fn find_bytes(src: *const u8, byte: u8, n: usize) -> Option<usize> {
        (0..n).find(|&i| unsafe { *src.add(i) } == byte)
    }
}

//==============================================================================
// Portable 8-byte word
//==============================================================================

/// A `u64` treated as eight byte lanes; the portable system engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(target_arch = "x86_64", allow(dead_code))]
pub struct Word(u64);

impl Word {
    #[inline(always)]
    fn lanes(self) -> [u8; 8] {
        self.0.to_ne_bytes()
    }
}

impl Vector for Word {
    const WIDTH: usize = 8;

    #[inline(always)]
    unsafe fn loadu(src: *const u8) -> Self {
        Word(unsafe { ptr::read_unaligned(src as *const u64) })
    }

    #[inline(always)]
    unsafe fn load_aligned(src: *const u8) -> Self {
        Word(unsafe { ptr::read(src as *const u64) })
    }

    #[inline(always)]
    unsafe fn load_stream(src: *const u8) -> Self {
        unsafe { Self::load_aligned(src) }
    }

    #[inline(always)]
    unsafe fn storeu(self, dst: *mut u8) {
        unsafe { ptr::write_unaligned(dst as *mut u64, self.0) }
    }

    #[inline(always)]
    unsafe fn store_aligned(self, dst: *mut u8) {
        unsafe { ptr::write(dst as *mut u64, self.0) }
    }

    #[inline(always)]
    unsafe fn store_stream(self, dst: *mut u8) {
        unsafe { self.store_aligned(dst) }
    }

    #[inline(always)]
    unsafe fn splat(byte: u8) -> Self {
        Word(u64::from_ne_bytes([byte; 8]))
    }

    #[inline(always)]
    unsafe fn zero() -> Self {
        Word(0)
    }

    #[inline(always)]
    unsafe fn eq_mask(self, other: Self) -> u64 {
        let (a, b) = (self.lanes(), other.lanes());
        let mut mask = 0u64;
        for i in 0..8 {
            if a[i] == b[i] {
                mask |= 1 << i;
            }
        }
        mask
    }

    #[inline(always)]
    unsafe fn min_u8(self, other: Self) -> Self {
        let (a, b) = (self.lanes(), other.lanes());
        let mut out = [0u8; 8];
        for i in 0..8 {
            out[i] = a[i].min(b[i]);
        }
        Word(u64::from_ne_bytes(out))
    }

    #[inline(always)]
    unsafe fn xor(self, other: Self) -> Self {
        Word(self.0 ^ other.0)
    }
}

//==============================================================================
// x86_64 vectors
//==============================================================================

#[cfg(target_arch = "x86_64")]
pub use x86::{Avx2, Sse2};

#[cfg(all(target_arch = "x86_64", tiermem_avx512))]
pub use x86::Avx512;

#[cfg(target_arch = "x86_64")]
mod x86 {
    use super::Vector;
    use std::arch::x86_64::*;

    /// 128-bit SSE2 register
    #[derive(Clone, Copy)]
    pub struct Sse2(__m128i);

    impl Vector for Sse2 {
        const WIDTH: usize = 16;

        #[inline(always)]
        unsafe fn loadu(src: *const u8) -> Self {
            Sse2(unsafe { _mm_loadu_si128(src.cast()) })
        }

        #[inline(always)]
        unsafe fn load_aligned(src: *const u8) -> Self {
            Sse2(unsafe { _mm_load_si128(src.cast()) })
        }

        // movntdqa needs SSE4.1; the baseline engine uses a plain aligned load
        #[inline(always)]
        unsafe fn load_stream(src: *const u8) -> Self {
            unsafe { Self::load_aligned(src) }
        }

        #[inline(always)]
        unsafe fn storeu(self, dst: *mut u8) {
            unsafe { _mm_storeu_si128(dst.cast(), self.0) }
        }

        #[inline(always)]
        unsafe fn store_aligned(self, dst: *mut u8) {
            unsafe { _mm_store_si128(dst.cast(), self.0) }
        }

        #[inline(always)]
        unsafe fn store_stream(self, dst: *mut u8) {
            unsafe { _mm_stream_si128(dst.cast(), self.0) }
        }

        #[inline(always)]
        unsafe fn splat(byte: u8) -> Self {
            Sse2(unsafe { _mm_set1_epi8(byte as i8) })
        }

        #[inline(always)]
        unsafe fn zero() -> Self {
            Sse2(unsafe { _mm_setzero_si128() })
        }

        #[inline(always)]
        unsafe fn eq_mask(self, other: Self) -> u64 {
            unsafe { _mm_movemask_epi8(_mm_cmpeq_epi8(self.0, other.0)) as u32 as u64 }
        }

        #[inline(always)]
        unsafe fn min_u8(self, other: Self) -> Self {
            Sse2(unsafe { _mm_min_epu8(self.0, other.0) })
        }

        #[inline(always)]
        unsafe fn xor(self, other: Self) -> Self {
            Sse2(unsafe { _mm_xor_si128(self.0, other.0) })
        }
    }

    /// 256-bit AVX2 register
    #[derive(Clone, Copy)]
    pub struct Avx2(__m256i);

    impl Vector for Avx2 {
        const WIDTH: usize = 32;

        #[inline(always)]
        unsafe fn loadu(src: *const u8) -> Self {
            Avx2(unsafe { _mm256_loadu_si256(src.cast()) })
        }

        #[inline(always)]
        unsafe fn load_aligned(src: *const u8) -> Self {
            Avx2(unsafe { _mm256_load_si256(src.cast()) })
        }

        #[inline(always)]
        unsafe fn load_stream(src: *const u8) -> Self {
            Avx2(unsafe { _mm256_stream_load_si256(src.cast()) })
        }

        #[inline(always)]
        unsafe fn storeu(self, dst: *mut u8) {
            unsafe { _mm256_storeu_si256(dst.cast(), self.0) }
        }

        #[inline(always)]
        unsafe fn store_aligned(self, dst: *mut u8) {
            unsafe { _mm256_store_si256(dst.cast(), self.0) }
        }

        #[inline(always)]
        unsafe fn store_stream(self, dst: *mut u8) {
            unsafe { _mm256_stream_si256(dst.cast(), self.0) }
        }

        #[inline(always)]
        unsafe fn splat(byte: u8) -> Self {
            Avx2(unsafe { _mm256_set1_epi8(byte as i8) })
        }

        #[inline(always)]
        unsafe fn zero() -> Self {
            Avx2(unsafe { _mm256_setzero_si256() })
        }

        #[inline(always)]
        unsafe fn eq_mask(self, other: Self) -> u64 {
            unsafe { _mm256_movemask_epi8(_mm256_cmpeq_epi8(self.0, other.0)) as u32 as u64 }
        }

        #[inline(always)]
        unsafe fn min_u8(self, other: Self) -> Self {
            Avx2(unsafe { _mm256_min_epu8(self.0, other.0) })
        }

        #[inline(always)]
        unsafe fn xor(self, other: Self) -> Self {
            Avx2(unsafe { _mm256_xor_si256(self.0, other.0) })
        }
    }

    /// 512-bit AVX-512 register (F + BW + VL)
    #[cfg(tiermem_avx512)]
    #[derive(Clone, Copy)]
    pub struct Avx512(__m512i);

    #[cfg(tiermem_avx512)]
    impl Avx512 {
        /// Lane mask selecting the low `n` bytes (`n < 64`)
        #[inline(always)]
        fn prefix_mask(n: usize) -> __mmask64 {
            (1u64 << n) - 1
        }
    }

    #[cfg(tiermem_avx512)]
    impl Vector for Avx512 {
        const WIDTH: usize = 64;

        #[inline(always)]
        unsafe fn loadu(src: *const u8) -> Self {
            Avx512(unsafe { _mm512_loadu_si512(src.cast()) })
        }

        #[inline(always)]
        unsafe fn load_aligned(src: *const u8) -> Self {
            Avx512(unsafe { _mm512_load_si512(src.cast()) })
        }

        // Stream loads on write-back memory behave as aligned loads
        #[inline(always)]
        unsafe fn load_stream(src: *const u8) -> Self {
            unsafe { Self::load_aligned(src) }
        }

        #[inline(always)]
        unsafe fn storeu(self, dst: *mut u8) {
            unsafe { _mm512_storeu_si512(dst.cast(), self.0) }
        }

        #[inline(always)]
        unsafe fn store_aligned(self, dst: *mut u8) {
            unsafe { _mm512_store_si512(dst.cast(), self.0) }
        }

        #[inline(always)]
        unsafe fn store_stream(self, dst: *mut u8) {
            unsafe { _mm512_stream_si512(dst.cast(), self.0) }
        }

        #[inline(always)]
        unsafe fn splat(byte: u8) -> Self {
            Avx512(unsafe { _mm512_set1_epi8(byte as i8) })
        }

        #[inline(always)]
        unsafe fn zero() -> Self {
            Avx512(unsafe { _mm512_setzero_si512() })
        }

        #[inline(always)]
        unsafe fn eq_mask(self, other: Self) -> u64 {
            unsafe { _mm512_cmpeq_epi8_mask(self.0, other.0) }
        }

        #[inline(always)]
        unsafe fn min_u8(self, other: Self) -> Self {
            Avx512(unsafe { _mm512_min_epu8(self.0, other.0) })
        }

        #[inline(always)]
        unsafe fn xor(self, other: Self) -> Self {
            Avx512(unsafe { _mm512_xor_si512(self.0, other.0) })
        }

        // Masked lanes are never touched, so these cannot fault past `n`
        #[inline(always)]
        unsafe fn copy_short(dst: *mut u8, src: *const u8, n: usize) {
            let k = Self::prefix_mask(n);
            unsafe {
                let v = _mm512_maskz_loadu_epi8(k, src.cast());
                _mm512_mask_storeu_epi8(dst.cast(), k, v);
            }
        }

        #[inline(always)]
        unsafe fn set_short(dst: *mut u8, byte: u8, n: usize) {
            let k = Self::prefix_mask(n);
            unsafe { _mm512_mask_storeu_epi8(dst.cast(), k, _mm512_set1_epi8(byte as i8)) }
        }

        #[inline(always)]
        unsafe fn compare_short(a: *const u8, b: *const u8, n: usize) -> i32 {
            let k = Self::prefix_mask(n);
            unsafe {
                let va = _mm512_maskz_loadu_epi8(k, a.cast());
                let vb = _mm512_maskz_loadu_epi8(k, b.cast());
                let diff = !_mm512_cmpeq_epi8_mask(va, vb) & k;
                if diff == 0 {
                    return 0;
                }
                let i = diff.trailing_zeros() as usize;
                i32::from(*a.add(i)) - i32::from(*b.add(i))
            }
        }

        #[inline(always)]
        unsafe fn find_short(src: *const u8, byte: u8, n: usize) -> Option<usize> {
            let k = Self::prefix_mask(n);
            unsafe {
                let v = _mm512_maskz_loadu_epi8(k, src.cast());
                let hits = _mm512_cmpeq_epi8_mask(v, _mm512_set1_epi8(byte as i8)) & k;
                (hits != 0).then(|| hits.trailing_zeros() as usize)
            }
        }
    }
}

/// Drain write-combining buffers after non-temporal stores
#[inline(always)]
pub fn store_fence() {
    #[cfg(target_arch = "x86_64")]
    unsafe {
        std::arch::x86_64::_mm_sfence();
    }

    #[cfg(not(target_arch = "x86_64"))]
    std::sync::atomic::fence(std::sync::atomic::Ordering::Release);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_masks() {
        unsafe {
            let a = Word::loadu(b"ab\0dabcd".as_ptr());
            let b = Word::loadu(b"abXdabcY".as_ptr());
            assert_eq!(a.eq_mask(b), 0b0111_1011);
            assert_eq!(a.zero_mask(), 0b0000_0100);
            assert_eq!(Word::LANE_MASK, 0xff);
        }
    }

    #[test]
    fn test_word_min_xor_finds_char_or_nul() {
        unsafe {
            let v = Word::loadu(b"hello\0xx".as_ptr());
            let hit = v.xor(Word::splat(b'l')).min_u8(v).zero_mask();
            // 'l' at 2 and 3, NUL at 5
            assert_eq!(hit, 0b0010_1100);
        }
    }

    #[test]
    fn test_short_copy_every_length() {
        let src: Vec<u8> = (0..32u8).collect();
        for n in 0..32 {
            let mut dst = [0xEEu8; 34];
            unsafe { short::copy_lt_32(dst.as_mut_ptr().add(1), src.as_ptr(), n) };
            assert_eq!(dst[0], 0xEE);
            assert_eq!(&dst[1..1 + n], &src[..n]);
            assert_eq!(dst[1 + n], 0xEE, "overrun at n={}", n);
        }
    }

    #[test]
    fn test_short_set_every_length() {
        for n in 0..32 {
            let mut dst = [0u8; 34];
            unsafe { short::set_lt_32(dst.as_mut_ptr().add(1), 0xA5, n) };
            assert_eq!(dst[0], 0);
            assert!(dst[1..1 + n].iter().all(|&b| b == 0xA5));
            assert_eq!(dst[1 + n], 0, "overrun at n={}", n);
        }
    }

    #[test]
    fn test_short_compare_sign() {
        unsafe {
            assert_eq!(short::compare_words(b"abcdefghij".as_ptr(), b"abcdefghij".as_ptr(), 10), 0);
            assert!(short::compare_words(b"abcdefghiz".as_ptr(), b"abcdefghij".as_ptr(), 10) > 0);
            assert!(short::compare_words(b"abc\x01".as_ptr(), b"abc\xff".as_ptr(), 4) < 0);
            // Mismatch beyond n is ignored
            assert_eq!(short::compare_words(b"abcX".as_ptr(), b"abcY".as_ptr(), 3), 0);
        }
    }

    #[test]
    #[cfg(target_arch = "x86_64")]
    fn test_sse2_eq_mask_width() {
        unsafe {
            let a = Sse2::splat(7);
            assert_eq!(a.eq_mask(a), Sse2::LANE_MASK);
            assert_eq!(Sse2::LANE_MASK, 0xffff);
            assert_eq!(a.zero_mask(), 0);
        }
    }
}
