//! Repeated string instructions (`rep movs`, `rep stos`, `repe cmps`)
//!
//! On x86_64 these are single instructions whose microcode picks its own
//! strategy; with ERMS they are competitive for mid-sized, cache-resident
//! transfers. Elsewhere the same entry points fall back to plain loops so the
//! engines compile unchanged; the resolver never selects a repeated-string
//! variant on a CPU without ERMS.
//!
//! The direction flag is clear on entry to every `asm!` block and each block
//! that sets it clears it again before leaving.

use super::vector::short;

/// Element size for `rep movs` / `repe cmps`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepWidth {
    /// `movsb`: 1 byte
    Byte,
    /// `movsw`: 2 bytes
    Word,
    /// `movsd`: 4 bytes
    Dword,
    /// `movsq`: 8 bytes
    Qword,
}

impl RepWidth {
    /// log2 of the element size
    #[inline]
    pub const fn shift(self) -> u32 {
        match self {
            RepWidth::Byte => 0,
            RepWidth::Word => 1,
            RepWidth::Dword => 2,
            RepWidth::Qword => 3,
        }
    }

    /// Element size in bytes
    #[inline]
    pub const fn bytes(self) -> usize {
        1 << self.shift()
    }
}

/// Forward copy of `n` bytes with `width`-sized elements, remainder bytewise
///
/// # Safety
///
/// `src` readable and `dst` writable for `n` bytes; the ranges must not
/// overlap unless `dst < src`.
#[inline(always)]
pub unsafe fn rep_move(dst: *mut u8, src: *const u8, n: usize, width: RepWidth) {
    let elements = n >> width.shift();
    let rem = n & (width.bytes() - 1);

    #[cfg(target_arch = "x86_64")]
    unsafe {
        use std::arch::asm;
        match width {
            RepWidth::Byte => asm!(
                "rep movsb",
                inout("rcx") n => _,
                inout("rdi") dst => _,
                inout("rsi") src => _,
                options(nostack, preserves_flags)
            ),
            RepWidth::Word => asm!(
                "rep movsw",
                "mov rcx, {rem}",
                "rep movsb",
                rem = in(reg) rem,
                inout("rcx") elements => _,
                inout("rdi") dst => _,
                inout("rsi") src => _,
                options(nostack, preserves_flags)
            ),
            RepWidth::Dword => asm!(
                "rep movsd",
                "mov rcx, {rem}",
                "rep movsb",
                rem = in(reg) rem,
                inout("rcx") elements => _,
                inout("rdi") dst => _,
                inout("rsi") src => _,
                options(nostack, preserves_flags)
            ),
            RepWidth::Qword => asm!(
                "rep movsq",
                "mov rcx, {rem}",
                "rep movsb",
                rem = in(reg) rem,
                inout("rcx") elements => _,
                inout("rdi") dst => _,
                inout("rsi") src => _,
                options(nostack, preserves_flags)
            ),
        }
    }

    #[cfg(not(target_arch = "x86_64"))]
    unsafe {
        let _ = (elements, rem);
        for i in 0..n {
            *dst.add(i) = *src.add(i);
        }
    }
}

/// Backward bytewise copy of `n` bytes, highest address first
///
/// # Safety
///
/// `src` readable and `dst` writable for `n` bytes. Correct for any overlap
/// with `dst > src`.
#[inline(always)]
pub unsafe fn rep_move_backward(dst: *mut u8, src: *const u8, n: usize) {
    if n == 0 {
        return;
    }

    #[cfg(target_arch = "x86_64")]
    unsafe {
        std::arch::asm!(
            "std",
            "rep movsb",
            "cld",
            inout("rcx") n => _,
            inout("rdi") dst.add(n - 1) => _,
            inout("rsi") src.add(n - 1) => _,
            options(nostack)
        );
    }

    #[cfg(not(target_arch = "x86_64"))]
    unsafe {
        for i in (0..n).rev() {
            *dst.add(i) = *src.add(i);
        }
    }
}

/// Fill `n` bytes with `byte` using `rep stosb`
///
/// # Safety
///
/// `dst` writable for `n` bytes.
#[inline(always)]
pub unsafe fn rep_store(dst: *mut u8, byte: u8, n: usize) {
    #[cfg(target_arch = "x86_64")]
    unsafe {
        std::arch::asm!(
            "rep stosb",
            inout("rcx") n => _,
            inout("rdi") dst => _,
            in("al") byte,
            options(nostack, preserves_flags)
        );
    }

    #[cfg(not(target_arch = "x86_64"))]
    unsafe {
        for i in 0..n {
            *dst.add(i) = byte;
        }
    }
}

/// Lexicographic compare of `n` bytes using `repe cmps`
///
/// The mismatching element is located from the count register left behind
/// by the instruction; its bytes are then re-read to produce the signed
/// difference of the first differing byte pair.
///
/// # Safety
///
/// `a` and `b` readable for `n` bytes.
#[inline(always)]
pub unsafe fn rep_compare(a: *const u8, b: *const u8, n: usize, width: RepWidth) -> i32 {
    let size = width.bytes();
    let elements = n >> width.shift();

    if elements > 0 {
        let left = unsafe { repe_cmps(a, b, elements, width) };
        if left != usize::MAX {
            // Element index that stopped the scan
            let stop = elements - left - 1;
            let offset = stop * size;
            let r = unsafe { short::compare_words(a.add(offset), b.add(offset), size) };
            if r != 0 {
                return r;
            }
        }
    }

    let done = elements * size;
    unsafe { short::compare_words(a.add(done), b.add(done), n - done) }
}

/// Run `repe cmps` over `count > 0` elements.
///
/// Returns the count register after the instruction, or `usize::MAX` when
/// every element compared equal.
#[inline(always)]
unsafe fn repe_cmps(a: *const u8, b: *const u8, count: usize, width: RepWidth) -> usize {
    #[cfg(target_arch = "x86_64")]
    {
        let left: usize;
        let equal: u8;
        unsafe {
            use std::arch::asm;
            match width {
                RepWidth::Byte => asm!(
                    "repe cmpsb",
                    "sete {eq}",
                    eq = out(reg_byte) equal,
                    inout("rcx") count => left,
                    inout("rsi") a => _,
                    inout("rdi") b => _,
                    options(nostack, readonly)
                ),
                RepWidth::Word => asm!(
                    "repe cmpsw",
                    "sete {eq}",
                    eq = out(reg_byte) equal,
                    inout("rcx") count => left,
                    inout("rsi") a => _,
                    inout("rdi") b => _,
                    options(nostack, readonly)
                ),
                RepWidth::Dword => asm!(
                    "repe cmpsd",
                    "sete {eq}",
                    eq = out(reg_byte) equal,
                    inout("rcx") count => left,
                    inout("rsi") a => _,
                    inout("rdi") b => _,
                    options(nostack, readonly)
                ),
                RepWidth::Qword => asm!(
                    "repe cmpsq",
                    "sete {eq}",
                    eq = out(reg_byte) equal,
                    inout("rcx") count => left,
                    inout("rsi") a => _,
                    inout("rdi") b => _,
                    options(nostack, readonly)
                ),
            }
        }
        if equal != 0 {
            usize::MAX
        } else {
            left
        }
    }

    #[cfg(not(target_arch = "x86_64"))]
    {
        let size = width.bytes();
        for i in 0..count {
            let off = i * size;
            let differs = (0..size).any(|k| unsafe { *a.add(off + k) != *b.add(off + k) });
            if differs {
                return count - i - 1;
            }
        }
        usize::MAX
    }
}
