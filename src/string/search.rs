//! `strchr` / `strstr`

use super::length::strlen;
use crate::memory::compare::compare;
use crate::simd::vector::Vector;
use std::ptr;

/// Lanes holding either `needle` or a terminator
#[inline(always)]
unsafe fn char_or_nul<V: Vector>(v: V, needle: V) -> u64 {
    unsafe { v.xor(needle).min_u8(v).zero_mask() }
}

/// First occurrence of `c` in the string at `s`, or null.
///
/// `c == 0` finds the terminator.
#[inline(always)]
pub(crate) unsafe fn strchr<V: Vector>(s: *const u8, c: u8) -> *const u8 {
    unsafe {
        if c == 0 {
            return s.add(strlen::<V>(s));
        }

        let w = V::WIDTH;
        let needle = V::splat(c);
        let shift = s as usize & (w - 1);
        let base = s.wrapping_sub(shift);

        let mut m = char_or_nul(V::load_aligned(base), needle) >> shift;
        let mut off = 0usize;
        loop {
            if m != 0 {
                let hit = s.add(off + m.trailing_zeros() as usize);
                return if *hit == c { hit } else { ptr::null() };
            }
            off += if off == 0 { w - shift } else { w };
            m = char_or_nul(V::load_aligned(s.wrapping_add(off)), needle);
        }
    }
}

/// First occurrence of the string `needle` in `haystack`, or null.
///
/// An empty needle matches at `haystack`. Candidates are filtered a vector at
/// a time on the needle's first and last byte, and only survivors are
/// compared in full. Both filter loads stay inside the haystack string, so
/// the haystack length is measured once up front.
#[inline(always)]
pub(crate) unsafe fn strstr<V: Vector>(haystack: *const u8, needle: *const u8) -> *const u8 {
    unsafe {
        if *needle == 0 {
            return haystack;
        }
        let len = strlen::<V>(needle);
        let hay_len = strlen::<V>(haystack);
        if hay_len < len {
            return ptr::null();
        }

        // Number of start positions that leave room for the whole needle
        let starts = hay_len - len + 1;
        let (head, tail) = (*needle, *needle.add(len - 1));
        let w = V::WIDTH;
        let first = V::splat(head);
        let last = V::splat(tail);

        let mut pos = 0;
        while pos + w <= starts {
            let mut m = V::loadu(haystack.add(pos)).eq_mask(first)
                & V::loadu(haystack.add(pos + len - 1)).eq_mask(last);
            while m != 0 {
                let candidate = haystack.add(pos + m.trailing_zeros() as usize);
                if compare::<V>(candidate, needle, len) == 0 {
                    return candidate;
                }
                m &= m - 1;
            }
            pos += w;
        }

        while pos < starts {
            let candidate = haystack.add(pos);
            if *candidate == head && *candidate.add(len - 1) == tail && compare::<V>(candidate, needle, len) == 0 {
                return candidate;
            }
            pos += 1;
        }
        ptr::null()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simd::Word;

    fn offset(base: &[u8], p: *const u8) -> Option<usize> {
        (!p.is_null()).then(|| p as usize - base.as_ptr() as usize)
    }

    fn check_strchr<V: Vector>() {
        let mut text: Vec<u8> = (0..150).map(|i| b'a' + (i % 20) as u8).collect();
        text.push(0);
        for start in 0..40 {
            let s = &text[start..];
            for c in [b'a', b'f', b't', b'z', 0] {
                let got = unsafe { strchr::<V>(s.as_ptr(), c) };
                let want = s.iter().position(|&b| b == c);
                assert_eq!(offset(s, got), want, "start={} c={:?}", start, c as char);
            }
        }
    }

    #[test]
    fn test_word_strchr() {
        check_strchr::<Word>();
    }

    #[test]
    #[cfg(target_arch = "x86_64")]
    fn test_sse2_strchr() {
        check_strchr::<crate::simd::Sse2>();
    }

    #[test]
    fn test_strchr_stops_at_terminator() {
        let s = b"abc\0xyz\0";
        unsafe {
            assert!(strchr::<Word>(s.as_ptr(), b'x').is_null());
            assert_eq!(strchr::<Word>(s.as_ptr(), 0), s.as_ptr().add(3));
        }
    }

    fn check_strstr<V: Vector>() {
        let hay = b"the quick brown fox jumps over the lazy dog; the end\0";
        let cases: [(&[u8], Option<usize>); 8] = [
            (b"\0", Some(0)),
            (b"the\0", Some(0)),
            (b"fox\0", Some(16)),
            (b"the lazy\0", Some(31)),
            (b"the end\0", Some(45)),
            (b"end\0", Some(49)),
            (b"dog!\0", None),
            (b"the endX\0", None),
        ];
        for (needle, want) in cases {
            let got = unsafe { strstr::<V>(hay.as_ptr(), needle.as_ptr()) };
            assert_eq!(offset(hay, got), want, "needle {:?}", String::from_utf8_lossy(needle));
        }
    }

    #[test]
    fn test_word_strstr() {
        check_strstr::<Word>();
    }

    #[test]
    #[cfg(target_arch = "x86_64")]
    fn test_sse2_strstr() {
        check_strstr::<crate::simd::Sse2>();
    }

    #[test]
    fn test_strstr_empty_haystack() {
        let empty = b"\0";
        unsafe {
            assert!(strstr::<Word>(empty.as_ptr(), b"a\0".as_ptr()).is_null());
            assert_eq!(strstr::<Word>(empty.as_ptr(), b"\0".as_ptr()), empty.as_ptr());
        }
    }

    /// Plant `needle` at every start position of haystacks around the vector
    /// width, on a background that matches its first and last bytes often
    fn check_strstr_positions<V: Vector>() {
        let w = V::WIDTH;
        let needles: [&[u8]; 4] = [b"ab", b"aab", b"abcab", b"aaaaaaaaaaaaaaaaaaab"];
        for needle in needles {
            for hay_len in (0..3 * w + 3).chain([8 * w + 5]) {
                let background: Vec<u8> = (0..hay_len).map(|i| if i % 3 == 2 { b'b' } else { b'a' }).collect();
                let mut starts: Vec<Option<usize>> = vec![None];
                if hay_len >= needle.len() {
                    starts.extend((0..=hay_len - needle.len()).map(Some));
                }
                for at in starts {
                    let mut hay = background.clone();
                    if let Some(at) = at {
                        hay[at..at + needle.len()].copy_from_slice(needle);
                    }
                    let want = hay.windows(needle.len()).position(|win| win == needle);
                    hay.push(0);
                    let mut n = needle.to_vec();
                    n.push(0);
                    let got = unsafe { strstr::<V>(hay.as_ptr(), n.as_ptr()) };
                    assert_eq!(offset(&hay, got), want, "len={} needle={:?}", hay_len, String::from_utf8_lossy(needle));
                }
            }
        }
    }

    #[test]
    fn test_word_strstr_every_position() {
        check_strstr_positions::<Word>();
    }

    #[test]
    #[cfg(target_arch = "x86_64")]
    fn test_sse2_strstr_every_position() {
        check_strstr_positions::<crate::simd::Sse2>();
    }

    #[test]
    fn test_strstr_needle_longer_than_haystack() {
        unsafe {
            assert!(strstr::<Word>(b"abc\0".as_ptr(), b"abcd\0".as_ptr()).is_null());
            let whole = b"abcd\0";
            assert_eq!(strstr::<Word>(whole.as_ptr(), b"abcd\0".as_ptr()), whole.as_ptr());
        }
    }
}
