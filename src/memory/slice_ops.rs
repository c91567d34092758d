//! Safe slice wrappers over the dispatched primitives
//!
//! These check lengths and ranges up front, then make the same single
//! indirect call the raw functions in [`crate::dispatch`] make.

use crate::dispatch;
use crate::error::{check_range, Result, TierMemError};
use std::cmp::Ordering;
use std::ops::Range;

/// Copy `src` into `dst`. Both must have the same length.
///
/// # Examples
///
/// ```rust
/// let mut dst = [0u8; 4];
/// tiermem::memory::copy_slice(&mut dst, b"abcd")?;
/// assert_eq!(&dst, b"abcd");
/// assert!(tiermem::memory::copy_slice(&mut dst, b"abc").is_err());
/// # Ok::<(), tiermem::TierMemError>(())
/// ```
pub fn copy_slice(dst: &mut [u8], src: &[u8]) -> Result<()> {
    if dst.len() != src.len() {
        return Err(TierMemError::length_mismatch(dst.len(), src.len()));
    }
    // SAFETY: equal lengths, and `&mut` rules out overlap with `&`
    unsafe { dispatch::memcpy(dst.as_mut_ptr(), src.as_ptr(), src.len()) };
    Ok(())
}

/// Move `buf[src]` to start at `dest`, like [`slice::copy_within`].
pub fn move_within(buf: &mut [u8], src: Range<usize>, dest: usize) -> Result<()> {
    check_range(src.start, src.end, buf.len())?;
    let len = src.end - src.start;
    let dest_end = dest
        .checked_add(len)
        .ok_or_else(|| TierMemError::out_of_bounds(dest, buf.len()))?;
    check_range(dest, dest_end, buf.len())?;

    let base = buf.as_mut_ptr();
    // SAFETY: both ranges were checked against `buf`
    unsafe { dispatch::memmove(base.add(dest), base.add(src.start), len) };
    Ok(())
}

/// Lexicographic comparison; a strict prefix orders first
pub fn compare_slices(a: &[u8], b: &[u8]) -> Ordering {
    let common = a.len().min(b.len());
    // SAFETY: both are valid for `common` reads
    let r = unsafe { dispatch::memcmp(a.as_ptr(), b.as_ptr(), common) };
    r.cmp(&0).then(a.len().cmp(&b.len()))
}

/// Set every byte of `dst` to `value`
pub fn fill_slice(dst: &mut [u8], value: u8) {
    // SAFETY: `dst` is valid for its own length
    unsafe { dispatch::memset(dst.as_mut_ptr(), i32::from(value), dst.len()) };
}

/// Index of the first `needle` in `haystack`
pub fn find_byte(haystack: &[u8], needle: u8) -> Option<usize> {
    // SAFETY: `haystack` is valid for its own length
    let p = unsafe { dispatch::memchr(haystack.as_ptr(), i32::from(needle), haystack.len()) };
    if p.is_null() {
        None
    } else {
        Some(p as usize - haystack.as_ptr() as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_slice() {
        let src: Vec<u8> = (0..300u32).map(|i| i as u8).collect();
        let mut dst = vec![0u8; 300];
        copy_slice(&mut dst, &src).unwrap();
        assert_eq!(dst, src);

        let err = copy_slice(&mut dst[..10], &src).unwrap_err();
        assert!(matches!(err, TierMemError::LengthMismatch { expected: 10, actual: 300 }));
        assert_eq!(err.category(), "length");

        copy_slice(&mut [], &[]).unwrap();
    }

    #[test]
    fn test_move_within_matches_copy_within() {
        for (src, dest) in [(0..100, 7), (7..107, 0), (10..20, 10), (0..0, 50), (50..120, 0)] {
            let mut ours: Vec<u8> = (0..150u32).map(|i| (i * 3) as u8).collect();
            let mut std = ours.clone();
            move_within(&mut ours, src.clone(), dest).unwrap();
            std.copy_within(src.clone(), dest);
            assert_eq!(ours, std, "{:?} -> {}", src, dest);
        }
    }

    #[test]
    fn test_move_within_rejects_bad_ranges() {
        let mut buf = [0u8; 16];
        assert!(move_within(&mut buf, 0..17, 0).is_err());
        assert!(move_within(&mut buf, 0..8, 9).is_err());
        #[allow(clippy::reversed_empty_ranges)]
        let backwards = 8..4;
        assert!(move_within(&mut buf, backwards, 0).is_err());
        assert!(move_within(&mut buf, 0..8, usize::MAX).is_err());
        assert!(move_within(&mut buf, 0..8, 8).is_ok());
    }

    #[test]
    fn test_compare_slices() {
        assert_eq!(compare_slices(b"", b""), Ordering::Equal);
        assert_eq!(compare_slices(b"abc", b"abc"), Ordering::Equal);
        assert_eq!(compare_slices(b"abc", b"abd"), Ordering::Less);
        assert_eq!(compare_slices(b"abc", b"ab"), Ordering::Greater);
        assert_eq!(compare_slices(b"ab", b"abc"), Ordering::Less);
        assert_eq!(compare_slices(b"b", b"abc"), Ordering::Greater);
        assert_eq!(compare_slices(&[0xff], &[0x01]), Ordering::Greater);
    }

    #[test]
    fn test_fill_and_find() {
        let mut buf = vec![1u8; 1000];
        fill_slice(&mut buf[100..900], 7);
        assert_eq!(find_byte(&buf, 7), Some(100));
        assert_eq!(find_byte(&buf[..100], 7), None);
        assert_eq!(find_byte(&buf[900..], 1), Some(0));
        assert_eq!(find_byte(&[], 0), None);
        fill_slice(&mut [], 3);
    }
}
