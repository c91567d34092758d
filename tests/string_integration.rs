//! Integration tests for the dispatched string primitives
//!
//! Buffers are page aligned and strings are planted so the terminator sits
//! in the last bytes of a page, which puts every vector read next to a page
//! edge.

use std::alloc::{alloc_zeroed, dealloc, Layout};
use tiermem::{strcat, strchr, strcmp, strcpy, strlen, strncat, strncmp, strncpy, strstr};

const PAGE: usize = 4096;

/// Page-aligned zeroed buffer freed on drop
struct PageBuf {
    ptr: *mut u8,
    layout: Layout,
}

impl PageBuf {
    fn new(pages: usize) -> Self {
        let layout = Layout::from_size_align(pages * PAGE, PAGE).unwrap();
        let ptr = unsafe { alloc_zeroed(layout) };
        assert!(!ptr.is_null());
        Self { ptr, layout }
    }

    /// Write `text` plus a terminator so the terminator lands at `end`
    fn plant(&self, text: &[u8], end: usize) -> *mut u8 {
        assert!(end >= text.len() && end < self.layout.size());
        unsafe {
            let start = self.ptr.add(end - text.len());
            std::ptr::copy_nonoverlapping(text.as_ptr(), start, text.len());
            *start.add(text.len()) = 0;
            start
        }
    }
}

impl Drop for PageBuf {
    fn drop(&mut self) {
        unsafe { dealloc(self.ptr, self.layout) };
    }
}

fn text(len: usize) -> Vec<u8> {
    (0..len).map(|i| b'a' + (i % 26) as u8).collect()
}

#[test]
fn test_strlen_at_page_end() {
    let buf = PageBuf::new(2);
    for len in [0usize, 1, 15, 16, 17, 31, 32, 63, 64, 65, 200, 1000] {
        for end in [PAGE - 1, PAGE - 2, PAGE - 33, 2 * PAGE - 1] {
            let s = buf.plant(&text(len), end);
            assert_eq!(unsafe { strlen(s) }, len, "len={} end={}", len, end);
        }
    }
}

#[test]
fn test_strcmp_family_across_pages() {
    let buf = PageBuf::new(3);
    let body = text(150);
    for end in [PAGE + 10, PAGE + 70, 2 * PAGE - 1] {
        let a = buf.plant(&body, end);
        let other = if end < 2 * PAGE { 3 * PAGE - 1 } else { PAGE + 400 };
        let b = buf.plant(&body, other);
        unsafe {
            assert_eq!(strcmp(a, b), 0);
            assert_eq!(strncmp(a, b, 1 << 20), 0);
            *b.add(120) = b'~';
            assert!(strcmp(a, b) < 0);
            assert!(strcmp(b, a) > 0);
            assert_eq!(strncmp(a, b, 120), 0);
            assert!(strncmp(a, b, 121) < 0);
        }
    }
}

#[test]
fn test_strcmp_prefix_orders_first() {
    unsafe {
        assert!(strcmp(b"abc\0".as_ptr(), b"abcd\0".as_ptr()) < 0);
        assert!(strcmp(b"abcd\0".as_ptr(), b"abc\0".as_ptr()) > 0);
        assert_eq!(strcmp(b"\0".as_ptr(), b"\0".as_ptr()), 0);
        assert!(strcmp(b"\xff\0".as_ptr(), b"\x01\0".as_ptr()) > 0);
    }
}

#[test]
fn test_copy_family() {
    for len in [0usize, 5, 31, 32, 33, 100, 5000] {
        let mut src = text(len);
        src.push(0);
        let mut dst = vec![0xEEu8; 2 * len + 64];
        unsafe {
            assert_eq!(strcpy(dst.as_mut_ptr(), src.as_ptr()), dst.as_mut_ptr());
            assert_eq!(&dst[..=len], &src[..]);
            assert_eq!(dst[len + 1], 0xEE);

            strcat(dst.as_mut_ptr(), src.as_ptr());
            assert_eq!(strlen(dst.as_ptr()), 2 * len);
            assert_eq!(&dst[len..=2 * len], &src[..]);
        }
    }
}

#[test]
fn test_strncpy_pads_and_truncates() {
    let mut dst = [0xEEu8; 48];
    unsafe {
        strncpy(dst.as_mut_ptr(), b"pad me\0".as_ptr(), 40);
        assert_eq!(&dst[..6], b"pad me");
        assert!(dst[6..40].iter().all(|&b| b == 0));
        assert!(dst[40..].iter().all(|&b| b == 0xEE));

        strncpy(dst.as_mut_ptr(), b"truncated\0".as_ptr(), 5);
        assert_eq!(&dst[..5], b"trunc");
        assert_eq!(dst[5], b'e');

        strncpy(dst.as_mut_ptr(), b"x\0".as_ptr(), 0);
        assert_eq!(dst[0], b't');
    }
}

#[test]
fn test_strncat_terminates() {
    let mut dst = [0xEEu8; 32];
    dst[0] = 0;
    unsafe {
        strncat(dst.as_mut_ptr(), b"abcdef\0".as_ptr(), 3);
        assert_eq!(&dst[..4], b"abc\0");
        strncat(dst.as_mut_ptr(), b"de\0".as_ptr(), 10);
        assert_eq!(&dst[..6], b"abcde\0");
        assert_eq!(dst[6], 0xEE);
    }
}

#[test]
fn test_strchr_and_strstr() {
    let buf = PageBuf::new(2);
    let mut body = text(100);
    body.extend_from_slice(b"needle in a haystack");
    let s = buf.plant(&body, PAGE - 1).cast_const();
    unsafe {
        assert_eq!(strchr(s, i32::from(b'n')), s.add(13));
        assert_eq!(strchr(s, 0), s.add(body.len()));
        assert!(strchr(s, i32::from(b'#')).is_null());
        assert_eq!(strstr(s, b"needle\0".as_ptr()), s.add(100));
        assert_eq!(strstr(s, b"haystack\0".as_ptr()), s.add(112));
        assert!(strstr(s, b"haystacks\0".as_ptr()).is_null());
        assert_eq!(strstr(s, b"\0".as_ptr()), s);
    }
}
