//! Function-pointer table, one cell per primitive

use super::resolver::Resolution;
use super::variant::Primitive;
use crate::config::ThresholdSet;
use crate::memory::engines::memory_fns;
use crate::string::engines::string_fns;

/// `memcpy`, `mempcpy` and `memmove`
pub type CopyFn = unsafe fn(&ThresholdSet, *mut u8, *const u8, usize) -> *mut u8;
/// `memset`
pub type SetFn = unsafe fn(&ThresholdSet, *mut u8, i32, usize) -> *mut u8;
/// `memcmp` and `strncmp`
pub type CompareFn = unsafe fn(*const u8, *const u8, usize) -> i32;
/// `memchr`
pub type FindFn = unsafe fn(*const u8, i32, usize) -> *const u8;
/// `strlen`
pub type StrlenFn = unsafe fn(*const u8) -> usize;
/// `strcpy` and `strcat`
pub type StrcpyFn = unsafe fn(&ThresholdSet, *mut u8, *const u8) -> *mut u8;
/// `strncpy` and `strncat`
pub type StrncpyFn = unsafe fn(&ThresholdSet, *mut u8, *const u8, usize) -> *mut u8;
/// `strcmp`
pub type StrcmpFn = unsafe fn(*const u8, *const u8) -> i32;
/// `strchr`
pub type StrchrFn = unsafe fn(*const u8, i32) -> *const u8;
/// `strstr`
pub type StrstrFn = unsafe fn(*const u8, *const u8) -> *const u8;

/// Entry points of one memory engine
#[derive(Clone, Copy)]
pub(crate) struct MemoryFns {
    pub memcpy: CopyFn,
    pub mempcpy: CopyFn,
    pub memmove: CopyFn,
    pub memset: SetFn,
    pub memcmp: CompareFn,
    pub memchr: FindFn,
}

/// Entry points of one string engine
#[derive(Clone, Copy)]
pub(crate) struct StringFns {
    pub strlen: StrlenFn,
    pub strcpy: StrcpyFn,
    pub strncpy: StrncpyFn,
    pub strcat: StrcpyFn,
    pub strncat: StrncpyFn,
    pub strcmp: StrcmpFn,
    pub strncmp: CompareFn,
    pub strchr: StrchrFn,
    pub strstr: StrstrFn,
}

/// Bound entry points.
///
/// Built once from a [`Resolution`]; each cell comes from the engine of the
/// variant resolved for that primitive alone, so a user override on `memcpy`
/// does not drag `strlen` along.
#[derive(Clone, Copy)]
pub(crate) struct DispatchTable {
    pub memcpy: CopyFn,
    pub mempcpy: CopyFn,
    pub memmove: CopyFn,
    pub memset: SetFn,
    pub memcmp: CompareFn,
    pub memchr: FindFn,
    pub strlen: StrlenFn,
    pub strcpy: StrcpyFn,
    pub strncpy: StrncpyFn,
    pub strcat: StrcpyFn,
    pub strncat: StrncpyFn,
    pub strcmp: StrcmpFn,
    pub strncmp: CompareFn,
    pub strchr: StrchrFn,
    pub strstr: StrstrFn,
}

impl DispatchTable {
    pub(crate) fn from_resolution(resolution: &Resolution) -> Self {
        let mem = |p: Primitive| memory_fns(resolution.variant(p));
        let st = |p: Primitive| string_fns(resolution.variant(p));

        Self {
            memcpy: mem(Primitive::Memcpy).memcpy,
            mempcpy: mem(Primitive::Mempcpy).mempcpy,
            memmove: mem(Primitive::Memmove).memmove,
            memset: mem(Primitive::Memset).memset,
            memcmp: mem(Primitive::Memcmp).memcmp,
            memchr: mem(Primitive::Memchr).memchr,
            strlen: st(Primitive::Strlen).strlen,
            strcpy: st(Primitive::Strcpy).strcpy,
            strncpy: st(Primitive::Strncpy).strncpy,
            strcat: st(Primitive::Strcat).strcat,
            strncat: st(Primitive::Strncat).strncat,
            strcmp: st(Primitive::Strcmp).strcmp,
            strncmp: st(Primitive::Strncmp).strncmp,
            strchr: st(Primitive::Strchr).strchr,
            strstr: st(Primitive::Strstr).strstr,
        }
    }
}
