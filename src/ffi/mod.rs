//! C ABI exports
//!
//! Enabled with the `ffi` feature. Symbols carry a `tiermem_` prefix: a
//! cdylib exporting the bare libc names would have its own compiler-emitted
//! `memcpy` calls resolve back into itself.

pub mod c_api;

pub use c_api::*;

/// Status codes returned by the non-primitive exports
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CResult {
    /// Call succeeded
    Success = 0,
    /// An argument was out of range
    InvalidInput = -1,
}
