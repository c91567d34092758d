//! # tiermem: CPU-dispatched memory and string primitives
//!
//! Drop-in replacements for `memcpy`, `memmove`, `memset`, `memcmp`, `memchr`
//! and the NUL-terminated string functions. The CPU is probed once; each
//! primitive is then bound to the engine that suits it, and every call picks a
//! size tier (head/tail vectors, aligned loop, `rep movs`, streaming stores)
//! from thresholds derived from the cache geometry.
//!
//! ## Key Features
//!
//! - **Generic engines**: one set of kernels over 8/16/32/64-byte vectors
//! - **Generation tuning**: Zen 1 through Zen 5 profiles, chosen by feature rules
//! - **Tunables**: `TIERMEM_OPERATION` and `TIERMEM_THRESHOLD` override the choice
//! - **Safe wrappers**: slice functions that check lengths and ranges
//! - **C ABI**: `tiermem_*` exports behind the `ffi` feature
//!
//! ## Quick Start
//!
//! ```rust
//! use tiermem::memory::{compare_slices, copy_slice, find_byte, move_within};
//!
//! let mut buf = *b"hello, world";
//! copy_slice(&mut buf[..5], b"HELLO")?;
//! move_within(&mut buf, 7..12, 0)?;
//! assert_eq!(&buf[..5], b"world");
//! assert_eq!(find_byte(&buf, b','), Some(5));
//! assert!(compare_slices(b"abc", b"abd").is_lt());
//!
//! // The raw primitives carry the C contracts
//! let s = b"tiered\0";
//! assert_eq!(unsafe { tiermem::strlen(s.as_ptr()) }, 6);
//! # Ok::<(), tiermem::TierMemError>(())
//! ```

#![warn(missing_docs)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod config;
pub mod dispatch;
pub mod error;
pub mod memory;
pub mod simd;
pub mod string;
pub mod system;

#[cfg(feature = "ffi")]
pub mod ffi;

pub use config::{Config, ThresholdSet, TunableConfig};
pub use dispatch::{
    memchr, memcmp, memcpy, memmove, mempcpy, memset, resolved, strcat, strchr, strcmp, strcpy, strlen, strncat,
    strncmp, strncpy, strstr, Generation, Primitive, Resolution, VariantIndex,
};
pub use error::{Result, TierMemError};
pub use memory::{compare_slices, copy_slice, fill_slice, find_byte, move_within};
pub use system::{CacheGeometry, FeatureSet};

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Resolve the dispatch table now rather than on the first call.
///
/// Safe to call any number of times; only the first does any work.
pub fn init() {
    log::debug!("Initializing tiermem v{}", VERSION);
    let resolution = dispatch::resolved();
    log::debug!("tiermem bound memcpy to {}", resolution.variant(Primitive::Memcpy));
}
