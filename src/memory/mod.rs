//! Size-tiered memory primitives
//!
//! The kernels here are generic over [`Vector`](crate::simd::Vector) and a
//! per-engine `Profile`; `engines` instantiates them once per vector width and
//! tuning, and [`crate::dispatch`] binds one instance per primitive.
//!
//! Copy sizes fall into tiers measured in vector widths `W`:
//!
//! - `n <= 8W`: overlapping head and tail vectors, no loop
//! - mid sizes: a four-vector loop aligned per the engine's policy
//! - the `rep movs` window of the threshold set, when the CPU has ERMS
//! - `n >= nt_start`: streaming stores followed by a store fence
//!
//! Most callers want the safe wrappers re-exported here.

pub(crate) mod compare;
pub(crate) mod copy;
pub(crate) mod engines;
pub(crate) mod overlap;
pub(crate) mod search;
pub(crate) mod set;
pub mod slice_ops;

pub use overlap::Overlap;
pub use slice_ops::{compare_slices, copy_slice, fill_slice, find_byte, move_within};
