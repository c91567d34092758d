//! NUL-terminated string primitives
//!
//! Generic over [`Vector`](crate::simd::Vector) like the memory engines. Every
//! vector read is either from a `W`-aligned address or checked not to cross a
//! page boundary, so scanning never faults past the terminator.
//!
//! The entry points for each engine are instantiated in `engines` and bound
//! by the dispatcher; the public functions live in [`crate::dispatch`].

pub(crate) mod compare;
pub(crate) mod copy;
pub(crate) mod engines;
pub(crate) mod length;
pub(crate) mod search;
