//! # Hardware Discovery
//!
//! Runtime facts the dispatcher needs about the machine it runs on:
//!
//! - **CPU features**: vendor string and the leaf 7 feature bits
//!   ([`cpu_features`])
//! - **Cache geometry**: L1D and L2 per core, L3 per core complex
//!   ([`cache_info`])
//!
//! Both are probed once per process and cached.

pub mod cache_info;
pub mod cpu_features;

pub use cache_info::{cache_geometry, CacheGeometry};
pub use cpu_features::{
    cpu_capabilities, decode_leaf7, probe, CpuCapabilities, FeatureSet, TARGET_VENDOR,
};
