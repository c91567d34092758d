//! Cache geometry discovery
//!
//! Sizes come from the AMD extended leaves (0x80000006 for L2/L3 and
//! 0x8000001D for per-complex sharing) when the vendor matches, from the
//! deterministic cache parameters leaf otherwise, and from per-generation
//! defaults when neither yields a usable value.

use crate::dispatch::resolver::compiled_features;
use crate::dispatch::Generation;
use crate::system::FeatureSet;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

const KB: usize = 1024;
const MB: usize = 1024 * KB;

/// Per-core L1D and L2, and L3 per compute complex, in bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheGeometry {
    /// L1 data cache per core
    pub l1d_per_core: usize,
    /// L2 cache per core
    pub l2_per_core: usize,
    /// L3 share of one core complex
    pub l3_per_ccx: usize,
}

impl Default for CacheGeometry {
    fn default() -> Self {
        Self::for_generation(Generation::Zen3)
    }
}

impl CacheGeometry {
    /// Published sizes for a generation, used when probing fails
    pub fn for_generation(generation: Generation) -> Self {
        let (l2_per_core, l3_per_ccx) = match generation {
            Generation::Zen1 => (512 * KB, 8 * MB),
            Generation::Zen2 => (512 * KB, 16 * MB),
            Generation::Zen3 => (512 * KB, 32 * MB),
            Generation::Zen4 | Generation::Zen5 => (MB, 32 * MB),
            Generation::Unknown => (512 * KB, 32 * MB),
        };
        Self { l1d_per_core: 32 * KB, l2_per_core, l3_per_ccx }
    }

    /// Replace zero (unknown) fields with the generation defaults
    pub fn or_defaults(self, generation: Generation) -> Self {
        let fallback = Self::for_generation(generation);
        Self {
            l1d_per_core: nonzero_or(self.l1d_per_core, fallback.l1d_per_core),
            l2_per_core: nonzero_or(self.l2_per_core, fallback.l2_per_core),
            l3_per_ccx: nonzero_or(self.l3_per_ccx, fallback.l3_per_ccx),
        }
    }

    /// Probe the running CPU, filling gaps from the generation defaults
    pub fn detect(generation: Generation, vendor_match: bool) -> Self {
        let probed = probe_raw(vendor_match);
        let geometry = probed.or_defaults(generation);
        if probed != geometry {
            log::debug!(
                "cache probe incomplete ({:?}), using {:?} defaults for missing levels",
                probed,
                generation
            );
        }
        geometry
    }
}

#[inline]
fn nonzero_or(value: usize, fallback: usize) -> usize {
    if value == 0 {
        fallback
    } else {
        value
    }
}

/// L2 per core and L3 per CCD from leaf 0x80000006 `ecx`/`edx`.
///
/// A zero associativity nibble means the level is absent.
pub fn decode_l2_l3(ecx: u32, edx: u32) -> (usize, usize) {
    let l2 = if ecx & 0xf000 == 0 { 0 } else { ((ecx >> 6) & 0x3ff_fc00) as usize };
    let l3 = if edx & 0xf000 == 0 { 0 } else { ((edx & 0xfffc_0000) as usize) << 1 };
    (l2, l3)
}

/// Cache size from leaf 0x8000001D `ebx`/`ecx` (ways x partitions x line x sets)
pub fn decode_cache_size(ebx: u32, ecx: u32) -> usize {
    let ways = ((ebx >> 22) & 0x3ff) as usize + 1;
    let partitions = ((ebx >> 12) & 0x3ff) as usize + 1;
    let line = (ebx & 0xfff) as usize + 1;
    let sets = ecx as usize + 1;
    ways * partitions * line * sets
}

/// Logical processors sharing a cache, from leaf 0x8000001D `eax`
pub fn decode_sharing_threads(eax: u32) -> usize {
    ((eax >> 14) & 0xfff) as usize + 1
}

/// Scale the CCD-wide L3 down to one core complex
pub fn l3_share(l3_per_ccd: usize, threads_per_ccd: usize, threads_per_ccx: usize) -> usize {
    if threads_per_ccd == 0 {
        return l3_per_ccd;
    }
    l3_per_ccd / threads_per_ccd * threads_per_ccx.min(threads_per_ccd)
}

#[cfg(target_arch = "x86_64")]
fn probe_raw(vendor_match: bool) -> CacheGeometry {
    if vendor_match {
        probe_amd()
    } else {
        probe_deterministic()
    }
}

#[cfg(not(target_arch = "x86_64"))]
fn probe_raw(_vendor_match: bool) -> CacheGeometry {
    CacheGeometry { l1d_per_core: 0, l2_per_core: 0, l3_per_ccx: 0 }
}

#[cfg(target_arch = "x86_64")]
fn probe_amd() -> CacheGeometry {
    let mut geometry = CacheGeometry { l1d_per_core: 0, l2_per_core: 0, l3_per_ccx: 0 };
    let max_ext = raw_cpuid::cpuid!(0x8000_0000u32).eax;

    if max_ext >= 0x8000_0006 {
        let leaf = raw_cpuid::cpuid!(0x8000_0006u32);
        let (l2, l3_per_ccd) = decode_l2_l3(leaf.ecx, leaf.edx);
        geometry.l2_per_core = l2;

        let threads_per_ccd = ((raw_cpuid::cpuid!(1).ebx >> 16) & 0xff) as usize;
        let threads_per_ccx = if max_ext >= 0x8000_001D {
            decode_sharing_threads(raw_cpuid::cpuid!(0x8000_001Du32, 3).eax)
        } else {
            threads_per_ccd
        };
        geometry.l3_per_ccx = l3_share(l3_per_ccd, threads_per_ccd, threads_per_ccx);
    }

    if max_ext >= 0x8000_001D {
        // subleaf 0 is the L1 data cache
        let l1 = raw_cpuid::cpuid!(0x8000_001Du32, 0);
        if l1.eax & 0x1f == 1 {
            geometry.l1d_per_core = decode_cache_size(l1.ebx, l1.ecx);
        }
    }

    geometry
}

#[cfg(target_arch = "x86_64")]
fn probe_deterministic() -> CacheGeometry {
    use raw_cpuid::{CacheType, CpuId};

    let mut geometry = CacheGeometry { l1d_per_core: 0, l2_per_core: 0, l3_per_ccx: 0 };
    let Some(params) = CpuId::new().get_cache_parameters() else {
        return geometry;
    };

    for cache in params {
        let size = cache.associativity()
            * cache.physical_line_partitions()
            * cache.coherency_line_size()
            * cache.sets();
        match (cache.level(), cache.cache_type()) {
            (1, CacheType::Data) => geometry.l1d_per_core = size,
            (2, CacheType::Unified) => geometry.l2_per_core = size,
            (3, CacheType::Unified) => geometry.l3_per_ccx = size,
            _ => {}
        }
    }
    geometry
}

/// Generation whose defaults fill probe gaps: the one the resolver binds,
/// so features without a compiled engine do not count
fn default_generation(features: FeatureSet) -> Generation {
    crate::dispatch::detect_generation(compiled_features(features))
}

static CACHE_GEOMETRY: OnceLock<CacheGeometry> = OnceLock::new();

/// Get the process-wide cache geometry (probed once on first call)
pub fn cache_geometry() -> &'static CacheGeometry {
    CACHE_GEOMETRY.get_or_init(|| {
        let caps = super::cpu_capabilities();
        let generation = default_generation(caps.features);
        let geometry = CacheGeometry::detect(generation, caps.vendor_match);
        log::debug!("cache geometry: {:?}", geometry);
        geometry
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_defaults() {
        let zen1 = CacheGeometry::for_generation(Generation::Zen1);
        assert_eq!(zen1.l3_per_ccx, 8 * MB);
        assert_eq!(zen1.l2_per_core, 512 * KB);

        let zen2 = CacheGeometry::for_generation(Generation::Zen2);
        assert_eq!(zen2.l3_per_ccx, 16 * MB);

        let zen4 = CacheGeometry::for_generation(Generation::Zen4);
        assert_eq!(zen4.l2_per_core, MB);
        assert_eq!(zen4.l3_per_ccx, 32 * MB);

        assert_eq!(CacheGeometry::default().l1d_per_core, 32 * KB);
    }

    #[test]
    fn test_decode_l2_l3() {
        // 512 KiB L2, 8-way (assoc nibble 0x6), 64B lines
        let ecx = (512 << 16) | 0x6000 | 64;
        // 32 MiB L3 in 512 KiB units, assoc nibble set
        let edx = (64 << 18) | 0x9000 | 64;
        let (l2, l3) = decode_l2_l3(ecx, edx);
        assert_eq!(l2, 512 * KB);
        assert_eq!(l3, 32 * MB);
    }

    #[test]
    fn test_decode_l2_l3_absent_level() {
        let (l2, l3) = decode_l2_l3(512 << 16, 64 << 18);
        assert_eq!(l2, 0);
        assert_eq!(l3, 0);
    }

    #[test]
    fn test_decode_cache_size() {
        // 8 ways, 1 partition, 64B line, 64 sets = 32 KiB
        let ebx = (7 << 22) | 63;
        assert_eq!(decode_cache_size(ebx, 63), 32 * KB);
    }

    #[test]
    fn test_l3_share() {
        assert_eq!(l3_share(32 * MB, 16, 16), 32 * MB);
        assert_eq!(l3_share(32 * MB, 16, 8), 16 * MB);
        assert_eq!(l3_share(32 * MB, 0, 8), 32 * MB);
        assert_eq!(decode_sharing_threads(15 << 14), 16);
    }

    #[test]
    fn test_or_defaults_fills_only_missing() {
        let partial = CacheGeometry { l1d_per_core: 48 * KB, l2_per_core: 0, l3_per_ccx: 0 };
        let filled = partial.or_defaults(Generation::Zen4);
        assert_eq!(filled.l1d_per_core, 48 * KB);
        assert_eq!(filled.l2_per_core, MB);
        assert_eq!(filled.l3_per_ccx, 32 * MB);
    }

    #[test]
    fn test_detected_geometry_is_nonzero() {
        let g = cache_geometry();
        assert!(g.l1d_per_core > 0);
        assert!(g.l2_per_core > 0);
        assert!(g.l3_per_ccx > 0);
    }

    #[test]
    fn test_default_generation_matches_resolver() {
        let zen5 = FeatureSet::AVX2
            | FeatureSet::AVX512
            | FeatureSet::MOVDIRI
            | FeatureSet::VPCLMULQDQ
            | FeatureSet::ERMS;
        let resolution = crate::dispatch::resolve_with(
            zen5,
            true,
            CacheGeometry::default(),
            &crate::config::TunableConfig::default(),
        );
        assert_eq!(default_generation(zen5), resolution.generation);

        let expected = if cfg!(not(target_arch = "x86_64")) {
            Generation::Unknown
        } else if cfg!(tiermem_avx512) {
            Generation::Zen5
        } else {
            // Without the 512-bit engine this is a Zen3 part as far as
            // dispatch is concerned, and so are its cache defaults
            Generation::Zen3
        };
        assert_eq!(default_generation(zen5), expected);
    }
}
