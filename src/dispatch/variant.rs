//! Variant vocabulary: generations, per-primitive variant indices and the
//! features each one needs.

use crate::simd::RepWidth;
use crate::system::FeatureSet;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Microarchitecture generation inferred from feature bits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Generation {
    /// No rule matched
    Unknown,
    /// Zen (AVX2, RDSEED)
    Zen1,
    /// Zen 2 (adds RDPID)
    Zen2,
    /// Zen 3 (adds VPCLMULQDQ)
    Zen3,
    /// Zen 4 (AVX-512)
    Zen4,
    /// Zen 5 (AVX-512 with MOVDIRI)
    Zen5,
}

/// Ordered generation rules; first match wins, newest first
pub const GENERATION_RULES: &[(FeatureSet, Generation)] = &[
    (FeatureSet::AVX512.union(FeatureSet::MOVDIRI), Generation::Zen5),
    (FeatureSet::AVX512, Generation::Zen4),
    (FeatureSet::AVX2.union(FeatureSet::VPCLMULQDQ), Generation::Zen3),
    (FeatureSet::AVX2.union(FeatureSet::RDPID), Generation::Zen2),
    (FeatureSet::AVX2.union(FeatureSet::RDSEED), Generation::Zen1),
];

/// Apply [`GENERATION_RULES`] to a feature set.
///
/// The result only picks tuning; it says nothing about what is safe to run.
pub fn detect_generation(features: FeatureSet) -> Generation {
    GENERATION_RULES
        .iter()
        .find(|(required, _)| features.contains(*required))
        .map_or(Generation::Unknown, |&(_, generation)| generation)
}

/// Alignment and temporal policy of a tunable vector variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VectorPolicy {
    /// Unaligned loads and stores
    Unaligned,
    /// Aligned stores, aligned loads when source and destination are co-aligned
    Aligned,
    /// Loop aligned on the source
    AlignedLoad,
    /// Loop aligned on the destination
    AlignedStore,
    /// Streaming loads and stores
    NonTemporal,
    /// Streaming loads only
    NonTemporalLoad,
    /// Streaming stores only
    NonTemporalStore,
}

impl VectorPolicy {
    /// All policies, in table order
    pub const ALL: [VectorPolicy; 7] = [
        VectorPolicy::Unaligned,
        VectorPolicy::Aligned,
        VectorPolicy::AlignedLoad,
        VectorPolicy::AlignedStore,
        VectorPolicy::NonTemporal,
        VectorPolicy::NonTemporalLoad,
        VectorPolicy::NonTemporalStore,
    ];
}

/// Concrete implementation bound to one primitive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariantIndex {
    /// Baseline engine (SSE2 on x86_64, portable elsewhere)
    System,
    /// Baseline engine driven by user thresholds
    Threshold,
    /// 256-bit engine with an explicit policy
    Avx2(VectorPolicy),
    /// 512-bit engine with an explicit policy
    Avx512(VectorPolicy),
    /// Repeated string instruction of the given element width
    Erms(RepWidth),
    /// Generation-tuned engine
    Arch(Generation),
}

impl VariantIndex {
    /// Features the variant's machine code needs
    pub fn required_features(self) -> FeatureSet {
        match self {
            VariantIndex::System | VariantIndex::Threshold => FeatureSet::empty(),
            VariantIndex::Avx2(_) => FeatureSet::AVX2,
            VariantIndex::Avx512(_) => FeatureSet::AVX512,
            VariantIndex::Erms(_) => FeatureSet::ERMS,
            VariantIndex::Arch(generation) => match generation {
                Generation::Unknown => FeatureSet::empty(),
                Generation::Zen1 | Generation::Zen2 | Generation::Zen3 => FeatureSet::AVX2,
                Generation::Zen4 | Generation::Zen5 => FeatureSet::AVX512,
            },
        }
    }

    /// Whether every required feature is in `features`
    pub fn is_supported_by(self, features: FeatureSet) -> bool {
        features.contains(self.required_features())
    }
}

impl fmt::Display for VariantIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VariantIndex::System => write!(f, "system"),
            VariantIndex::Threshold => write!(f, "threshold"),
            VariantIndex::Avx2(p) => write!(f, "avx2-{:?}", p),
            VariantIndex::Avx512(p) => write!(f, "avx512-{:?}", p),
            VariantIndex::Erms(w) => write!(f, "erms-{:?}", w),
            VariantIndex::Arch(g) => write!(f, "{:?}", g),
        }
    }
}

/// Every primitive the dispatcher binds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum Primitive {
    Memcpy,
    Mempcpy,
    Memmove,
    Memset,
    Memcmp,
    Memchr,
    Strlen,
    Strcpy,
    Strncpy,
    Strcat,
    Strncat,
    Strcmp,
    Strncmp,
    Strchr,
    Strstr,
}

impl Primitive {
    /// All primitives, in table order
    pub const ALL: [Primitive; 15] = [
        Primitive::Memcpy,
        Primitive::Mempcpy,
        Primitive::Memmove,
        Primitive::Memset,
        Primitive::Memcmp,
        Primitive::Memchr,
        Primitive::Strlen,
        Primitive::Strcpy,
        Primitive::Strncpy,
        Primitive::Strcat,
        Primitive::Strncat,
        Primitive::Strcmp,
        Primitive::Strncmp,
        Primitive::Strchr,
        Primitive::Strstr,
    ];

    /// Position in [`Primitive::ALL`]
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Whether the user operation override applies with its full policy.
    ///
    /// Searching primitives only take the ISA width of an override.
    pub const fn takes_policy(self) -> bool {
        matches!(
            self,
            Primitive::Memcpy | Primitive::Mempcpy | Primitive::Memmove | Primitive::Memset | Primitive::Memcmp
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_rules_newest_first() {
        let zen5 = FeatureSet::AVX2 | FeatureSet::AVX512 | FeatureSet::MOVDIRI | FeatureSet::VPCLMULQDQ;
        assert_eq!(detect_generation(zen5), Generation::Zen5);
        assert_eq!(detect_generation(FeatureSet::AVX2 | FeatureSet::AVX512), Generation::Zen4);
        assert_eq!(
            detect_generation(FeatureSet::AVX2 | FeatureSet::VPCLMULQDQ | FeatureSet::RDPID | FeatureSet::RDSEED),
            Generation::Zen3
        );
        assert_eq!(detect_generation(FeatureSet::AVX2 | FeatureSet::RDPID | FeatureSet::RDSEED), Generation::Zen2);
        assert_eq!(detect_generation(FeatureSet::AVX2 | FeatureSet::RDSEED), Generation::Zen1);
    }

    #[test]
    fn test_generation_needs_vector_isa() {
        assert_eq!(detect_generation(FeatureSet::empty()), Generation::Unknown);
        assert_eq!(detect_generation(FeatureSet::RDSEED | FeatureSet::RDPID), Generation::Unknown);
        assert_eq!(detect_generation(FeatureSet::AVX2), Generation::Unknown);
        // MOVDIRI without AVX-512 is not a Zen5
        assert_eq!(detect_generation(FeatureSet::MOVDIRI | FeatureSet::AVX2 | FeatureSet::RDSEED), Generation::Zen1);
    }

    #[test]
    fn test_required_features() {
        assert!(VariantIndex::System.required_features().is_empty());
        assert!(VariantIndex::Threshold.required_features().is_empty());
        assert_eq!(VariantIndex::Avx2(VectorPolicy::Aligned).required_features(), FeatureSet::AVX2);
        assert_eq!(VariantIndex::Avx512(VectorPolicy::NonTemporal).required_features(), FeatureSet::AVX512);
        assert_eq!(VariantIndex::Erms(RepWidth::Qword).required_features(), FeatureSet::ERMS);
        assert_eq!(VariantIndex::Arch(Generation::Zen3).required_features(), FeatureSet::AVX2);
        assert_eq!(VariantIndex::Arch(Generation::Zen5).required_features(), FeatureSet::AVX512);
    }

    #[test]
    fn test_generation_implies_required_features() {
        // Any set that selects a generation also runs that generation's code
        for &(required, generation) in GENERATION_RULES {
            assert!(VariantIndex::Arch(generation).is_supported_by(required));
        }
    }

    #[test]
    fn test_primitive_index_matches_table_order() {
        for (i, p) in Primitive::ALL.iter().enumerate() {
            assert_eq!(p.index(), i);
        }
        assert!(Primitive::Memcpy.takes_policy());
        assert!(!Primitive::Strlen.takes_policy());
        assert!(!Primitive::Memchr.takes_policy());
    }
}
