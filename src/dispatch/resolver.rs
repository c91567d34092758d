//! One-shot variant resolution
//!
//! [`resolve_with`] is pure: it takes the probed features and geometry plus the
//! user tunables and returns a [`Resolution`]. The process-wide dispatcher
//! calls it once with the live probe; tests call it with forged inputs.

use super::variant::{detect_generation, Generation, Primitive, VariantIndex, VectorPolicy};
use crate::config::{compute_thresholds, Alignment, IsaFamily, ThresholdSet, TunableConfig, UserOperation};
use crate::simd::RepWidth;
use crate::system::{CacheGeometry, FeatureSet};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a piece of the resolution came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    /// Derived from the probe
    System,
    /// Taken from a user tunable
    User,
}

/// Outcome of variant resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Features usable by this build on this CPU
    pub features: FeatureSet,
    /// Whether the vendor is the one the tuned variants target
    pub vendor_match: bool,
    /// Generation inferred from `features`
    pub generation: Generation,
    /// Cache geometry the thresholds were derived from
    pub geometry: CacheGeometry,
    /// Thresholds handed to every sized primitive
    pub thresholds: ThresholdSet,
    /// Origin of `thresholds`
    pub threshold_source: ConfigSource,
    /// Origin of the per-primitive variants
    pub operation_source: ConfigSource,
    variants: [VariantIndex; Primitive::ALL.len()],
}

impl Resolution {
    /// Variant bound to `primitive`
    #[inline]
    pub fn variant(&self, primitive: Primitive) -> VariantIndex {
        self.variants[primitive.index()]
    }

    /// `(primitive, variant)` pairs in table order
    pub fn variants(&self) -> impl Iterator<Item = (Primitive, VariantIndex)> + '_ {
        Primitive::ALL.iter().map(move |&p| (p, self.variant(p)))
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "generation={:?} vendor_match={} thresholds={} operation={}",
            self.generation,
            self.vendor_match,
            source_name(self.threshold_source),
            source_name(self.operation_source)
        )?;
        for (p, v) in self.variants() {
            write!(f, " {:?}={}", p, v)?;
        }
        Ok(())
    }
}

fn source_name(source: ConfigSource) -> &'static str {
    match source {
        ConfigSource::System => "system",
        ConfigSource::User => "user",
    }
}

/// Drop features whose engines were not compiled into this build
pub(crate) fn compiled_features(features: FeatureSet) -> FeatureSet {
    if cfg!(not(target_arch = "x86_64")) {
        return FeatureSet::empty();
    }
    if cfg!(tiermem_avx512) {
        features
    } else {
        features.difference(FeatureSet::AVX512)
    }
}

/// Map an alignment request onto a tunable vector policy of width `width`
fn vector_policy(op: &UserOperation, width: usize) -> VectorPolicy {
    let (src, dst) = (op.src_align, op.dst_align);
    match (src.is_non_temporal(), dst.is_non_temporal()) {
        (true, true) => return VectorPolicy::NonTemporal,
        (false, true) => return VectorPolicy::NonTemporalStore,
        (true, false) => return VectorPolicy::NonTemporalLoad,
        (false, false) => {}
    }
    match (src.bytes() >= width, dst.bytes() >= width) {
        (true, true) => VectorPolicy::Aligned,
        (true, false) => VectorPolicy::AlignedLoad,
        (false, true) => VectorPolicy::AlignedStore,
        (false, false) => VectorPolicy::Unaligned,
    }
}

fn rep_width(min_alignment: usize) -> RepWidth {
    match min_alignment {
        a if a >= Alignment::Qword.bytes() => RepWidth::Qword,
        a if a >= Alignment::Dword.bytes() => RepWidth::Dword,
        a if a >= Alignment::Word.bytes() => RepWidth::Word,
        _ => RepWidth::Byte,
    }
}

/// The variant a user operation asks for, before degradation
fn requested_variant(op: &UserOperation) -> VariantIndex {
    match op.family {
        IsaFamily::Avx512 => VariantIndex::Avx512(vector_policy(op, 64)),
        IsaFamily::Avx2 => VariantIndex::Avx2(vector_policy(op, 32)),
        IsaFamily::Erms => VariantIndex::Erms(rep_width(op.min_alignment())),
    }
}

/// Step a variant down until `features` can run it.
///
/// AVX-512 falls to AVX2 with the same policy; everything else falls to the
/// baseline engine.
fn degrade(mut variant: VariantIndex, features: FeatureSet) -> VariantIndex {
    while !variant.is_supported_by(features) {
        let next = match variant {
            VariantIndex::Avx512(policy) => VariantIndex::Avx2(policy),
            _ => VariantIndex::System,
        };
        log::warn!("{} is not supported on this CPU, falling back to {}", variant, next);
        variant = next;
    }
    variant
}

/// Narrow a user variant to what a primitive can take.
///
/// Search and string primitives only have one engine per vector width, and
/// there is no repeated-instruction search.
fn fit_to_primitive(variant: VariantIndex, primitive: Primitive) -> VariantIndex {
    if primitive.takes_policy() {
        return variant;
    }
    match variant {
        VariantIndex::Avx2(_) => VariantIndex::Avx2(VectorPolicy::Unaligned),
        VariantIndex::Avx512(_) => VariantIndex::Avx512(VectorPolicy::Unaligned),
        VariantIndex::Erms(_) => VariantIndex::System,
        other => other,
    }
}

/// Resolve every primitive for the given probe results and tunables.
///
/// Never fails: an override the CPU cannot honour degrades to a variant it
/// can run, and the result only ever binds variants whose required features
/// are in the (build-masked) feature set.
pub fn resolve_with(
    features: FeatureSet,
    vendor_match: bool,
    geometry: CacheGeometry,
    tunables: &TunableConfig,
) -> Resolution {
    let features = compiled_features(features);
    let generation = detect_generation(features);
    let computed = compute_thresholds(&geometry, features);

    if !vendor_match {
        if !tunables.is_empty() {
            log::warn!("Tunables ignored: CPU vendor is not the tuned target");
        }
        let resolution = Resolution {
            features,
            vendor_match,
            generation,
            geometry,
            thresholds: computed,
            threshold_source: ConfigSource::System,
            operation_source: ConfigSource::System,
            variants: [VariantIndex::System; Primitive::ALL.len()],
        };
        log::debug!("Resolved dispatch: {}", resolution);
        return resolution;
    }

    let (thresholds, threshold_source) = match &tunables.threshold {
        Some(user) => (computed.with_user(user), ConfigSource::User),
        None => (computed, ConfigSource::System),
    };

    let base = if generation == Generation::Unknown {
        VariantIndex::System
    } else {
        VariantIndex::Arch(generation)
    };
    let base = if base == VariantIndex::System && threshold_source == ConfigSource::User {
        VariantIndex::Threshold
    } else {
        base
    };

    let mut variants = [base; Primitive::ALL.len()];
    let mut operation_source = ConfigSource::System;
    if let Some(op) = &tunables.operation {
        let requested = degrade(requested_variant(op), features);
        for primitive in Primitive::ALL {
            variants[primitive.index()] = fit_to_primitive(requested, primitive);
        }
        operation_source = ConfigSource::User;
    }

    let resolution = Resolution {
        features,
        vendor_match,
        generation,
        geometry,
        thresholds,
        threshold_source,
        operation_source,
        variants,
    };
    log::debug!("Resolved dispatch: {}", resolution);
    resolution
}
