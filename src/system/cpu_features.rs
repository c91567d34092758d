//! # CPU Feature Detection
//!
//! Reads the vendor string (leaf 0) and the structured extended feature leaf
//! (leaf 7) once per process and caches the decoded [`FeatureSet`].
//!
//! Decoding is split from reading: [`decode_leaf7`] is a pure function over
//! raw register values so the bit layout can be tested without the hardware.
//! Vector flags are additionally gated on the OS having enabled the matching
//! register state, so a set AVX2 bit under a kernel without XSAVE support
//! reads as absent.

use bitflags::bitflags;
use std::fmt;
use std::sync::OnceLock;

/// Vendor string the tuned variants target.
pub const TARGET_VENDOR: &str = "AuthenticAMD";

bitflags! {
    /// ISA extensions relevant to variant selection.
    ///
    /// `AVX512` is only set when the foundation, byte/word and vector-length
    /// subsets are all present; the 512-bit engine needs all three.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FeatureSet: u32 {
        /// 256-bit integer vectors
        const AVX2 = 1 << 0;
        /// AVX-512 F + BW + VL
        const AVX512 = 1 << 1;
        /// Enhanced `rep movsb` / `rep stosb`
        const ERMS = 1 << 2;
        /// Fast short `rep mov`
        const FSRM = 1 << 3;
        /// Direct store (`movdiri`)
        const MOVDIRI = 1 << 4;
        /// Vector carry-less multiply
        const VPCLMULQDQ = 1 << 5;
        /// `rdpid`
        const RDPID = 1 << 6;
        /// `rdseed`
        const RDSEED = 1 << 7;
    }
}

// Leaf 7, subleaf 0 register masks
const LEAF7_EBX_AVX2: u32 = 1 << 5;
const LEAF7_EBX_ERMS: u32 = 1 << 9;
const LEAF7_EBX_AVX512F: u32 = 1 << 16;
const LEAF7_EBX_RDSEED: u32 = 1 << 18;
const LEAF7_EBX_AVX512BW: u32 = 1 << 30;
const LEAF7_EBX_AVX512VL: u32 = 1 << 31;
const LEAF7_ECX_VPCLMULQDQ: u32 = 1 << 10;
const LEAF7_ECX_RDPID: u32 = 1 << 22;
const LEAF7_ECX_MOVDIRI: u32 = 1 << 27;
const LEAF7_EDX_FSRM: u32 = 1 << 4;

/// Decode leaf 7 (subleaf 0) register values into a [`FeatureSet`].
///
/// This reports what the CPU advertises; it does not consult OS state.
pub fn decode_leaf7(ebx: u32, ecx: u32, edx: u32) -> FeatureSet {
    let mut set = FeatureSet::empty();
    let avx512_mask = LEAF7_EBX_AVX512F | LEAF7_EBX_AVX512BW | LEAF7_EBX_AVX512VL;

    set.set(FeatureSet::AVX2, ebx & LEAF7_EBX_AVX2 != 0);
    set.set(FeatureSet::AVX512, ebx & avx512_mask == avx512_mask);
    set.set(FeatureSet::ERMS, ebx & LEAF7_EBX_ERMS != 0);
    set.set(FeatureSet::RDSEED, ebx & LEAF7_EBX_RDSEED != 0);
    set.set(FeatureSet::VPCLMULQDQ, ecx & LEAF7_ECX_VPCLMULQDQ != 0);
    set.set(FeatureSet::RDPID, ecx & LEAF7_ECX_RDPID != 0);
    set.set(FeatureSet::MOVDIRI, ecx & LEAF7_ECX_MOVDIRI != 0);
    set.set(FeatureSet::FSRM, edx & LEAF7_EDX_FSRM != 0);
    set
}

/// Probed CPU identity and feature set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CpuCapabilities {
    /// Decoded feature flags, already gated on OS register-state support
    pub features: FeatureSet,
    /// Raw vendor string from leaf 0 ("unknown" off x86)
    pub vendor: String,
    /// Whether `vendor` matches [`TARGET_VENDOR`]
    pub vendor_match: bool,
}

impl CpuCapabilities {
    /// Read the hardware. Absent leaves and flags read as false.
    pub fn detect() -> Self {
        #[cfg(target_arch = "x86_64")]
        {
            Self::detect_x86()
        }

        #[cfg(not(target_arch = "x86_64"))]
        {
            Self {
                features: FeatureSet::empty(),
                vendor: "unknown".to_string(),
                vendor_match: false,
            }
        }
    }

    #[cfg(target_arch = "x86_64")]
    fn detect_x86() -> Self {
        let cpuid = raw_cpuid::CpuId::new();
        let vendor = cpuid
            .get_vendor_info()
            .map(|v| v.as_str().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let max_leaf = raw_cpuid::cpuid!(0).eax;
        let advertised = if max_leaf >= 7 {
            let leaf7 = raw_cpuid::cpuid!(7, 0);
            decode_leaf7(leaf7.ebx, leaf7.ecx, leaf7.edx)
        } else {
            FeatureSet::empty()
        };

        let mut features = advertised;
        if !std::is_x86_feature_detected!("avx2") {
            features.remove(FeatureSet::AVX2);
        }
        if !(std::is_x86_feature_detected!("avx512f")
            && std::is_x86_feature_detected!("avx512bw")
            && std::is_x86_feature_detected!("avx512vl"))
        {
            features.remove(FeatureSet::AVX512);
        }
        if advertised != features {
            log::debug!(
                "OS register state masks advertised features {:?} down to {:?}",
                advertised,
                features
            );
        }

        let vendor_match = vendor == TARGET_VENDOR;
        Self { features, vendor, vendor_match }
    }
}

impl fmt::Display for CpuCapabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "vendor={} (target match: {}) features=", self.vendor, self.vendor_match)?;
        if self.features.is_empty() {
            return write!(f, "none");
        }
        let names: Vec<&str> = self.features.iter_names().map(|(name, _)| name).collect();
        write!(f, "{}", names.join("|"))
    }
}

static CPU_CAPABILITIES: OnceLock<CpuCapabilities> = OnceLock::new();

/// Get the process-wide capabilities (probed once on first call)
pub fn cpu_capabilities() -> &'static CpuCapabilities {
    CPU_CAPABILITIES.get_or_init(|| {
        let caps = CpuCapabilities::detect();
        log::debug!("CPU capabilities: {}", caps);
        caps
    })
}

/// `(FeatureSet, vendor_match)` for the running CPU.
///
/// Features are read once and cached for the process lifetime; later
/// hardware changes (migration, hotplug) are not observed.
pub fn probe() -> (FeatureSet, bool) {
    let caps = cpu_capabilities();
    (caps.features, caps.vendor_match)
}
