//! Size thresholds that partition each primitive into tiers.
//!
//! Derived from [`CacheGeometry`] and the ERMS flag by [`compute_thresholds`];
//! a user override (`TIERMEM_THRESHOLD`) replaces the rep-move and
//! non-temporal windows while keeping the computed rep-store window.

use crate::error::TierMemError;
use crate::system::{CacheGeometry, FeatureSet};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Smallest size handed to `rep movsb` / `rep stosb` when ERMS is present
pub const REP_START: usize = 2 * 1024;

/// Numeric cutoffs, in bytes, consumed by the engines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdSet {
    /// Lower bound of the `rep movs` window
    pub repmov_start: usize,
    /// Upper bound of the `rep movs` window; 0 disables it
    pub repmov_stop: usize,
    /// Lower bound of the `rep stos` window
    pub repstore_start: usize,
    /// Upper bound of the `rep stos` window; 0 disables it
    pub repstore_stop: usize,
    /// Sizes from here on use non-temporal stores
    pub nt_start: usize,
    /// Sizes above this go back to temporal stores
    pub nt_stop: usize,
    /// Vector-loop to rep-move cutoff for the tuned engines
    pub vec_loop_stop: usize,
}

impl ThresholdSet {
    /// Whether `n` falls into the non-temporal window
    #[inline(always)]
    pub fn use_non_temporal(&self, n: usize) -> bool {
        n >= self.nt_start && n <= self.nt_stop
    }

    /// Whether `n` falls into the `rep movs` window
    #[inline(always)]
    pub fn use_rep_move(&self, n: usize) -> bool {
        n >= self.repmov_start && n <= self.repmov_stop
    }

    /// Whether `n` falls into the `rep stos` window
    #[inline(always)]
    pub fn use_rep_store(&self, n: usize) -> bool {
        n >= self.repstore_start && n <= self.repstore_stop
    }

    /// Apply a user override on top of computed thresholds
    pub fn with_user(mut self, user: &UserThresholds) -> Self {
        self.repmov_start = user.repmov_start;
        self.repmov_stop = user.repmov_stop;
        self.nt_start = user.nt_start;
        self.nt_stop = user.nt_stop;
        self
    }
}

/// Derive the threshold set for a cache geometry and feature set
pub fn compute_thresholds(geometry: &CacheGeometry, features: FeatureSet) -> ThresholdSet {
    let (rep_start, rep_stop) = if features.contains(FeatureSet::ERMS) {
        (REP_START, geometry.l2_per_core)
    } else {
        (0, 0)
    };

    let vec_loop_stop = if features.contains(FeatureSet::AVX512) {
        (geometry.l1d_per_core >> 1) + REP_START
    } else {
        geometry.l1d_per_core
    };

    ThresholdSet {
        repmov_start: rep_start,
        repmov_stop: rep_stop,
        repstore_start: rep_start,
        repstore_stop: rep_stop,
        nt_start: (3 * geometry.l3_per_ccx) >> 2,
        nt_stop: usize::MAX,
        vec_loop_stop,
    }
}

/// The four user-tunable thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserThresholds {
    /// `rep movs` window start
    pub repmov_start: usize,
    /// `rep movs` window end
    pub repmov_stop: usize,
    /// Non-temporal window start
    pub nt_start: usize,
    /// Non-temporal window end
    pub nt_stop: usize,
}

impl UserThresholds {
    /// Parse `"repmov_start,repmov_stop,nt_start,nt_stop"`.
    ///
    /// Returns `None` unless all four fields are unsigned integers and both
    /// windows are ordered. `nt_stop` also accepts `-1` for "no limit".
    pub fn parse(raw: &str) -> Option<Self> {
        let fields: Vec<&str> = raw.split(',').map(str::trim).collect();
        let [a, b, c, d] = fields.as_slice() else {
            return None;
        };

        let parsed = Self {
            repmov_start: a.parse().ok()?,
            repmov_stop: b.parse().ok()?,
            nt_start: c.parse().ok()?,
            nt_stop: if *d == "-1" { usize::MAX } else { d.parse().ok()? },
        };
        parsed.is_ordered().then_some(parsed)
    }

    fn is_ordered(&self) -> bool {
        self.repmov_start <= self.repmov_stop && self.nt_start <= self.nt_stop
    }
}

impl FromStr for UserThresholds {
    type Err = TierMemError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| {
            TierMemError::configuration(format!(
                "threshold override {:?} is not four ordered unsigned integers",
                s
            ))
        })
    }
}

/// Parse a raw override and apply it to `computed`.
///
/// `None` means the input was malformed and `computed` stays in force.
pub fn parse_user_thresholds(raw: &str, computed: &ThresholdSet) -> Option<ThresholdSet> {
    UserThresholds::parse(raw).map(|user| computed.with_user(&user))
}
