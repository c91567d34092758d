//! User tunables: an explicit operation override and a threshold override.
//!
//! ```text
//! TIERMEM_OPERATION=avx2,y,n          # family, source align, destination align
//! TIERMEM_THRESHOLD=4096,262144,8388608,-1
//! ```
//!
//! Malformed values never fail initialization; they are logged and ignored.

use super::threshold::UserThresholds;
use super::{parse_env_var, Config, ValidationError};
use crate::error::{Result, TierMemError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Instruction family named by an operation override
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IsaFamily {
    /// 512-bit vector engine
    Avx512,
    /// 256-bit vector engine
    Avx2,
    /// Repeated string instructions
    Erms,
}

impl FromStr for IsaFamily {
    type Err = TierMemError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "avx512" => Ok(Self::Avx512),
            "avx2" => Ok(Self::Avx2),
            "erms" => Ok(Self::Erms),
            other => Err(TierMemError::configuration(format!("unknown operation family {:?}", other))),
        }
    }
}

/// Alignment promised for one side of an operation override
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    /// No promise
    Unaligned,
    /// `w`: 2 bytes
    Word,
    /// `d`: 4 bytes
    Dword,
    /// `q`: 8 bytes
    Qword,
    /// `x`: 16 bytes
    Xmm,
    /// `y`: 32 bytes
    Ymm,
    /// `n`: 64 bytes, and request non-temporal access on this side
    NonTemporal,
}

impl Alignment {
    /// Decode one alignment character; anything unrecognized is unaligned
    pub fn from_char(c: char) -> Self {
        match c.to_ascii_lowercase() {
            'w' => Self::Word,
            'd' => Self::Dword,
            'q' => Self::Qword,
            'x' => Self::Xmm,
            'y' => Self::Ymm,
            'n' => Self::NonTemporal,
            _ => Self::Unaligned,
        }
    }

    /// Guaranteed alignment in bytes
    pub const fn bytes(self) -> usize {
        match self {
            Self::Unaligned => 1,
            Self::Word => 2,
            Self::Dword => 4,
            Self::Qword => 8,
            Self::Xmm => 16,
            Self::Ymm => 32,
            Self::NonTemporal => 64,
        }
    }

    /// Whether this side asked for non-temporal access
    pub const fn is_non_temporal(self) -> bool {
        matches!(self, Self::NonTemporal)
    }

    fn as_char(self) -> char {
        match self {
            Self::Unaligned => 'u',
            Self::Word => 'w',
            Self::Dword => 'd',
            Self::Qword => 'q',
            Self::Xmm => 'x',
            Self::Ymm => 'y',
            Self::NonTemporal => 'n',
        }
    }
}

/// Explicit `(family, src_align, dst_align)` override
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserOperation {
    /// Requested instruction family
    pub family: IsaFamily,
    /// Source-side alignment promise
    pub src_align: Alignment,
    /// Destination-side alignment promise
    pub dst_align: Alignment,
}

impl UserOperation {
    /// Smaller of the two alignments, in bytes
    pub fn min_alignment(&self) -> usize {
        self.src_align.bytes().min(self.dst_align.bytes())
    }
}

impl FromStr for UserOperation {
    type Err = TierMemError;

    /// Parse `"<avx512|avx2|erms>,<src>,<dst>"`.
    ///
    /// Empty fields are skipped. Both alignment fields must be present; an
    /// unrecognized alignment character counts as unaligned.
    fn from_str(s: &str) -> Result<Self> {
        let mut fields = s.split(',').map(str::trim).filter(|f| !f.is_empty());
        let family = fields.next().unwrap_or_default().parse()?;
        let mut side = |name: &str| {
            fields
                .next()
                .and_then(|f| f.chars().next())
                .map(Alignment::from_char)
                .ok_or_else(|| {
                    TierMemError::configuration(format!("operation {:?} has no {} alignment", s, name))
                })
        };
        let src_align = side("source")?;
        let dst_align = side("destination")?;
        Ok(Self { family, src_align, dst_align })
    }
}

impl fmt::Display for UserOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let family = match self.family {
            IsaFamily::Avx512 => "avx512",
            IsaFamily::Avx2 => "avx2",
            IsaFamily::Erms => "erms",
        };
        write!(f, "{},{},{}", family, self.src_align.as_char(), self.dst_align.as_char())
    }
}

/// User overrides consulted once, at dispatch resolution
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TunableConfig {
    /// Explicit operation override (`<prefix>OPERATION`)
    pub operation: Option<UserOperation>,
    /// Threshold override (`<prefix>THRESHOLD`)
    pub threshold: Option<UserThresholds>,
}

impl TunableConfig {
    /// Whether any override is present
    pub fn is_empty(&self) -> bool {
        self.operation.is_none() && self.threshold.is_none()
    }
}

impl Config for TunableConfig {
    fn validate(&self) -> Result<()> {
        if let Some(t) = &self.threshold {
            if t.repmov_start > t.repmov_stop {
                let err = ValidationError::new(
                    "threshold.repmov_start",
                    &t.repmov_start.to_string(),
                    "rep-move window starts after it stops",
                )
                .with_suggestion(&format!("<= {}", t.repmov_stop));
                return Err(TierMemError::configuration(err.to_string()));
            }
            if t.nt_start > t.nt_stop {
                let err = ValidationError::new(
                    "threshold.nt_start",
                    &t.nt_start.to_string(),
                    "non-temporal window starts after it stops",
                )
                .with_suggestion(&format!("<= {}", t.nt_stop));
                return Err(TierMemError::configuration(err.to_string()));
            }
        }
        Ok(())
    }

    fn from_env_with_prefix(prefix: &str) -> Result<Self> {
        let config = Self {
            operation: parse_env_var(&format!("{}OPERATION", prefix)),
            threshold: parse_env_var(&format!("{}THRESHOLD", prefix)),
        };
        config.validate()?;
        Ok(config)
    }

    /// No overrides: detection picks the generation-tuned variant
    fn performance_preset() -> Self {
        Self::default()
    }

    /// Stream both sides past the caches
    fn memory_preset() -> Self {
        Self {
            operation: Some(UserOperation {
                family: IsaFamily::Avx2,
                src_align: Alignment::NonTemporal,
                dst_align: Alignment::NonTemporal,
            }),
            threshold: None,
        }
    }

    /// Keep every size on the vector loop: no rep tier, no streaming tier
    fn realtime_preset() -> Self {
        Self {
            operation: None,
            threshold: Some(UserThresholds {
                repmov_start: 0,
                repmov_stop: 0,
                nt_start: usize::MAX,
                nt_stop: usize::MAX,
            }),
        }
    }

    fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let serialized = serde_json::to_string_pretty(self)
            .map_err(|e| TierMemError::configuration(format!("Failed to serialize tunables: {}", e)))?;
        std::fs::write(path, serialized)
            .map_err(|e| TierMemError::configuration(format!("Failed to write tunables file: {}", e)))?;
        Ok(())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| TierMemError::configuration(format!("Failed to read tunables file: {}", e)))?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| TierMemError::configuration(format!("Failed to parse tunables file: {}", e)))?;
        config.validate()?;
        Ok(config)
    }
}
