//! Configuration for tiermem
//!
//! Two things are configurable, both consulted exactly once when the dispatch
//! table is resolved:
//!
//! - [`TunableConfig`]: an explicit operation override (instruction family
//!   plus source/destination alignment) and a threshold override
//! - [`ThresholdSet`]: the size cutoffs that partition every primitive into
//!   tiers, normally derived from the cache geometry
//!
//! # Environment Initialization
//!
//! ```rust
//! use tiermem::config::{Config, TunableConfig};
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Reads TIERMEM_OPERATION and TIERMEM_THRESHOLD
//! let config = TunableConfig::from_env()?;
//!
//! // Or with a custom prefix
//! let config = TunableConfig::from_env_with_prefix("MYAPP_")?;
//! # Ok(())
//! # }
//! ```
//!
//! Malformed values are logged at `warn` and ignored; they never make
//! initialization fail.

use crate::error::Result;
use std::env;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

pub mod threshold;
pub mod tunables;

pub use threshold::{compute_thresholds, parse_user_thresholds, ThresholdSet, UserThresholds};
pub use tunables::{Alignment, IsaFamily, TunableConfig, UserOperation};

/// Default environment prefix
pub const ENV_PREFIX: &str = "TIERMEM_";

/// Common configuration trait providing validation, environment initialization,
/// and preset management functionality.
pub trait Config: Clone + fmt::Debug {
    /// Validate the configuration for correctness and consistency.
    fn validate(&self) -> Result<()>;

    /// Initialize configuration from environment variables.
    ///
    /// Variables use the format `TIERMEM_{FIELD}`, for example
    /// `TIERMEM_THRESHOLD=2048,524288,25165824,-1`.
    fn from_env() -> Result<Self>
    where
        Self: Default,
    {
        Self::from_env_with_prefix(ENV_PREFIX)
    }

    /// Initialize configuration from environment variables with a custom prefix.
    fn from_env_with_prefix(prefix: &str) -> Result<Self>
    where
        Self: Default;

    /// Preset tuned for throughput.
    fn performance_preset() -> Self;

    /// Preset that keeps the caches clean.
    fn memory_preset() -> Self;

    /// Preset with predictable per-call cost.
    fn realtime_preset() -> Self;

    /// Balanced preset; the default unless overridden.
    fn balanced_preset() -> Self
    where
        Self: Default,
    {
        Self::default()
    }

    /// Save configuration to a JSON file.
    fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()>;

    /// Load configuration from a JSON file.
    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self>;
}

/// Configuration validation error details.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// The field that failed validation
    pub field: String,
    /// The invalid value
    pub value: String,
    /// Description of why the value is invalid
    pub reason: String,
    /// Suggested valid values or ranges
    pub suggestion: Option<String>,
}

impl ValidationError {
    /// Create a new validation error.
    pub fn new(field: &str, value: &str, reason: &str) -> Self {
        Self {
            field: field.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
            suggestion: None,
        }
    }

    /// Add a suggestion for valid values.
    pub fn with_suggestion(mut self, suggestion: &str) -> Self {
        self.suggestion = Some(suggestion.to_string());
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid configuration for field '{}': value '{}' is invalid ({})",
               self.field, self.value, self.reason)?;

        if let Some(ref suggestion) = self.suggestion {
            write!(f, ". Suggested values: {}", suggestion)?;
        }

        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Read and parse an environment variable.
///
/// Returns `None` when the variable is unset. A set but unparseable value is
/// logged and also yields `None`, so the caller keeps its default.
pub fn parse_env_var<T>(var_name: &str) -> Option<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    let raw = env::var(var_name).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("ignoring {}={:?}: {}", var_name, raw, e);
            None
        }
    }
}
