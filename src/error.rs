//! Error handling for the tiermem library
//!
//! The raw primitives (`memcpy`, `strlen`, ...) have no error path: contract
//! violations there are undefined behaviour, exactly as in the C library they
//! replace. Errors only surface from the safe slice API and from the
//! configuration layer.

use thiserror::Error;

/// Main error type for the tiermem library
#[derive(Error, Debug)]
pub enum TierMemError {
    /// I/O related errors (configuration files)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid data format
    #[error("Invalid data: {message}")]
    InvalidData {
        /// Error message describing the issue
        message: String,
    },

    /// Index out of bounds access
    #[error("Out of bounds: index {index}, size {size}")]
    OutOfBounds {
        /// The invalid index
        index: usize,
        /// The valid size/length
        size: usize,
    },

    /// Source and destination lengths differ
    #[error("Length mismatch: destination holds {expected} bytes, source has {actual}")]
    LengthMismatch {
        /// Destination length
        expected: usize,
        /// Source length
        actual: usize,
    },

    /// Configuration or parameter errors
    #[error("Invalid configuration: {message}")]
    Configuration {
        /// Configuration error message
        message: String,
    },
}

impl TierMemError {
    /// Create an invalid data error
    pub fn invalid_data<S: Into<String>>(message: S) -> Self {
        Self::InvalidData { message: message.into() }
    }

    /// Create an out of bounds error
    pub fn out_of_bounds(index: usize, size: usize) -> Self {
        Self::OutOfBounds { index, size }
    }

    /// Create a length mismatch error
    pub fn length_mismatch(expected: usize, actual: usize) -> Self {
        Self::LengthMismatch { expected, actual }
    }

    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration { message: message.into() }
    }

    /// Get the error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::InvalidData { .. } => "data",
            Self::OutOfBounds { .. } => "bounds",
            Self::LengthMismatch { .. } => "length",
            Self::Configuration { .. } => "config",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, TierMemError>;

/// Assert that a range is within bounds
#[inline]
pub fn check_range(start: usize, end: usize, size: usize) -> Result<()> {
    if start > end {
        return Err(TierMemError::invalid_data(format!(
            "Invalid range: start {} > end {}",
            start, end
        )));
    }
    if end > size {
        return Err(TierMemError::out_of_bounds(end, size));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = TierMemError::invalid_data("test message");
        assert_eq!(err.category(), "data");
    }

    #[test]
    fn test_range_checking() {
        assert!(check_range(2, 8, 10).is_ok());
        assert!(check_range(8, 2, 10).is_err()); // start > end
        assert!(check_range(2, 15, 10).is_err()); // end > size
        assert!(check_range(0, 0, 0).is_ok());
        assert!(check_range(5, 5, 5).is_ok());
        assert!(check_range(usize::MAX, 0, 10).is_err());
    }

    #[test]
    fn test_all_error_types() {
        let bounds_err = TierMemError::out_of_bounds(5, 3);
        assert_eq!(bounds_err.category(), "bounds");

        let len_err = TierMemError::length_mismatch(16, 8);
        assert_eq!(len_err.category(), "length");

        let config_err = TierMemError::configuration("bad threshold");
        assert_eq!(config_err.category(), "config");
    }

    #[test]
    fn test_error_display() {
        let err = TierMemError::length_mismatch(10, 5);
        let display = format!("{}", err);
        assert!(display.contains("Length mismatch"));
        assert!(display.contains("10"));
        assert!(display.contains("5"));

        let bounds = TierMemError::out_of_bounds(12, 8);
        let display = format!("{}", bounds);
        assert!(display.contains("index 12"));
        assert!(display.contains("size 8"));
    }

    #[test]
    fn test_from_io_error() {
        let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err: TierMemError = io_error.into();

        assert_eq!(err.category(), "io");
        assert!(format!("{}", err).contains("I/O error"));
    }
}
