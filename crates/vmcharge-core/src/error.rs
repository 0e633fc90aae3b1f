//! Error types for vmcharge
//!
//! This module defines the error type shared by every vmcharge crate.
//! All errors are derived from `thiserror` for convenient error handling
//! and automatic `From` implementations.
//!
//! # Example
//!
//! ```
//! use vmcharge_core::error::{Result, VmchargeError};
//!
//! fn example_function() -> Result<()> {
//!     // This will automatically convert io::Error to VmchargeError
//!     let _file = std::fs::read_to_string("nonexistent.json")?;
//!     Ok(())
//! }
//! ```

use chrono::{DateTime, Utc};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::types::{FlavorFamily, InstanceId, InstanceState};

/// Pipeline stage that found no usable action records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryStage {
    /// The provider feed held no relevant actions and no creation time was usable
    Normalize,
    /// Reconstruction was handed an empty action log
    Reconstruct,
}

impl fmt::Display for HistoryStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normalize => write!(f, "no relevant actions and no usable creation time"),
            Self::Reconstruct => write!(f, "no actions to reconstruct intervals from"),
        }
    }
}

/// Main error type for vmcharge operations
///
/// Every error is fatal to the computation in progress; there is no
/// partial-result mode.
#[derive(Error, Debug)]
pub enum VmchargeError {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// Window end lies before window start
    #[error("Invalid range: end {end} is before start {start}")]
    InvalidRange {
        /// Requested window start
        start: DateTime<Utc>,
        /// Requested window end
        end: DateTime<Utc>,
    },

    /// Action history is empty
    #[error("Action history is empty: {0}")]
    EmptyHistory(HistoryStage),

    /// Charge table has no multiplier for a state
    #[error("No charge multiplier for state: {0}")]
    UnknownState(InstanceState),

    /// Charge table has no multiplier for a flavor family
    #[error("No charge multiplier for flavor family: {0}")]
    UnknownFlavorFamily(FlavorFamily),

    /// A charge exceeds the decimal range
    #[error("Charge out of range: {0}")]
    ChargeOverflow(String),

    /// Flavor name does not carry a family prefix
    #[error("Invalid flavor name: {0}")]
    InvalidFlavorName(String),

    /// Timestamp could not be parsed
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// Invalid date format
    #[error("Invalid date format: {0}")]
    InvalidDate(String),

    /// Invalid timezone
    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    /// No history recorded for the instance
    #[error("Instance not found: {0}")]
    InstanceNotFound(InstanceId),

    /// Parse error with file context
    #[error("Parse error in {file}: {error}")]
    Parse {
        /// The file that caused the error
        file: PathBuf,
        /// The error message
        error: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Convenience type alias for Results in vmcharge
///
/// # Example
///
/// ```
/// use vmcharge_core::Result;
///
/// fn process_data() -> Result<String> {
///     Ok("Processed successfully".to_string())
/// }
/// ```
pub type Result<T> = std::result::Result<T, VmchargeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = VmchargeError::EmptyHistory(HistoryStage::Reconstruct);
        assert_eq!(
            error.to_string(),
            "Action history is empty: no actions to reconstruct intervals from"
        );

        let error = VmchargeError::UnknownFlavorFamily(FlavorFamily::new("x9"));
        assert_eq!(error.to_string(), "No charge multiplier for flavor family: x9");
    }

    #[test]
    fn test_empty_history_stages_are_distinguishable() {
        let normalize = VmchargeError::EmptyHistory(HistoryStage::Normalize);
        let reconstruct = VmchargeError::EmptyHistory(HistoryStage::Reconstruct);
        assert!(matches!(
            normalize,
            VmchargeError::EmptyHistory(HistoryStage::Normalize)
        ));
        assert_ne!(normalize.to_string(), reconstruct.to_string());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let vmcharge_error: VmchargeError = io_error.into();
        assert!(matches!(vmcharge_error, VmchargeError::Io(_)));
    }
}
