//! Validation Error Types

use chrono::NaiveDate;
use thiserror::Error;

/// Caller contract violations.
///
/// Malformed field values never produce one of these; they degrade to `None`
/// and surface as rejection reasons instead.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    /// Configuration value out of allowed range
    #[error("{field} value {value} is out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    /// Fence multiplier is negative or not finite
    #[error("Fence multiplier must be finite and non-negative, got {0}")]
    InvalidMultiplier(f64),

    /// Axis fallback domain is empty or not finite
    #[error("Invalid {axis} domain [{low}, {high}]")]
    InvalidDomain {
        axis: &'static str,
        low: f64,
        high: f64,
    },

    /// Date range ends before it starts
    #[error("Invalid date range: {start} is after {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },
}
