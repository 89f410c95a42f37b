//! Summary Statistics

use data_validator::{quantile_sorted, sorted_finite, ClassifiedRecord};
use serde::Serialize;

/// Summary of a numeric column, ignoring nulls
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    /// Number of non-null values
    pub count: usize,
    /// Sum of values (0 when empty)
    pub total: f64,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl Summary {
    /// Compute the summary of the non-null values
    pub fn compute(values: impl IntoIterator<Item = Option<f64>>) -> Self {
        let sorted = sorted_finite(values);
        if sorted.is_empty() {
            return Self::default();
        }

        let count = sorted.len();
        let total: f64 = sorted.iter().sum();

        Self {
            count,
            total,
            mean: Some(total / count as f64),
            median: Some(quantile_sorted(&sorted, 0.5)),
            min: sorted.first().copied(),
            max: sorted.last().copied(),
        }
    }
}

/// Median of the non-null values
pub fn median(values: impl IntoIterator<Item = Option<f64>>) -> Option<f64> {
    let sorted = sorted_finite(values);
    (!sorted.is_empty()).then(|| quantile_sorted(&sorted, 0.5))
}

/// Ascending non-null stay durations in hours
pub fn sorted_durations_hr(records: &[ClassifiedRecord]) -> Vec<f64> {
    sorted_finite(records.iter().map(|r| r.event.duration_hr()))
}

/// Round to two decimal places for display totals
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
