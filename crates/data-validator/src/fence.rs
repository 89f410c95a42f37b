//! IQR Fence Computation

use crate::error::ValidationError;
use crate::event::{Axis, ParkingEvent};
use serde::{Deserialize, Serialize};

/// Default fence multiplier. Looser than the classic 1.5 because bay
/// coordinates cluster tightly.
pub const DEFAULT_FENCE_MULTIPLIER: f64 = 4.5;

/// Acceptance bounds for one numeric column (inclusive)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FenceBounds {
    pub low: f64,
    pub high: f64,
}

impl FenceBounds {
    pub fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    /// Full valid coordinate domain for an axis
    pub fn full_domain(axis: Axis) -> Self {
        match axis {
            Axis::Latitude => Self::new(-90.0, 90.0),
            Axis::Longitude => Self::new(-180.0, 180.0),
        }
    }

    /// Whether `value` lies within the fence
    pub fn contains(&self, value: f64) -> bool {
        value >= self.low && value <= self.high
    }

    /// Whether `value` lies strictly below `low` or above `high`
    pub fn is_outlier(&self, value: f64) -> bool {
        value < self.low || value > self.high
    }

    pub fn width(&self) -> f64 {
        self.high - self.low
    }
}

/// Quantile of sorted data by linear interpolation between order statistics.
///
/// `sorted` must be non-empty and ascending; `q` is in `[0, 1]`.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    debug_assert!(!sorted.is_empty());
    let position = (sorted.len() - 1) as f64 * q.clamp(0.0, 1.0);
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

/// Sorted copy of the finite, non-null values
pub fn sorted_finite(values: impl IntoIterator<Item = Option<f64>>) -> Vec<f64> {
    let mut sorted: Vec<f64> = values
        .into_iter()
        .flatten()
        .filter(|v| v.is_finite())
        .collect();
    sorted.sort_by(f64::total_cmp);
    sorted
}

/// Compute `[Q1 - k*IQR, Q3 + k*IQR]` over the non-null values, or
/// `fallback` when there are none.
pub fn compute_fence(
    values: impl IntoIterator<Item = Option<f64>>,
    k: f64,
    fallback: FenceBounds,
) -> FenceBounds {
    let sorted = sorted_finite(values);
    if sorted.is_empty() {
        return fallback;
    }

    let q1 = quantile_sorted(&sorted, 0.25);
    let q3 = quantile_sorted(&sorted, 0.75);
    let iqr = q3 - q1;
    FenceBounds::new(q1 - k * iqr, q3 + k * iqr)
}

/// Latitude and longitude fences for one classification run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fences {
    pub latitude: FenceBounds,
    pub longitude: FenceBounds,
}

impl Fences {
    pub fn get(&self, axis: Axis) -> FenceBounds {
        match axis {
            Axis::Latitude => self.latitude,
            Axis::Longitude => self.longitude,
        }
    }
}

impl Default for Fences {
    fn default() -> Self {
        Self {
            latitude: FenceBounds::full_domain(Axis::Latitude),
            longitude: FenceBounds::full_domain(Axis::Longitude),
        }
    }
}

/// Computes per-axis fences over a working set of events
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FenceCalculator {
    multiplier: f64,
    domains: Fences,
}

impl FenceCalculator {
    /// Create a calculator with multiplier `k` and full coordinate domains
    pub fn new(multiplier: f64) -> Result<Self, ValidationError> {
        if !multiplier.is_finite() || multiplier < 0.0 {
            return Err(ValidationError::InvalidMultiplier(multiplier));
        }
        Ok(Self {
            multiplier,
            domains: Fences::default(),
        })
    }

    /// Replace the fallback domains used for all-null columns
    pub fn with_domains(mut self, domains: Fences) -> Result<Self, ValidationError> {
        for axis in [Axis::Latitude, Axis::Longitude] {
            let domain = domains.get(axis);
            if !domain.low.is_finite() || !domain.high.is_finite() || domain.low > domain.high {
                return Err(ValidationError::InvalidDomain {
                    axis: axis.name(),
                    low: domain.low,
                    high: domain.high,
                });
            }
        }
        self.domains = domains;
        Ok(self)
    }

    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    /// Fallback domains used for all-null columns
    pub fn domains(&self) -> Fences {
        self.domains
    }

    /// Fence for one axis of `events`
    pub fn fence(&self, events: &[ParkingEvent], axis: Axis) -> FenceBounds {
        compute_fence(
            events.iter().map(|e| e.coordinate(axis)),
            self.multiplier,
            self.domains.get(axis),
        )
    }

    /// Latitude and longitude fences of `events`
    pub fn fences(&self, events: &[ParkingEvent]) -> Fences {
        Fences {
            latitude: self.fence(events, Axis::Latitude),
            longitude: self.fence(events, Axis::Longitude),
        }
    }
}

impl Default for FenceCalculator {
    fn default() -> Self {
        Self {
            multiplier: DEFAULT_FENCE_MULTIPLIER,
            domains: Fences::default(),
        }
    }
}
