//! Classification Pipeline
//!
//! normalize → fence → evaluate → partition, with its configuration.

use crate::error::ValidationError;
use crate::event::{ParkingEvent, RawParkingEvent};
use crate::fence::{FenceBounds, FenceCalculator, Fences, DEFAULT_FENCE_MULTIPLIER};
use crate::filter::DateRange;
use crate::normalizer::{Normalizer, DEFAULT_UTC_OFFSET_MINUTES};
use crate::partition::{Classification, Partitioner};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Validation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// IQR multiplier `k` for coordinate fences
    pub fence_multiplier: f64,
    /// Latitude fallback when no latitudes are present
    pub latitude_domain: (f64, f64),
    /// Longitude fallback when no longitudes are present
    pub longitude_domain: (f64, f64),
    /// Local calendar offset for derived date/hour (minutes east of UTC)
    pub utc_offset_minutes: i32,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            fence_multiplier: DEFAULT_FENCE_MULTIPLIER,
            latitude_domain: (-90.0, 90.0),
            longitude_domain: (-180.0, 180.0),
            utc_offset_minutes: DEFAULT_UTC_OFFSET_MINUTES,
        }
    }
}

impl ValidationConfig {
    /// Classic Tukey fences (k = 1.5)
    pub fn classic() -> Self {
        Self {
            fence_multiplier: 1.5,
            ..Default::default()
        }
    }

    /// Wider fences (k = 6.0)
    pub fn lenient() -> Self {
        Self {
            fence_multiplier: 6.0,
            ..Default::default()
        }
    }

    fn domains(&self) -> Fences {
        Fences {
            latitude: FenceBounds::new(self.latitude_domain.0, self.latitude_domain.1),
            longitude: FenceBounds::new(self.longitude_domain.0, self.longitude_domain.1),
        }
    }

    /// Check every setting, returning the first violation
    pub fn validate(&self) -> Result<(), ValidationError> {
        FenceCalculator::new(self.fence_multiplier)?.with_domains(self.domains())?;
        Normalizer::with_utc_offset_minutes(self.utc_offset_minutes)?;
        Ok(())
    }
}

/// Runs the full classification over a batch
#[derive(Debug, Clone, Copy)]
pub struct Classifier {
    normalizer: Normalizer,
    calculator: FenceCalculator,
    partitioner: Partitioner,
}

impl Classifier {
    /// Create a classifier, failing on invalid configuration
    pub fn new(config: &ValidationConfig) -> Result<Self, ValidationError> {
        Ok(Self {
            normalizer: Normalizer::with_utc_offset_minutes(config.utc_offset_minutes)?,
            calculator: FenceCalculator::new(config.fence_multiplier)?
                .with_domains(config.domains())?,
            partitioner: Partitioner::new(),
        })
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    pub fn multiplier(&self) -> f64 {
        self.calculator.multiplier()
    }

    /// Fallback fences for all-null coordinate columns
    pub fn domains(&self) -> Fences {
        self.calculator.domains()
    }

    /// Normalize raw rows
    pub fn normalize(&self, raws: &[RawParkingEvent]) -> Vec<ParkingEvent> {
        self.normalizer.normalize_batch(raws).0
    }

    /// Fences computed over exactly `events`
    pub fn fences(&self, events: &[ParkingEvent]) -> Fences {
        self.calculator.fences(events)
    }

    /// Classify normalized events. Fences are recomputed from `events` on
    /// every call, so classifying a previously accepted subset is a new run.
    pub fn classify(&self, events: &[ParkingEvent]) -> Classification {
        let fences = self.fences(events);
        debug!("Computed fences with k={}: {:?}", self.multiplier(), fences);
        self.partitioner.partition(events, &fences)
    }

    /// Restrict `events` to `range` and classify the result
    pub fn classify_range(&self, events: &[ParkingEvent], range: &DateRange) -> Classification {
        self.classify(&range.apply(events))
    }

    /// Normalize then classify
    pub fn classify_raw(&self, raws: &[RawParkingEvent]) -> Classification {
        self.classify(&self.normalize(raws))
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self {
            normalizer: Normalizer::default(),
            calculator: FenceCalculator::default(),
            partitioner: Partitioner::new(),
        }
    }
}
