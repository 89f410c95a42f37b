//! Parking Event Data Quality
//!
//! Normalizes raw parking-event rows, fences coordinates by IQR, labels every
//! record with all the reasons it fails, and splits the batch into accepted
//! and rejected sets.

mod error;
mod event;
mod fence;
mod filter;
mod normalizer;
mod partition;
mod reason;
mod validator;

pub use error::ValidationError;
pub use event::{Axis, ParkingEvent, RawParkingEvent, RawValue};
pub use fence::{
    compute_fence, quantile_sorted, sorted_finite, FenceBounds, FenceCalculator, Fences,
    DEFAULT_FENCE_MULTIPLIER,
};
pub use filter::DateRange;
pub use normalizer::{
    coerce_number, coerce_plate, parse_timestamp, NormalizationStats, Normalizer,
    DEFAULT_UTC_OFFSET_MINUTES,
};
pub use partition::{Classification, ClassifiedRecord, FenceMeta, Partitioner};
pub use reason::{ReasonEvaluator, ReasonRule, ReasonSet, RejectionReason, RULES};
pub use validator::{Classifier, ValidationConfig};
