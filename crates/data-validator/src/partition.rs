//! Accept/Reject Partitioning

use crate::event::ParkingEvent;
use crate::fence::Fences;
use crate::reason::{ReasonEvaluator, ReasonSet, RejectionReason};
use metrics::counter;
use serde::Serialize;
use tracing::{info, warn};

/// An event with the reasons it failed, if any
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedRecord {
    #[serde(flatten)]
    pub event: ParkingEvent,
    #[serde(rename = "reject_reason")]
    pub reasons: ReasonSet,
}

impl ClassifiedRecord {
    pub fn is_accepted(&self) -> bool {
        self.reasons.is_empty()
    }

    /// Comma-joined reason labels
    pub fn reject_reason(&self) -> String {
        self.reasons.label()
    }
}

/// Fence thresholds used for a run, for audit and display.
/// A bound is `None` when it did not compute to a finite number.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FenceMeta {
    pub lat_low: Option<f64>,
    pub lat_high: Option<f64>,
    pub lon_low: Option<f64>,
    pub lon_high: Option<f64>,
}

impl From<&Fences> for FenceMeta {
    fn from(fences: &Fences) -> Self {
        let finite = |v: f64| v.is_finite().then_some(v);
        Self {
            lat_low: finite(fences.latitude.low),
            lat_high: finite(fences.latitude.high),
            lon_low: finite(fences.longitude.low),
            lon_high: finite(fences.longitude.high),
        }
    }
}

/// Result of one classification run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub accepted: Vec<ClassifiedRecord>,
    pub rejected: Vec<ClassifiedRecord>,
    pub fences: FenceMeta,
}

impl Classification {
    /// Number of input records
    pub fn total(&self) -> usize {
        self.accepted.len() + self.rejected.len()
    }

    /// Accepted events, e.g. for reclassifying the narrower set
    pub fn accepted_events(&self) -> Vec<ParkingEvent> {
        self.accepted.iter().map(|r| r.event.clone()).collect()
    }

    /// Rejected rows carrying each reason, in label order
    pub fn reason_counts(&self) -> Vec<(RejectionReason, usize)> {
        RejectionReason::ALL
            .into_iter()
            .map(|reason| {
                let count = self
                    .rejected
                    .iter()
                    .filter(|r| r.reasons.contains(reason))
                    .count();
                (reason, count)
            })
            .collect()
    }
}

/// Splits events into accepted and rejected sets against fixed fences
#[derive(Debug, Default, Clone, Copy)]
pub struct Partitioner;

impl Partitioner {
    pub fn new() -> Self {
        Self
    }

    /// Evaluate every record against `fences` and split by reason set.
    pub fn partition(&self, events: &[ParkingEvent], fences: &Fences) -> Classification {
        let evaluator = ReasonEvaluator::new(fences);
        let mut accepted = Vec::new();
        let mut rejected = Vec::new();

        for event in events {
            let record = ClassifiedRecord {
                event: event.clone(),
                reasons: evaluator.evaluate(event),
            };
            if record.is_accepted() {
                accepted.push(record);
            } else {
                rejected.push(record);
            }
        }

        let classification = Classification {
            accepted,
            rejected,
            fences: FenceMeta::from(fences),
        };
        record_metrics(&classification);

        info!(
            "Classified {} records: {} accepted, {} rejected (lat [{}, {}], lon [{}, {}])",
            classification.total(),
            classification.accepted.len(),
            classification.rejected.len(),
            fences.latitude.low,
            fences.latitude.high,
            fences.longitude.low,
            fences.longitude.high
        );
        if classification.accepted.is_empty() && !events.is_empty() {
            warn!("Every record was rejected");
        }

        classification
    }
}

fn record_metrics(classification: &Classification) {
    counter!("parking_records_classified_total").increment(classification.total() as u64);
    counter!("parking_records_accepted_total").increment(classification.accepted.len() as u64);
    for (reason, count) in classification.reason_counts() {
        if count > 0 {
            counter!("parking_records_rejected_total", "reason" => reason.label())
                .increment(count as u64);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fence::FenceBounds;

    fn event(lat: Option<f64>, lon: Option<f64>, plate: &str) -> ParkingEvent {
        ParkingEvent {
            latitude: lat,
            longitude: lon,
            license_plate: Some(plate.to_string()).filter(|p| !p.is_empty()),
            ..Default::default()
        }
    }

    #[test]
    fn test_partition_preserves_input_order() {
        let events = vec![
            event(Some(-31.9), Some(115.9), "A1"),
            event(None, Some(115.9), "B2"),
            event(Some(-31.9), Some(115.9), "C3"),
            event(Some(-31.9), Some(115.9), ""),
        ];
        let result = Partitioner::new().partition(&events, &Fences::default());

        assert_eq!(result.total(), 4);
        let accepted: Vec<_> = result
            .accepted
            .iter()
            .filter_map(|r| r.event.license_plate.as_deref())
            .collect();
        assert_eq!(accepted, vec!["A1", "C3"]);
        assert_eq!(result.rejected[0].reject_reason(), "NULL_COORDS");
        assert_eq!(result.rejected[1].reject_reason(), "NULL_PLATE");
    }

    #[test]
    fn test_fence_meta_reports_bounds() {
        let fences = Fences {
            latitude: FenceBounds::new(-32.5, -31.5),
            longitude: FenceBounds::new(115.0, f64::INFINITY),
        };
        let meta = FenceMeta::from(&fences);
        assert_eq!(meta.lat_low, Some(-32.5));
        assert_eq!(meta.lat_high, Some(-31.5));
        assert_eq!(meta.lon_low, Some(115.0));
        assert_eq!(meta.lon_high, None);
    }

    #[test]
    fn test_all_rejected_is_not_an_error() {
        let events = vec![event(None, None, ""), event(None, None, "")];
        let result = Partitioner::new().partition(&events, &Fences::default());
        assert!(result.accepted.is_empty());
        assert_eq!(result.rejected.len(), 2);
        assert_eq!(
            result.reason_counts(),
            vec![
                (RejectionReason::NullCoords, 2),
                (RejectionReason::NullPlate, 2),
                (RejectionReason::LatOutlier, 0),
                (RejectionReason::LonOutlier, 0),
            ]
        );
    }

    #[test]
    fn test_empty_input() {
        let result = Partitioner::new().partition(&[], &Fences::default());
        assert_eq!(result.total(), 0);
        assert_eq!(result.fences.lat_low, Some(-90.0));
        assert_eq!(result.fences.lon_high, Some(180.0));
    }

    #[test]
    fn test_record_serializes_reject_reason() {
        let fences = Fences::default();
        let result = Partitioner::new().partition(&[event(None, Some(115.9), "")], &fences);
        let json = serde_json::to_value(&result.rejected[0]).unwrap();
        assert_eq!(json["reject_reason"], "NULL_COORDS,NULL_PLATE");
        assert_eq!(json["longitude"], 115.9);
    }
}
