//! Rejection Reasons and Predicate Evaluation

use crate::event::{Axis, ParkingEvent};
use crate::fence::Fences;
use serde::{Serialize, Serializer};
use std::fmt;

/// Why a record was rejected. Declaration order is display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum RejectionReason {
    #[serde(rename = "NULL_COORDS")]
    NullCoords,
    #[serde(rename = "NULL_PLATE")]
    NullPlate,
    #[serde(rename = "LAT_OUTLIER")]
    LatOutlier,
    #[serde(rename = "LON_OUTLIER")]
    LonOutlier,
}

impl RejectionReason {
    pub const ALL: [RejectionReason; 4] = [
        RejectionReason::NullCoords,
        RejectionReason::NullPlate,
        RejectionReason::LatOutlier,
        RejectionReason::LonOutlier,
    ];

    pub fn label(self) -> &'static str {
        match self {
            RejectionReason::NullCoords => "NULL_COORDS",
            RejectionReason::NullPlate => "NULL_PLATE",
            RejectionReason::LatOutlier => "LAT_OUTLIER",
            RejectionReason::LonOutlier => "LON_OUTLIER",
        }
    }

    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Small ordered set of reasons. Iteration follows [`RejectionReason::ALL`]
/// regardless of insertion order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ReasonSet(u8);

impl ReasonSet {
    pub fn new() -> Self {
        Self(0)
    }

    pub fn insert(&mut self, reason: RejectionReason) {
        self.0 |= reason.bit();
    }

    pub fn contains(&self, reason: RejectionReason) -> bool {
        self.0 & reason.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn iter(&self) -> impl Iterator<Item = RejectionReason> + '_ {
        RejectionReason::ALL
            .into_iter()
            .filter(move |reason| self.contains(*reason))
    }

    /// Comma-joined labels, empty when no reason matched
    pub fn label(&self) -> String {
        self.iter()
            .map(RejectionReason::label)
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl FromIterator<RejectionReason> for ReasonSet {
    fn from_iter<I: IntoIterator<Item = RejectionReason>>(iter: I) -> Self {
        let mut set = ReasonSet::new();
        for reason in iter {
            set.insert(reason);
        }
        set
    }
}

impl fmt::Display for ReasonSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl Serialize for ReasonSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.label())
    }
}

/// A named predicate over one event
pub struct ReasonRule {
    pub reason: RejectionReason,
    pub matches: fn(&ParkingEvent, &Fences) -> bool,
}

fn null_coords(event: &ParkingEvent, _: &Fences) -> bool {
    event.latitude.is_none() || event.longitude.is_none()
}

fn null_plate(event: &ParkingEvent, _: &Fences) -> bool {
    event.license_plate.is_none()
}

fn outside_fence(event: &ParkingEvent, fences: &Fences, axis: Axis) -> bool {
    event
        .coordinate(axis)
        .is_some_and(|value| fences.get(axis).is_outlier(value))
}

fn lat_outlier(event: &ParkingEvent, fences: &Fences) -> bool {
    outside_fence(event, fences, Axis::Latitude)
}

fn lon_outlier(event: &ParkingEvent, fences: &Fences) -> bool {
    outside_fence(event, fences, Axis::Longitude)
}

/// Rule table, in label order
pub const RULES: [ReasonRule; 4] = [
    ReasonRule {
        reason: RejectionReason::NullCoords,
        matches: null_coords,
    },
    ReasonRule {
        reason: RejectionReason::NullPlate,
        matches: null_plate,
    },
    ReasonRule {
        reason: RejectionReason::LatOutlier,
        matches: lat_outlier,
    },
    ReasonRule {
        reason: RejectionReason::LonOutlier,
        matches: lon_outlier,
    },
];

/// Evaluates every rule against a record and collects all matches
pub struct ReasonEvaluator<'a> {
    fences: &'a Fences,
}

impl<'a> ReasonEvaluator<'a> {
    pub fn new(fences: &'a Fences) -> Self {
        Self { fences }
    }

    /// All rules run unconditionally; there is no short-circuit.
    pub fn evaluate(&self, event: &ParkingEvent) -> ReasonSet {
        let mut reasons = ReasonSet::new();
        for rule in &RULES {
            if (rule.matches)(event, self.fences) {
                reasons.insert(rule.reason);
            }
        }
        reasons
    }
}
