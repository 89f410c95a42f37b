//! Arrivals by Hour of Day

use crate::statistics::median;
use data_validator::ClassifiedRecord;
use serde::Serialize;
use std::collections::BTreeMap;

/// Arrival count and median stay for one local hour
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyArrivals {
    pub hour: u32,
    pub count: usize,
    /// Median stay in minutes; `None` when no stay in the hour has a duration
    pub median_min: Option<f64>,
}

/// Arrivals grouped by local hour, ascending. Hours with no arrivals are
/// omitted, as are records without an arrival time.
pub fn arrivals_by_hour(accepted: &[ClassifiedRecord]) -> Vec<HourlyArrivals> {
    let mut by_hour: BTreeMap<u32, Vec<Option<f64>>> = BTreeMap::new();
    for record in accepted {
        if let Some(hour) = record.event.hour {
            by_hour
                .entry(hour)
                .or_default()
                .push(record.event.duration_min());
        }
    }

    by_hour
        .into_iter()
        .map(|(hour, durations)| HourlyArrivals {
            hour,
            count: durations.len(),
            median_min: median(durations),
        })
        .collect()
}
