//! Stay Duration Distribution

use crate::statistics::{sorted_durations_hr, Summary};
use data_validator::ClassifiedRecord;
use serde::Serialize;
use std::collections::HashMap;

/// One histogram bin, `[lower, upper)` except the last which is closed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Equal-width histogram of stay durations in hours
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DurationHistogram {
    pub bins: Vec<HistogramBin>,
    pub summary: Summary,
}

impl DurationHistogram {
    /// Build over the non-null `duration_hr` of `accepted` with `bins` bins
    pub fn build(accepted: &[ClassifiedRecord], bins: usize) -> Self {
        let values = sorted_durations_hr(accepted);
        let summary = Summary::compute(values.iter().copied().map(Some));

        let (Some(&min), Some(&max)) = (values.first(), values.last()) else {
            return Self::default();
        };

        if min == max {
            return Self {
                bins: vec![HistogramBin {
                    lower: min,
                    upper: max,
                    count: values.len(),
                }],
                summary,
            };
        }

        let bins = bins.max(1);
        let width = (max - min) / bins as f64;
        let mut counts = vec![0usize; bins];
        for value in &values {
            let index = (((value - min) / width).floor() as usize).min(bins - 1);
            counts[index] += 1;
        }

        Self {
            bins: counts
                .into_iter()
                .enumerate()
                .map(|(i, count)| HistogramBin {
                    lower: min + width * i as f64,
                    upper: if i + 1 == bins { max } else { min + width * (i + 1) as f64 },
                    count,
                })
                .collect(),
            summary,
        }
    }
}

/// Total parked time for one vehicle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VehicleTotal {
    pub license_plate: String,
    pub total_hours: f64,
}

/// Vehicles with the most total parked hours, limited to `limit`.
/// Unknown durations add nothing to a vehicle's total.
pub fn top_vehicles_by_time(accepted: &[ClassifiedRecord], limit: usize) -> Vec<VehicleTotal> {
    let mut totals: HashMap<&str, f64> = HashMap::new();
    for record in accepted {
        if let Some(plate) = record.event.license_plate.as_deref() {
            *totals.entry(plate).or_insert(0.0) += record.event.duration_hr().unwrap_or(0.0);
        }
    }

    let mut vehicles: Vec<VehicleTotal> = totals
        .into_iter()
        .map(|(plate, hours)| VehicleTotal {
            license_plate: plate.to_string(),
            total_hours: hours,
        })
        .collect();
    vehicles.sort_by(|a, b| {
        b.total_hours
            .total_cmp(&a.total_hours)
            .then_with(|| a.license_plate.cmp(&b.license_plate))
    });
    vehicles.truncate(limit);
    vehicles
}
