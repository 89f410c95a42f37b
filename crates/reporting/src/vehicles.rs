//! Repeat-Vehicle Detection
//!
//! Runs on the date-filtered events before classification, so a vehicle's
//! entries are counted even when some of them have unusable coordinates.

use crate::statistics::round2;
use chrono::{DateTime, FixedOffset, Utc};
use data_validator::ParkingEvent;
use serde::Serialize;
use std::collections::HashMap;

/// A plate seen more than once in the working set
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MultiEntryVehicle {
    pub license_plate: String,
    pub entries: usize,
    pub total_minutes: f64,
    pub total_hours: f64,
    pub first_arrival: Option<DateTime<Utc>>,
    pub last_arrival: Option<DateTime<Utc>>,
    pub first_arrival_local: Option<DateTime<FixedOffset>>,
    pub last_arrival_local: Option<DateTime<FixedOffset>>,
}

#[derive(Default)]
struct PlateGroup {
    entries: usize,
    total_minutes: f64,
    first_arrival: Option<DateTime<Utc>>,
    last_arrival: Option<DateTime<Utc>>,
}

/// Plates with more than one entry, most entries first, then most recent
/// last arrival. Events without a plate are not grouped.
pub fn multi_entry_vehicles(events: &[ParkingEvent], offset: FixedOffset) -> Vec<MultiEntryVehicle> {
    let mut groups: HashMap<&str, PlateGroup> = HashMap::new();

    for event in events {
        let Some(plate) = event.license_plate.as_deref() else {
            continue;
        };
        let group = groups.entry(plate).or_default();
        group.entries += 1;
        group.total_minutes += event.duration_min().unwrap_or(0.0);
        if let Some(arrival) = event.arrival_time {
            group.first_arrival = Some(group.first_arrival.map_or(arrival, |t| t.min(arrival)));
            group.last_arrival = Some(group.last_arrival.map_or(arrival, |t| t.max(arrival)));
        }
    }

    let mut vehicles: Vec<MultiEntryVehicle> = groups
        .into_iter()
        .filter(|(_, group)| group.entries > 1)
        .map(|(plate, group)| MultiEntryVehicle {
            license_plate: plate.to_string(),
            entries: group.entries,
            total_minutes: group.total_minutes,
            total_hours: round2(group.total_minutes / 60.0),
            first_arrival: group.first_arrival,
            last_arrival: group.last_arrival,
            first_arrival_local: group.first_arrival.map(|t| t.with_timezone(&offset)),
            last_arrival_local: group.last_arrival.map(|t| t.with_timezone(&offset)),
        })
        .collect();

    vehicles.sort_by(|a, b| {
        b.entries
            .cmp(&a.entries)
            .then_with(|| b.last_arrival.cmp(&a.last_arrival))
            .then_with(|| a.license_plate.cmp(&b.license_plate))
    });
    vehicles
}
