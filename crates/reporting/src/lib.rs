//! Parking Reports
//!
//! Pure summaries over a classification run: headline KPIs, utilization by
//! bay, arrivals by hour, stay durations, and repeat vehicles.

mod bays;
mod durations;
mod hourly;
mod statistics;
mod vehicles;

pub use bays::{utilization_by_bay, BayUtilization, StayTerm, ONE_DAY_MIN};
pub use durations::{top_vehicles_by_time, DurationHistogram, HistogramBin, VehicleTotal};
pub use hourly::{arrivals_by_hour, HourlyArrivals};
pub use statistics::{median, round2, Summary};
pub use vehicles::{multi_entry_vehicles, MultiEntryVehicle};

use chrono::FixedOffset;
use data_validator::{Classification, FenceMeta, ParkingEvent, RejectionReason};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, warn};

/// Report configuration errors
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ReportError {
    #[error("{field} must be at least 1")]
    ZeroLimit { field: &'static str },
}

/// Report configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Bays and vehicles listed in ranked tables
    pub top_n: usize,
    /// Bins in the stay duration histogram
    pub histogram_bins: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            top_n: 20,
            histogram_bins: 100,
        }
    }
}

impl ReportConfig {
    pub fn validate(&self) -> Result<(), ReportError> {
        if self.top_n == 0 {
            return Err(ReportError::ZeroLimit { field: "top_n" });
        }
        if self.histogram_bins == 0 {
            return Err(ReportError::ZeroLimit {
                field: "histogram_bins",
            });
        }
        Ok(())
    }
}

/// Headline figures over accepted rows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kpis {
    pub total_stays: usize,
    pub unique_vehicles: usize,
    pub total_occupied_hours: f64,
    pub rejected_rows: usize,
}

impl Kpis {
    pub fn compute(classification: &Classification) -> Self {
        let unique_vehicles = classification
            .accepted
            .iter()
            .filter_map(|r| r.event.license_plate.as_deref())
            .collect::<HashSet<_>>()
            .len();
        let total_minutes: f64 = classification
            .accepted
            .iter()
            .filter_map(|r| r.event.duration_min())
            .sum();

        Self {
            total_stays: classification.accepted.len(),
            unique_vehicles,
            total_occupied_hours: round2(total_minutes / 60.0),
            rejected_rows: classification.rejected.len(),
        }
    }
}

/// Rejected rows per reason
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReasonCount {
    pub reason: RejectionReason,
    pub count: usize,
}

/// Every summary for one run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub kpis: Kpis,
    pub fences: FenceMeta,
    pub rejection_reasons: Vec<ReasonCount>,
    pub long_stay_bays: Vec<BayUtilization>,
    pub short_stay_bays: Vec<BayUtilization>,
    pub arrivals_by_hour: Vec<HourlyArrivals>,
    pub durations: DurationHistogram,
    pub top_vehicles: Vec<VehicleTotal>,
    pub multi_entry_vehicles: Vec<MultiEntryVehicle>,
}

impl Report {
    /// Build all summaries. `filtered` is the pre-classification working set
    /// that `classification` was computed from; repeat-vehicle detection
    /// runs over it rather than over the accepted rows.
    pub fn build(
        filtered: &[ParkingEvent],
        classification: &Classification,
        offset: FixedOffset,
        config: &ReportConfig,
    ) -> Self {
        let accepted = &classification.accepted;
        if accepted.is_empty() {
            warn!("No accepted rows; accepted-set summaries will be empty");
        }

        let report = Self {
            kpis: Kpis::compute(classification),
            fences: classification.fences,
            rejection_reasons: classification
                .reason_counts()
                .into_iter()
                .map(|(reason, count)| ReasonCount { reason, count })
                .collect(),
            long_stay_bays: utilization_by_bay(accepted, StayTerm::Long, config.top_n),
            short_stay_bays: utilization_by_bay(accepted, StayTerm::Short, config.top_n),
            arrivals_by_hour: arrivals_by_hour(accepted),
            durations: DurationHistogram::build(accepted, config.histogram_bins),
            top_vehicles: top_vehicles_by_time(accepted, config.top_n),
            multi_entry_vehicles: multi_entry_vehicles(filtered, offset),
        };

        debug!(
            "Report built: {} stays, {} repeat vehicles",
            report.kpis.total_stays,
            report.multi_entry_vehicles.len()
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use data_validator::Classifier;

    fn perth() -> FixedOffset {
        FixedOffset::east_opt(8 * 3600).unwrap()
    }

    fn event(lat: Option<f64>, plate: Option<&str>, minutes: f64, day: u32) -> ParkingEvent {
        let arrival = Utc.with_ymd_and_hms(2024, 3, day, 2, 0, 0).unwrap();
        ParkingEvent {
            arrival_time: Some(arrival),
            duration_seconds: Some(minutes * 60.0),
            latitude: lat,
            longitude: Some(115.97),
            bay_id: Some("A1".to_string()),
            license_plate: plate.map(str::to_string),
            hour: Some(10),
            ..Default::default()
        }
    }

    #[test]
    fn test_report_uses_filtered_set_for_repeat_vehicles() {
        let events = vec![
            event(Some(-31.94), Some("AAA111"), 60.0, 1),
            event(None, Some("AAA111"), 30.0, 2),
            event(Some(-31.94), Some("BBB222"), 2000.0, 2),
        ];
        let classification = Classifier::default().classify(&events);
        let report = Report::build(&events, &classification, perth(), &ReportConfig::default());

        assert_eq!(report.kpis.total_stays, 2);
        assert_eq!(report.kpis.rejected_rows, 1);
        assert_eq!(report.kpis.unique_vehicles, 2);
        assert_eq!(report.kpis.total_occupied_hours, round2(2060.0 / 60.0));

        // The rejected stay still counts toward AAA111's entries
        assert_eq!(report.multi_entry_vehicles.len(), 1);
        assert_eq!(report.multi_entry_vehicles[0].entries, 2);
        assert_eq!(report.multi_entry_vehicles[0].total_minutes, 90.0);

        assert_eq!(report.long_stay_bays.len(), 1);
        assert_eq!(report.short_stay_bays[0].total_hours, 1.0);
        assert_eq!(report.arrivals_by_hour[0].count, 2);
        assert_eq!(report.rejection_reasons[0].count, 1);
    }

    #[test]
    fn test_all_rejected_gives_empty_summaries() {
        let events = vec![event(None, None, 60.0, 1), event(None, None, 60.0, 1)];
        let classification = Classifier::default().classify(&events);
        let report = Report::build(&events, &classification, perth(), &ReportConfig::default());

        assert_eq!(report.kpis.total_stays, 0);
        assert_eq!(report.kpis.total_occupied_hours, 0.0);
        assert!(report.long_stay_bays.is_empty());
        assert!(report.arrivals_by_hour.is_empty());
        assert!(report.durations.bins.is_empty());
        assert!(report.top_vehicles.is_empty());
    }

    #[test]
    fn test_config_validation() {
        assert!(ReportConfig::default().validate().is_ok());
        let config = ReportConfig {
            histogram_bins: 0,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ReportError::ZeroLimit {
                field: "histogram_bins"
            })
        );
    }

    #[test]
    fn test_report_serializes() {
        let events = vec![event(Some(-31.94), Some("AAA111"), 60.0, 1)];
        let classification = Classifier::default().classify(&events);
        let report = Report::build(&events, &classification, perth(), &ReportConfig::default());
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["kpis"]["total_stays"], 1);
        assert_eq!(json["rejection_reasons"][0]["reason"], "NULL_COORDS");
    }
}
