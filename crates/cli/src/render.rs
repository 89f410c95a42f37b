//! Report Rendering

use data_validator::{DateRange, NormalizationStats};
use reporting::{BayUtilization, Report};
use serde::Serialize;
use std::fmt::{self, Write};

pub const EMPTY_STATE: &str = "No data after filtering.";

/// Everything printed for one run
#[derive(Debug, Serialize)]
pub struct RunSummary<'a> {
    pub input: &'a str,
    pub range: Option<DateRange>,
    pub fence_multiplier: f64,
    pub normalization: NormalizationStats,
    pub filtered_rows: usize,
    pub report: &'a Report,
}

fn bound(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:.6}", v))
}

fn opt2(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:.2}", v))
}

fn write_bays<W: Write>(out: &mut W, title: &str, bays: &[BayUtilization]) -> fmt::Result {
    writeln!(out, "\n{}", title)?;
    if bays.is_empty() {
        return writeln!(out, "  (none)");
    }
    for bay in bays {
        writeln!(
            out,
            "  {:<12} {:>10.2} h  {:>5} stays",
            bay.bay_id, bay.total_hours, bay.stays
        )?;
    }
    Ok(())
}

/// Human-readable report
pub fn write_text<W: Write>(out: &mut W, run: &RunSummary<'_>) -> fmt::Result {
    let report = run.report;

    writeln!(out, "Parking data quality report")?;
    writeln!(out, "  Input:        {}", run.input)?;
    match &run.range {
        Some(range) => writeln!(out, "  Date range:   {} to {}", range.start(), range.end())?,
        None => writeln!(out, "  Date range:   all rows")?,
    }
    writeln!(out, "  Fence k:      {}", run.fence_multiplier)?;
    writeln!(
        out,
        "  Rows:         {} loaded, {} in range, {} unparsed fields",
        run.normalization.rows,
        run.filtered_rows,
        run.normalization.degraded()
    )?;

    let kpis = &report.kpis;
    writeln!(out, "\nSummary")?;
    writeln!(out, "  Total stays:          {}", kpis.total_stays)?;
    writeln!(out, "  Unique vehicles:      {}", kpis.unique_vehicles)?;
    writeln!(out, "  Total occupied hours: {:.2}", kpis.total_occupied_hours)?;
    writeln!(out, "  Rejected rows:        {}", kpis.rejected_rows)?;

    let fences = &report.fences;
    writeln!(out, "\nCoordinate fences")?;
    writeln!(out, "  Latitude:  [{}, {}]", bound(fences.lat_low), bound(fences.lat_high))?;
    writeln!(out, "  Longitude: [{}, {}]", bound(fences.lon_low), bound(fences.lon_high))?;

    writeln!(out, "\nRejection reasons")?;
    if kpis.rejected_rows == 0 {
        writeln!(out, "  (none)")?;
    }
    for entry in report.rejection_reasons.iter().filter(|e| e.count > 0) {
        writeln!(out, "  {:<12} {}", entry.reason.label(), entry.count)?;
    }

    if kpis.total_stays == 0 {
        return writeln!(out, "\n{}", EMPTY_STATE);
    }

    write_bays(out, "Long-stay bays (>= 1 day)", &report.long_stay_bays)?;
    write_bays(out, "Short-stay bays (< 1 day)", &report.short_stay_bays)?;

    writeln!(out, "\nArrivals by hour")?;
    for hour in &report.arrivals_by_hour {
        writeln!(
            out,
            "  {:02}:00  {:>6} arrivals  median {} min",
            hour.hour,
            hour.count,
            opt2(hour.median_min)
        )?;
    }

    let summary = &report.durations.summary;
    writeln!(out, "\nStay durations (hours)")?;
    writeln!(
        out,
        "  count {}  mean {}  median {}  min {}  max {}",
        summary.count,
        opt2(summary.mean),
        opt2(summary.median),
        opt2(summary.min),
        opt2(summary.max)
    )?;

    writeln!(out, "\nTop vehicles by time")?;
    for vehicle in &report.top_vehicles {
        writeln!(out, "  {:<12} {:>10.2} h", vehicle.license_plate, vehicle.total_hours)?;
    }

    writeln!(out, "\nVehicles with multiple entries")?;
    if report.multi_entry_vehicles.is_empty() {
        writeln!(out, "  (none)")?;
    }
    for vehicle in &report.multi_entry_vehicles {
        let last = vehicle
            .last_arrival_local
            .map_or_else(|| "n/a".to_string(), |t| t.format("%Y-%m-%d %H:%M").to_string());
        writeln!(
            out,
            "  {:<12} {:>4} entries  {:>10.2} h  last {}",
            vehicle.license_plate, vehicle.entries, vehicle.total_hours, last
        )?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone, Utc};
    use data_validator::{Classifier, ParkingEvent};
    use reporting::ReportConfig;

    fn event(plate: Option<&str>, lat: Option<f64>, day: u32) -> ParkingEvent {
        ParkingEvent {
            arrival_time: Some(Utc.with_ymd_and_hms(2024, 3, day, 2, 0, 0).unwrap()),
            duration_seconds: Some(5400.0),
            latitude: lat,
            longitude: Some(115.97),
            bay_id: Some("A1".to_string()),
            license_plate: plate.map(str::to_string),
            date: None,
            hour: Some(10),
        }
    }

    fn render(events: &[ParkingEvent]) -> String {
        let classification = Classifier::default().classify(events);
        let report = Report::build(
            events,
            &classification,
            FixedOffset::east_opt(8 * 3600).unwrap(),
            &ReportConfig::default(),
        );
        let run = RunSummary {
            input: "parking.csv",
            range: None,
            fence_multiplier: 4.5,
            normalization: NormalizationStats::default(),
            filtered_rows: events.len(),
            report: &report,
        };
        let mut out = String::new();
        write_text(&mut out, &run).unwrap();
        out
    }

    #[test]
    fn test_text_report() {
        let events = vec![
            event(Some("AAA111"), Some(-31.94), 1),
            event(Some("AAA111"), Some(-31.94), 2),
            event(None, Some(-31.94), 3),
        ];
        let text = render(&events);

        assert!(text.contains("Total stays:          2"));
        assert!(text.contains("Total occupied hours: 3.00"));
        assert!(text.contains("NULL_PLATE   1"));
        assert!(text.contains("Latitude:  [-31.940000, -31.940000]"));
        assert!(text.contains("AAA111"));
        assert!(text.contains("Date range:   all rows"));
        assert!(!text.contains(EMPTY_STATE));
    }

    #[test]
    fn test_empty_state() {
        let text = render(&[event(None, None, 1)]);
        assert!(text.contains("NULL_COORDS  1"));
        assert!(text.trim_end().ends_with(EMPTY_STATE));

        let text = render(&[]);
        assert!(text.contains("Rejection reasons\n  (none)"));
        assert!(text.contains("Latitude:  [-90.000000, 90.000000]"));
        assert!(text.trim_end().ends_with(EMPTY_STATE));
    }

    #[test]
    fn test_json_summary_shape() {
        let events = vec![event(Some("AAA111"), Some(-31.94), 1)];
        let classification = Classifier::default().classify(&events);
        let report = Report::build(
            &events,
            &classification,
            FixedOffset::east_opt(8 * 3600).unwrap(),
            &ReportConfig::default(),
        );
        let run = RunSummary {
            input: "parking.csv",
            range: None,
            fence_multiplier: 4.5,
            normalization: NormalizationStats::default(),
            filtered_rows: 1,
            report: &report,
        };
        let value = serde_json::to_value(&run).unwrap();
        assert_eq!(value["report"]["kpis"]["total_stays"], 1);
        assert_eq!(value["fence_multiplier"], 4.5);
        assert!(value["range"].is_null());
    }
}
