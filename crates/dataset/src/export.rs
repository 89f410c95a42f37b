//! CSV Export

use crate::DatasetError;
use data_validator::ClassifiedRecord;
use reporting::MultiEntryVehicle;
use serde::Serialize;
use std::io::Write;

pub const REJECTED_COLUMNS: [&str; 7] = [
    "bay_id",
    "license_plate",
    "latitude",
    "longitude",
    "arrival_time",
    "duration_min",
    "reject_reason",
];

pub const MULTI_ENTRY_COLUMNS: [&str; 6] = [
    "license_plate",
    "entries",
    "total_minutes",
    "total_hours",
    "first_arrival_local",
    "last_arrival_local",
];

#[derive(Serialize)]
struct RejectedRow<'a> {
    bay_id: Option<&'a str>,
    license_plate: Option<&'a str>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    arrival_time: Option<String>,
    duration_min: Option<f64>,
    reject_reason: String,
}

impl<'a> From<&'a ClassifiedRecord> for RejectedRow<'a> {
    fn from(record: &'a ClassifiedRecord) -> Self {
        let event = &record.event;
        Self {
            bay_id: event.bay_id.as_deref(),
            license_plate: event.license_plate.as_deref(),
            latitude: event.latitude,
            longitude: event.longitude,
            arrival_time: event.arrival_time.map(|t| t.to_rfc3339()),
            duration_min: event.duration_min(),
            reject_reason: record.reject_reason(),
        }
    }
}

#[derive(Serialize)]
struct MultiEntryRow<'a> {
    license_plate: &'a str,
    entries: usize,
    total_minutes: f64,
    total_hours: f64,
    first_arrival_local: Option<String>,
    last_arrival_local: Option<String>,
}

impl<'a> From<&'a MultiEntryVehicle> for MultiEntryRow<'a> {
    fn from(vehicle: &'a MultiEntryVehicle) -> Self {
        Self {
            license_plate: &vehicle.license_plate,
            entries: vehicle.entries,
            total_minutes: vehicle.total_minutes,
            total_hours: vehicle.total_hours,
            first_arrival_local: vehicle.first_arrival_local.map(|t| t.to_rfc3339()),
            last_arrival_local: vehicle.last_arrival_local.map(|t| t.to_rfc3339()),
        }
    }
}

fn write_rows<W, T, I>(writer: W, header: &[&str], rows: I) -> Result<(), DatasetError>
where
    W: Write,
    T: Serialize,
    I: IntoIterator<Item = T>,
{
    // Header written explicitly so an empty table still has one
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
    writer.write_record(header)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Write rejected rows with their reasons
pub fn write_rejected_csv<W: Write>(
    writer: W,
    rejected: &[ClassifiedRecord],
) -> Result<(), DatasetError> {
    write_rows(writer, &REJECTED_COLUMNS, rejected.iter().map(RejectedRow::from))
}

/// Write the repeat-vehicle table
pub fn write_multi_entry_csv<W: Write>(
    writer: W,
    vehicles: &[MultiEntryVehicle],
) -> Result<(), DatasetError> {
    write_rows(writer, &MULTI_ENTRY_COLUMNS, vehicles.iter().map(MultiEntryRow::from))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone, Utc};
    use data_validator::{ParkingEvent, ReasonSet, RejectionReason};

    #[test]
    fn test_rejected_csv() {
        let record = ClassifiedRecord {
            event: ParkingEvent {
                arrival_time: Some(Utc.with_ymd_and_hms(2024, 3, 1, 2, 30, 0).unwrap()),
                duration_seconds: Some(5400.0),
                latitude: None,
                longitude: Some(115.9),
                bay_id: Some("A12".into()),
                license_plate: None,
                ..Default::default()
            },
            reasons: [RejectionReason::NullCoords, RejectionReason::NullPlate]
                .into_iter()
                .collect::<ReasonSet>(),
        };

        let mut out = Vec::new();
        write_rejected_csv(&mut out, &[record]).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(lines[0], REJECTED_COLUMNS.join(","));
        assert_eq!(
            lines[1],
            "A12,,,115.9,2024-03-01T02:30:00+00:00,90.0,\"NULL_COORDS,NULL_PLATE\""
        );
    }

    #[test]
    fn test_empty_tables_keep_header() {
        let mut out = Vec::new();
        write_multi_entry_csv(&mut out, &[]).unwrap();
        assert_eq!(String::from_utf8(out).unwrap().trim_end(), MULTI_ENTRY_COLUMNS.join(","));
    }

    #[test]
    fn test_multi_entry_csv() {
        let perth = FixedOffset::east_opt(8 * 3600).unwrap();
        let first = Utc.with_ymd_and_hms(2024, 3, 1, 2, 0, 0).unwrap();
        let last = Utc.with_ymd_and_hms(2024, 3, 4, 2, 0, 0).unwrap();
        let vehicle = MultiEntryVehicle {
            license_plate: "AAA111".into(),
            entries: 2,
            total_minutes: 150.0,
            total_hours: 2.5,
            first_arrival: Some(first),
            last_arrival: Some(last),
            first_arrival_local: Some(first.with_timezone(&perth)),
            last_arrival_local: Some(last.with_timezone(&perth)),
        };

        let mut out = Vec::new();
        write_multi_entry_csv(&mut out, &[vehicle]).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text.lines().nth(1),
            Some("AAA111,2,150.0,2.5,2024-03-01T10:00:00+08:00,2024-03-04T10:00:00+08:00")
        );
    }
}
