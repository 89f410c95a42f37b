//! CSV Loading

use crate::DatasetError;
use csv::{ReaderBuilder, Trim};
use data_validator::RawParkingEvent;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// Read raw rows from CSV with a header line.
///
/// Columns are matched by name; unknown columns are ignored and missing ones
/// read as null. Rows may have fewer fields than the header.
pub fn read_events<R: Read>(reader: R) -> Result<Vec<RawParkingEvent>, DatasetError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::Headers)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    debug!("CSV headers: {:?}", headers);

    let mut events = Vec::new();
    for row in reader.records() {
        let mut record = row?;
        // Short rows read their missing trailing columns as null
        while record.len() < headers.len() {
            record.push_field("");
        }
        events.push(record.deserialize::<RawParkingEvent>(Some(&headers))?);
    }
    Ok(events)
}

/// Load raw rows from a CSV file
pub fn load_csv(path: &Path) -> Result<Vec<RawParkingEvent>, DatasetError> {
    let file = File::open(path).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let events = read_events(file)?;
    info!("Loaded {} rows from {}", events.len(), path.display());
    Ok(events)
}
