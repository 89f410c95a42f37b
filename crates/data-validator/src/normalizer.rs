//! Field Normalization
//!
//! Coerces raw source cells into canonical numeric, temporal, and string
//! forms. A value that cannot be coerced becomes `None`; normalization never
//! fails the batch.

use crate::error::ValidationError;
use crate::event::{ParkingEvent, RawParkingEvent, RawValue};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Offset, TimeZone, Timelike, Utc};
use serde::Serialize;
use tracing::debug;

/// Australia/Perth (UTC+08:00, no daylight saving)
pub const DEFAULT_UTC_OFFSET_MINUTES: i32 = 8 * 60;

const OFFSET_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%z"];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Coerce a raw cell to a finite float.
pub fn coerce_number(raw: &RawValue) -> Option<f64> {
    let value = match raw {
        RawValue::Number(n) => *n,
        RawValue::Text(text) => text.trim().parse::<f64>().ok()?,
        RawValue::Flag(_) => return None,
    };
    value.is_finite().then_some(value)
}

/// Trimmed plate, or `None` when absent or blank.
pub fn coerce_plate(raw: Option<&str>) -> Option<String> {
    let trimmed = raw?.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Parse an arrival timestamp. Naive timestamps are taken as UTC.
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts.with_timezone(&Utc));
    }

    for fmt in OFFSET_FORMATS {
        if let Ok(ts) = DateTime::parse_from_str(text, fmt) {
            return Some(ts.with_timezone(&Utc));
        }
    }

    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Counts of fields that were present in the source but could not be coerced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NormalizationStats {
    pub rows: usize,
    pub unparsed_arrival: usize,
    pub unparsed_duration: usize,
    pub unparsed_latitude: usize,
    pub unparsed_longitude: usize,
    pub blank_plates: usize,
}

impl NormalizationStats {
    /// Total degraded fields across all rows
    pub fn degraded(&self) -> usize {
        self.unparsed_arrival
            + self.unparsed_duration
            + self.unparsed_latitude
            + self.unparsed_longitude
            + self.blank_plates
    }
}

/// Normalizer from raw rows to [`ParkingEvent`]s
#[derive(Debug, Clone, Copy)]
pub struct Normalizer {
    /// Local calendar used for the derived date and hour
    offset: FixedOffset,
}

impl Normalizer {
    /// Create a normalizer using the given local offset
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// Create a normalizer from an offset in minutes east of UTC
    pub fn with_utc_offset_minutes(minutes: i32) -> Result<Self, ValidationError> {
        minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .map(Self::new)
            .ok_or(ValidationError::OutOfRange {
                field: "utc_offset_minutes",
                value: minutes as f64,
                min: -1439.0,
                max: 1439.0,
            })
    }

    /// Local offset used for derived fields
    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Normalize a single row
    pub fn normalize(&self, raw: &RawParkingEvent) -> ParkingEvent {
        let arrival_time = raw.arrival_time.as_deref().and_then(parse_timestamp);
        let local = arrival_time.map(|ts| ts.with_timezone(&self.offset));

        ParkingEvent {
            arrival_time,
            duration_seconds: raw.duration_seconds.as_ref().and_then(coerce_number),
            latitude: raw.latitude.as_ref().and_then(coerce_number),
            longitude: raw.longitude.as_ref().and_then(coerce_number),
            bay_id: raw.bay_id.clone(),
            license_plate: coerce_plate(raw.license_plate.as_deref()),
            date: local.map(|ts| ts.date_naive()),
            hour: local.map(|ts| ts.hour()),
        }
    }

    /// Normalize a batch, counting fields that degraded to `None`
    pub fn normalize_batch(&self, raws: &[RawParkingEvent]) -> (Vec<ParkingEvent>, NormalizationStats) {
        let mut stats = NormalizationStats {
            rows: raws.len(),
            ..Default::default()
        };

        let events: Vec<ParkingEvent> = raws
            .iter()
            .map(|raw| {
                let event = self.normalize(raw);
                if raw.arrival_time.is_some() && event.arrival_time.is_none() {
                    stats.unparsed_arrival += 1;
                }
                if raw.duration_seconds.is_some() && event.duration_seconds.is_none() {
                    stats.unparsed_duration += 1;
                }
                if raw.latitude.is_some() && event.latitude.is_none() {
                    stats.unparsed_latitude += 1;
                }
                if raw.longitude.is_some() && event.longitude.is_none() {
                    stats.unparsed_longitude += 1;
                }
                if raw.license_plate.is_some() && event.license_plate.is_none() {
                    stats.blank_plates += 1;
                }
                event
            })
            .collect();

        debug!(
            "Normalized {} rows ({} degraded fields: arrival={}, duration={}, lat={}, lon={}, blank plates={})",
            stats.rows,
            stats.degraded(),
            stats.unparsed_arrival,
            stats.unparsed_duration,
            stats.unparsed_latitude,
            stats.unparsed_longitude,
            stats.blank_plates
        );

        (events, stats)
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(FixedOffset::east_opt(DEFAULT_UTC_OFFSET_MINUTES * 60).unwrap_or(Utc.fix()))
    }
}
