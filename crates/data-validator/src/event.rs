//! Parking Event Records

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A scalar cell as the source produced it, before coercion.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Text(String),
    Flag(bool),
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Number(value)
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

impl<'de> Deserialize<'de> for RawValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct RawValueVisitor;

        impl<'de> Visitor<'de> for RawValueVisitor {
            type Value = RawValue;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a number, string, or boolean")
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> Result<RawValue, E> {
                Ok(RawValue::Flag(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<RawValue, E> {
                Ok(RawValue::Number(v as f64))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<RawValue, E> {
                Ok(RawValue::Number(v as f64))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<RawValue, E> {
                Ok(RawValue::Number(v))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<RawValue, E> {
                Ok(RawValue::Text(v.to_string()))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<RawValue, E> {
                Ok(RawValue::Text(v))
            }
        }

        deserializer.deserialize_any(RawValueVisitor)
    }
}

/// One source row. Every column is optional; a missing column is all-null.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawParkingEvent {
    pub arrival_time: Option<String>,
    pub duration_seconds: Option<RawValue>,
    pub latitude: Option<RawValue>,
    pub longitude: Option<RawValue>,
    pub bay_id: Option<String>,
    pub license_plate: Option<String>,
}

/// A normalized parking session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParkingEvent {
    pub arrival_time: Option<DateTime<Utc>>,
    pub duration_seconds: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub bay_id: Option<String>,
    /// Trimmed plate; `None` when absent or blank
    pub license_plate: Option<String>,
    /// Local calendar date of arrival
    pub date: Option<NaiveDate>,
    /// Local hour of arrival (0-23)
    pub hour: Option<u32>,
}

impl ParkingEvent {
    /// Stay length in minutes
    pub fn duration_min(&self) -> Option<f64> {
        self.duration_seconds.map(|s| s / 60.0)
    }

    /// Stay length in hours
    pub fn duration_hr(&self) -> Option<f64> {
        self.duration_min().map(|m| m / 60.0)
    }

    /// Coordinate value for the given axis
    pub fn coordinate(&self, axis: Axis) -> Option<f64> {
        match axis {
            Axis::Latitude => self.latitude,
            Axis::Longitude => self.longitude,
        }
    }
}

/// Fenced coordinate column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    Latitude,
    Longitude,
}

impl Axis {
    pub fn name(self) -> &'static str {
        match self {
            Axis::Latitude => "latitude",
            Axis::Longitude => "longitude",
        }
    }
}
