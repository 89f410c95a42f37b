//! Utilization by Bay

use data_validator::ClassifiedRecord;
use serde::Serialize;
use std::collections::HashMap;

/// Stays of at least this many minutes count as long-term
pub const ONE_DAY_MIN: f64 = 24.0 * 60.0;

/// Stay length class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StayTerm {
    /// One day or longer
    Long,
    /// Under one day
    Short,
}

impl StayTerm {
    /// Classify a stay; `None` for unknown durations
    pub fn of(duration_min: Option<f64>) -> Option<Self> {
        let minutes = duration_min?;
        Some(if minutes >= ONE_DAY_MIN {
            StayTerm::Long
        } else {
            StayTerm::Short
        })
    }
}

/// Occupied hours for one bay
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BayUtilization {
    pub bay_id: String,
    pub total_hours: f64,
    pub stays: usize,
}

/// Total occupied hours per bay for stays of the given term, busiest first,
/// limited to `limit` bays. Rows without a bay or duration are skipped.
pub fn utilization_by_bay(
    accepted: &[ClassifiedRecord],
    term: StayTerm,
    limit: usize,
) -> Vec<BayUtilization> {
    let mut by_bay: HashMap<&str, (f64, usize)> = HashMap::new();

    for record in accepted {
        let event = &record.event;
        let (Some(bay), Some(minutes)) = (event.bay_id.as_deref(), event.duration_min()) else {
            continue;
        };
        if StayTerm::of(Some(minutes)) != Some(term) {
            continue;
        }
        let entry = by_bay.entry(bay).or_insert((0.0, 0));
        entry.0 += minutes;
        entry.1 += 1;
    }

    let mut bays: Vec<BayUtilization> = by_bay
        .into_iter()
        .map(|(bay, (minutes, stays))| BayUtilization {
            bay_id: bay.to_string(),
            total_hours: minutes / 60.0,
            stays,
        })
        .collect();

    // Ties broken by bay id so output is stable
    bays.sort_by(|a, b| {
        b.total_hours
            .total_cmp(&a.total_hours)
            .then_with(|| a.bay_id.cmp(&b.bay_id))
    });
    bays.truncate(limit);
    bays
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_validator::{ParkingEvent, ReasonSet};

    fn stay(bay: Option<&str>, minutes: Option<f64>) -> ClassifiedRecord {
        ClassifiedRecord {
            event: ParkingEvent {
                bay_id: bay.map(str::to_string),
                duration_seconds: minutes.map(|m| m * 60.0),
                ..Default::default()
            },
            reasons: ReasonSet::new(),
        }
    }

    #[test]
    fn test_stay_term_boundary() {
        assert_eq!(StayTerm::of(Some(1440.0)), Some(StayTerm::Long));
        assert_eq!(StayTerm::of(Some(1439.9)), Some(StayTerm::Short));
        assert_eq!(StayTerm::of(None), None);
    }

    #[test]
    fn test_long_and_short_split() {
        let records = vec![
            stay(Some("A1"), Some(2880.0)),
            stay(Some("A1"), Some(60.0)),
            stay(Some("B2"), Some(1440.0)),
            stay(Some("B2"), Some(120.0)),
            stay(Some("B2"), Some(30.0)),
            stay(None, Some(5000.0)),
            stay(Some("C3"), None),
        ];

        let long = utilization_by_bay(&records, StayTerm::Long, 20);
        assert_eq!(long.len(), 2);
        assert_eq!(long[0].bay_id, "A1");
        assert_eq!(long[0].total_hours, 48.0);
        assert_eq!(long[1].bay_id, "B2");
        assert_eq!(long[1].total_hours, 24.0);

        let short = utilization_by_bay(&records, StayTerm::Short, 20);
        assert_eq!(short.len(), 2);
        assert_eq!(short[0].bay_id, "B2");
        assert_eq!(short[0].total_hours, 2.5);
        assert_eq!(short[0].stays, 2);
        assert_eq!(short[1].bay_id, "A1");
    }

    #[test]
    fn test_limit() {
        let records: Vec<_> = (0..30)
            .map(|i| stay(Some(&format!("B{i:02}")), Some(10.0 + i as f64)))
            .collect();
        let top = utilization_by_bay(&records, StayTerm::Short, 20);
        assert_eq!(top.len(), 20);
        assert_eq!(top[0].bay_id, "B29");
    }

    #[test]
    fn test_empty() {
        assert!(utilization_by_bay(&[], StayTerm::Long, 20).is_empty());
    }
}
