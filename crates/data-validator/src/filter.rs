//! Arrival Date-Range Filter

use crate::error::ValidationError;
use crate::event::ParkingEvent;
use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

/// Inclusive range of arrival dates.
///
/// Membership uses the UTC calendar date of `arrival_time`; events without an
/// arrival time fall outside every range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ValidationError> {
        if start > end {
            return Err(ValidationError::InvalidDateRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Earliest to latest arrival date in `events`, or `None` if no event has
    /// an arrival time.
    pub fn spanning(events: &[ParkingEvent]) -> Option<Self> {
        let mut dates = events
            .iter()
            .filter_map(|e| e.arrival_time.map(|ts| ts.date_naive()));
        let first = dates.next()?;
        let (start, end) = dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d)));
        Some(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, event: &ParkingEvent) -> bool {
        event
            .arrival_time
            .map(|ts| ts.date_naive())
            .is_some_and(|d| d >= self.start && d <= self.end)
    }

    /// Events inside the range, in input order
    pub fn apply(&self, events: &[ParkingEvent]) -> Vec<ParkingEvent> {
        let filtered: Vec<ParkingEvent> = events
            .iter()
            .filter(|e| self.contains(e))
            .cloned()
            .collect();
        debug!(
            "Date filter {}..={} kept {} of {} events",
            self.start,
            self.end,
            filtered.len(),
            events.len()
        );
        filtered
    }
}
