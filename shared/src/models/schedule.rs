//! Operating Schedule Model
//!
//! Per-weekday open intervals (e.g. lunch 12:00-14:30, dinner 19:00-22:30).
//! Closed days carry no intervals. Clock times travel as `HH:MM` strings,
//! same convention as the business-day cutoff in store settings.

use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

/// One open interval within a day, `[open, close)`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OpenInterval {
    /// Opening time, `HH:MM`
    pub open: String,
    /// Closing time, `HH:MM` (exclusive)
    pub close: String,
}

impl OpenInterval {
    pub fn new(open: impl Into<String>, close: impl Into<String>) -> Self {
        Self {
            open: open.into(),
            close: close.into(),
        }
    }

    /// Parse `open`, failing on malformed input
    pub fn open_time(&self) -> Option<NaiveTime> {
        NaiveTime::parse_from_str(&self.open, "%H:%M").ok()
    }

    /// Parse `close`, failing on malformed input
    pub fn close_time(&self) -> Option<NaiveTime> {
        NaiveTime::parse_from_str(&self.close, "%H:%M").ok()
    }
}

/// Weekly operating schedule
///
/// Index 0 = Monday .. 6 = Sunday (ISO weekday order).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OperatingSchedule {
    pub days: [Vec<OpenInterval>; 7],
}

impl OperatingSchedule {
    /// Open intervals for the given weekday (empty = closed)
    pub fn intervals_for(&self, weekday: Weekday) -> &[OpenInterval] {
        &self.days[weekday.num_days_from_monday() as usize]
    }

    /// Same schedule every day - convenience for seeding and tests
    pub fn uniform(intervals: Vec<OpenInterval>) -> Self {
        Self {
            days: std::array::from_fn(|_| intervals.clone()),
        }
    }
}
