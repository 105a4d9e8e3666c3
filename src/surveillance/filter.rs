use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{period::Period, record::ResistanceRecord};

/// Records with `start <= month <= end`.
pub fn filter_by_range(records: &[ResistanceRecord], start: Period, end: Period) -> Vec<ResistanceRecord> {
    records
        .iter()
        .filter(|r| r.month >= start && r.month <= end)
        .cloned()
        .collect()
}

/// Records whose normalized `day` is exactly `day`.
pub fn filter_by_exact_day(records: &[ResistanceRecord], day: NaiveDate) -> Vec<ResistanceRecord> {
    records.iter().filter(|r| r.day == day).cloned().collect()
}

/// The active selection: a month range, optionally overridden by one exact day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodFilter {
    pub start: Period,
    pub end: Period,
    pub day: Option<NaiveDate>,
}

impl PeriodFilter {
    /// The whole catalog year, no day override.
    pub fn full_year(year: i32) -> Option<Self> {
        Some(Self {
            start: Period::new(year, 1)?,
            end: Period::new(year, 12)?,
            day: None,
        })
    }

    pub fn with_day(mut self, day: Option<NaiveDate>) -> Self {
        self.day = day;
        self
    }

    pub fn apply(&self, records: &[ResistanceRecord]) -> Vec<ResistanceRecord> {
        match self.day {
            Some(day) => filter_by_exact_day(records, day),
            None => filter_by_range(records, self.start, self.end),
        }
    }
}
