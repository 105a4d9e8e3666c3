//! Monthly reporting periods and the label formats they are exported under.

use anyhow::anyhow;
use chrono::{Datelike, Month, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

static LABEL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z]+)\.?(?:[\s/\-]+(\d{4}))?$").expect("period label regex should compile")
});

/// A calendar month, stored as its first day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Period(NaiveDate);

impl Period {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(Period)
    }

    /// The period containing `date`.
    pub fn containing(date: NaiveDate) -> Self {
        Period(date.with_day(1).unwrap_or(date))
    }

    pub fn first_day(&self) -> NaiveDate {
        self.0
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    /// Parse `"<MonthName> <Year>"`. When the label carries no year, `year_context`
    /// supplies it; without one the label is rejected.
    pub fn parse_label(label: &str, year_context: Option<i32>) -> Option<Self> {
        let caps = LABEL_RE.captures(label.trim())?;
        let month: Month = caps.get(1)?.as_str().parse().ok()?;
        let year = match caps.get(2) {
            Some(y) => y.as_str().parse().ok()?,
            None => year_context?,
        };
        Period::new(year, month.number_from_month())
    }

    /// The twelve periods of `year`, January first.
    pub fn catalog(year: i32) -> Vec<Period> {
        (1..=12).filter_map(|m| Period::new(year, m)).collect()
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%B %Y"))
    }
}

impl FromStr for Period {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Period::parse_label(s, None).ok_or_else(|| anyhow!("not a period label: {:?}", s))
    }
}

/// Labels of the fixed range-selector catalog, e.g. `"January 2024"`.
pub fn period_catalog(year: i32) -> Vec<String> {
    Period::catalog(year).iter().map(Period::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_labels_with_and_without_year() {
        let march = Period::new(2024, 3).unwrap();
        assert_eq!(Period::parse_label("March", Some(2024)), Some(march));
        assert_eq!(Period::parse_label(" march 2024 ", None), Some(march));
        assert_eq!(Period::parse_label("Mar 2024", Some(1999)), Some(march));
        assert_eq!(Period::parse_label("March", None), None);
    }

    #[test]
    fn rejects_aggregate_and_garbage_labels() {
        assert_eq!(Period::parse_label("Total", Some(2024)), None);
        assert_eq!(Period::parse_label("Prevalence %", Some(2024)), None);
        assert_eq!(Period::parse_label("Smarch 2024", Some(2024)), None);
        assert_eq!(Period::parse_label("", Some(2024)), None);
    }

    #[test]
    fn catalog_spans_the_year() {
        let labels = period_catalog(2024);
        assert_eq!(labels.len(), 12);
        assert_eq!(labels[0], "January 2024");
        assert_eq!(labels[11], "December 2024");
        for label in &labels {
            let p: Period = label.parse().unwrap();
            assert_eq!(&p.to_string(), label);
        }
    }

    #[test]
    fn containing_truncates_to_first_day() {
        let d = NaiveDate::from_ymd_opt(2024, 5, 17).unwrap();
        assert_eq!(Period::containing(d).first_day(), NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
    }
}
