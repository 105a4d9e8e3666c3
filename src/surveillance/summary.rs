//! Headline metrics and alerts for a filtered selection.

use serde::{Deserialize, Serialize};

use super::{error::AggregateError, period::Period, record::ResistanceRecord};

/// Latest MRSA rate must exceed the selection average by this factor to alert.
pub const DEFAULT_MRSA_ALERT_FACTOR: f64 = 1.2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MrsaAlert {
    pub latest_rate_pct: f64,
    pub average_rate_pct: f64,
    /// `(latest / average - 1) * 100`
    pub excess_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub latest_month: Period,
    pub total_cases: u64,
    /// `None` when the latest month has a zero total.
    pub latest_mrsa_rate_pct: Option<f64>,
    pub latest_vrsa_count: u64,
    /// `sum(MRSA) / sum(total) * 100`; `None` when no cases were reported.
    pub average_mrsa_rate_pct: Option<f64>,
    pub mrsa_alert: Option<MrsaAlert>,
    pub vrsa_alert: bool,
}

fn rate_pct(part: u64, whole: u64) -> Option<f64> {
    (whole > 0).then(|| part as f64 / whole as f64 * 100.0)
}

/// Case counts come straight from the exports; clamp instead of overflowing.
fn saturating_sum(counts: impl Iterator<Item = u64>) -> u64 {
    counts.fold(0, u64::saturating_add)
}

/// Summarize with the default MRSA alert factor.
pub fn summarize(records: &[ResistanceRecord]) -> Result<Summary, AggregateError> {
    summarize_with(records, DEFAULT_MRSA_ALERT_FACTOR)
}

/// Summarize a non-empty, chronologically ordered selection. The last record is
/// the "latest" month.
pub fn summarize_with(records: &[ResistanceRecord], mrsa_alert_factor: f64) -> Result<Summary, AggregateError> {
    let latest = records.last().ok_or(AggregateError::EmptySelection)?;

    let total_cases = saturating_sum(records.iter().map(|r| r.total));
    let mrsa_cases = saturating_sum(records.iter().map(ResistanceRecord::mrsa));

    let latest_mrsa_rate_pct = rate_pct(latest.mrsa(), latest.total);
    let average_mrsa_rate_pct = rate_pct(mrsa_cases, total_cases);
    let latest_vrsa_count = latest.vrsa();

    let mrsa_alert = match (latest_mrsa_rate_pct, average_mrsa_rate_pct) {
        (Some(latest_rate), Some(average)) if average > 0.0 && latest_rate > average * mrsa_alert_factor => {
            Some(MrsaAlert {
                latest_rate_pct: latest_rate,
                average_rate_pct: average,
                excess_pct: (latest_rate / average - 1.0) * 100.0,
            })
        }
        _ => None,
    };

    Ok(Summary {
        latest_month: latest.month,
        total_cases,
        latest_mrsa_rate_pct,
        latest_vrsa_count,
        average_mrsa_rate_pct,
        mrsa_alert,
        vrsa_alert: latest_vrsa_count > 0,
    })
}

/// What the overview shows for a selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Overview {
    NoData,
    Ready(Summary),
}

/// Guarded entry point: an empty selection short-circuits to `NoData`
/// without calling `summarize`.
pub fn overview(records: &[ResistanceRecord], mrsa_alert_factor: f64) -> Overview {
    if records.is_empty() {
        return Overview::NoData;
    }
    match summarize_with(records, mrsa_alert_factor) {
        Ok(summary) => Overview::Ready(summary),
        Err(_) => Overview::NoData,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub severity: Severity,
    pub message: String,
}

impl Summary {
    pub fn alerts(&self) -> Vec<Alert> {
        let mut out = Vec::new();
        if let Some(alert) = &self.mrsa_alert {
            out.push(Alert {
                severity: Severity::Warning,
                message: format!("MRSA cases are {:.0}% above average", alert.excess_pct),
            });
        }
        if self.vrsa_alert {
            out.push(Alert {
                severity: Severity::Critical,
                message: "VRSA cases detected - immediate attention required".to_string(),
            });
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surveillance::record::tests::record;

    #[test]
    fn mrsa_alert_reports_excess() {
        // average = (10 + 30) / (100 + 100) = 20%, latest = 30%
        let recs = vec![record(2024, 1, 100, 10, 0), record(2024, 2, 100, 30, 0)];
        let s = summarize(&recs).unwrap();

        assert_eq!(s.total_cases, 200);
        assert!((s.latest_mrsa_rate_pct.unwrap() - 30.0).abs() < 1e-9);
        assert!((s.average_mrsa_rate_pct.unwrap() - 20.0).abs() < 1e-9);
        let alert = s.mrsa_alert.clone().expect("alert expected");
        assert!((alert.excess_pct - 50.0).abs() < 1e-9);
        assert_eq!(s.alerts()[0].message, "MRSA cases are 50% above average");
    }

    #[test]
    fn no_mrsa_alert_below_threshold() {
        // average = 40/200 = 20%, latest = 23%: under 1.2x
        let recs = vec![record(2024, 1, 100, 17, 0), record(2024, 2, 100, 23, 0)];
        let s = summarize(&recs).unwrap();
        assert!(s.mrsa_alert.is_none());
    }

    #[test]
    fn vrsa_alert_on_any_case() {
        let s = summarize(&[record(2024, 1, 100, 10, 0)]).unwrap();
        assert!(!s.vrsa_alert);
        assert!(s.alerts().is_empty());

        let s = summarize(&[record(2024, 1, 1_000_000, 10, 1)]).unwrap();
        assert!(s.vrsa_alert);
        assert_eq!(s.latest_vrsa_count, 1);
        assert_eq!(s.alerts()[0].severity, Severity::Critical);
    }

    #[test]
    fn zero_totals_give_undefined_rates() {
        let s = summarize(&[record(2024, 1, 0, 0, 0)]).unwrap();
        assert_eq!(s.latest_mrsa_rate_pct, None);
        assert_eq!(s.average_mrsa_rate_pct, None);
        assert!(s.mrsa_alert.is_none());
    }

    #[test]
    fn latest_is_last_record() {
        let recs = vec![record(2024, 1, 100, 50, 3), record(2024, 2, 100, 10, 0)];
        let s = summarize(&recs).unwrap();
        assert_eq!(s.latest_month, Period::new(2024, 2).unwrap());
        assert_eq!(s.latest_vrsa_count, 0);
        assert!(!s.vrsa_alert);
    }

    #[test]
    fn empty_selection_is_guarded() {
        assert_eq!(summarize(&[]), Err(AggregateError::EmptySelection));
        assert_eq!(overview(&[], DEFAULT_MRSA_ALERT_FACTOR), Overview::NoData);
        assert!(matches!(
            overview(&[record(2024, 1, 10, 1, 0)], DEFAULT_MRSA_ALERT_FACTOR),
            Overview::Ready(_)
        ));
    }

    #[test]
    fn huge_totals_saturate() {
        let big = 18_000_000_000_000_000_000;
        let recs = vec![record(2024, 1, big, big / 2, 0), record(2024, 2, big, big / 2, 0)];
        let s = summarize(&recs).unwrap();
        assert_eq!(s.total_cases, u64::MAX);
        assert!((s.latest_mrsa_rate_pct.unwrap() - 50.0).abs() < 1e-9);
        assert!(s.average_mrsa_rate_pct.is_some());
        assert!(s.mrsa_alert.is_none());
    }

    #[test]
    fn alert_factor_is_tunable() {
        let recs = vec![record(2024, 1, 100, 20, 0), record(2024, 2, 100, 24, 0)];
        // latest 24%, average 22%
        assert!(summarize(&recs).unwrap().mrsa_alert.is_none());
        assert!(summarize_with(&recs, 1.05).unwrap().mrsa_alert.is_some());
    }
}
