//! Period-over-period change of the total case count.

use super::{error::AggregateError, record::ResistanceRecord};

/// Lag, in records, of the year-over-year comparison.
pub const YOY_LAG: usize = 12;

/// Percent change from `prior` to `current`; `None` when `prior` is zero.
pub fn pct_change(prior: u64, current: u64) -> Option<f64> {
    if prior == 0 {
        return None;
    }
    Some((current as f64 - prior as f64) / prior as f64 * 100.0)
}

/// Check the position-based contract the change computation relies on.
pub fn ensure_ascending(records: &[ResistanceRecord]) -> Result<(), AggregateError> {
    match records.windows(2).find(|w| w[0].month >= w[1].month) {
        Some(w) => Err(AggregateError::Unsorted {
            previous: w[0].month,
            next: w[1].month,
        }),
        None => Ok(()),
    }
}

/// Fill `mom_change_pct` and `yoy_change_pct` by position: the previous record
/// and the record `YOY_LAG` places earlier. Unsorted input is rejected.
pub fn compute_change_rates(
    mut records: Vec<ResistanceRecord>,
) -> Result<Vec<ResistanceRecord>, AggregateError> {
    ensure_ascending(&records)?;

    let totals: Vec<u64> = records.iter().map(|r| r.total).collect();
    for (i, rec) in records.iter_mut().enumerate() {
        rec.mom_change_pct = i
            .checked_sub(1)
            .and_then(|j| pct_change(totals[j], totals[i]));
        rec.yoy_change_pct = i
            .checked_sub(YOY_LAG)
            .and_then(|j| pct_change(totals[j], totals[i]));
    }
    Ok(records)
}
