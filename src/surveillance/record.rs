use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, trace, warn};

use super::period::Period;
use crate::ingest::{
    utils::{parse_count, parse_number},
    RawTable,
};

pub const MRSA: &str = "MRSA";
pub const VRSA: &str = "VRSA";

/// One reporting month of the phenotype table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResistanceRecord {
    pub month: Period,
    /// First day of `month`; the key exact-day filters compare against.
    pub day: NaiveDate,
    pub total: u64,
    /// Phenotype header → case count, e.g. `MRSA`, `VRSA`, `Wild`, `others`.
    pub phenotypes: BTreeMap<String, u64>,
    pub mom_change_pct: Option<f64>,
    pub yoy_change_pct: Option<f64>,
}

impl ResistanceRecord {
    pub fn new(month: Period, total: u64, phenotypes: BTreeMap<String, u64>) -> Self {
        Self {
            month,
            day: month.first_day(),
            total,
            phenotypes,
            mom_change_pct: None,
            yoy_change_pct: None,
        }
    }

    /// Count for a phenotype label, case-insensitive. Unknown labels count as zero.
    pub fn count(&self, label: &str) -> u64 {
        self.phenotypes
            .get(label)
            .or_else(|| {
                self.phenotypes
                    .iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case(label))
                    .map(|(_, v)| v)
            })
            .copied()
            .unwrap_or(0)
    }

    pub fn mrsa(&self) -> u64 {
        self.count(MRSA)
    }

    pub fn vrsa(&self) -> u64 {
        self.count(VRSA)
    }

    pub fn has_phenotype(&self, label: &str) -> bool {
        self.phenotypes.keys().any(|k| k.eq_ignore_ascii_case(label))
    }
}

/// How to read the phenotype table.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizeOptions {
    pub period_column: String,
    pub total_column: String,
    /// Year applied to labels that carry none.
    pub year_context: i32,
    /// Labels of aggregate rows that are not periods ("Total", "Prevalence %").
    pub non_period_markers: Vec<String>,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            period_column: "Month".into(),
            total_column: "Total".into(),
            year_context: 2024,
            non_period_markers: vec!["Total".into(), "Prevalence %".into()],
        }
    }
}

impl NormalizeOptions {
    fn is_marker(&self, label: &str) -> bool {
        let label = label.trim();
        self.non_period_markers
            .iter()
            .any(|m| m.trim().eq_ignore_ascii_case(label))
    }
}

/// Turn the raw phenotype table into records sorted ascending by month.
///
/// Marker rows are excluded, unparseable labels and totals are dropped with a
/// warning, and a month appearing twice keeps the later source row.
pub fn normalize(table: &RawTable, opts: &NormalizeOptions) -> Result<Vec<ResistanceRecord>> {
    let period_idx = table
        .column_index(&opts.period_column)
        .ok_or_else(|| anyhow!("{}: no period column {:?}", table.name, opts.period_column))?;
    let total_idx = table
        .column_index(&opts.total_column)
        .ok_or_else(|| anyhow!("{}: no total column {:?}", table.name, opts.total_column))?;
    for required in [MRSA, VRSA] {
        if table.column_index(required).is_none() {
            return Err(anyhow!("{}: no {} column", table.name, required));
        }
    }

    let phenotype_cols: Vec<(usize, &String)> = table
        .headers
        .iter()
        .enumerate()
        .filter(|(i, h)| *i != period_idx && *i != total_idx && !h.is_empty())
        .collect();
    let mut seen_headers = BTreeSet::new();
    for &(col_idx, header) in &phenotype_cols {
        if !seen_headers.insert(header.as_str()) {
            warn!(table = %table.name, column = %header, col_idx, "duplicate phenotype header; last column wins");
        }
    }

    let mut by_month: BTreeMap<Period, ResistanceRecord> = BTreeMap::new();
    let mut dropped = 0usize;

    for (row_idx, row) in table.rows.iter().enumerate() {
        let label = row[period_idx].as_str();
        if opts.is_marker(label) {
            trace!(row_idx, label, "skipping aggregate row");
            continue;
        }

        let Some(month) = Period::parse_label(label, Some(opts.year_context)) else {
            warn!(table = %table.name, row_idx, label, "dropping row with unparseable period label");
            dropped += 1;
            continue;
        };

        let Some(total) = parse_count(&row[total_idx]) else {
            warn!(table = %table.name, %month, cell = %row[total_idx], "dropping row with invalid total");
            dropped += 1;
            continue;
        };

        let mut phenotypes = BTreeMap::new();
        for &(col_idx, header) in &phenotype_cols {
            let cell = &row[col_idx];
            let count = parse_count(cell).unwrap_or_else(|| {
                warn!(
                    table = %table.name,
                    %month,
                    column = %header,
                    cell = %cell,
                    numeric = parse_number(cell).is_some(),
                    "non-count phenotype cell treated as 0"
                );
                0
            });
            phenotypes.insert(header.clone(), count);
        }

        let subgroup_sum = phenotypes.values().fold(0u64, |acc, &n| acc.saturating_add(n));
        if subgroup_sum > total {
            warn!(%month, total, subgroup_sum, "phenotype counts exceed total");
        }

        if by_month
            .insert(month, ResistanceRecord::new(month, total, phenotypes))
            .is_some()
        {
            warn!(table = %table.name, %month, row_idx, "duplicate period; later row replaces earlier");
        }
    }

    debug!(table = %table.name, records = by_month.len(), dropped, "normalized phenotype table");
    Ok(by_month.into_values().collect())
}
