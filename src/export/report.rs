use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::{
    dataset::Dataset,
    surveillance::{overview, phenotype_series, Alert, Overview, PeriodFilter, PhenotypeSeries, ResistanceRecord},
};

/// Everything the presentation layer needs for one filter selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub filter: PeriodFilter,
    pub overview: Overview,
    pub alerts: Vec<Alert>,
    pub records: Vec<ResistanceRecord>,
    pub series: Vec<PhenotypeSeries>,
}

impl Report {
    pub fn build<S: AsRef<str>>(
        dataset: &Dataset,
        filter: &PeriodFilter,
        highlight: &[S],
        mrsa_alert_factor: f64,
    ) -> Self {
        let records = dataset.view(filter);
        let overview = overview(&records, mrsa_alert_factor);
        let alerts = match &overview {
            Overview::Ready(summary) => summary.alerts(),
            Overview::NoData => Vec::new(),
        };
        let series = phenotype_series(&records, highlight);
        Self {
            filter: *filter,
            overview,
            alerts,
            records,
            series,
        }
    }

    pub fn write_json<W: Write>(&self, out: W) -> Result<()> {
        serde_json::to_writer_pretty(out, self).context("serializing report")
    }
}
