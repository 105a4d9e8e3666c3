//! Terminal tables for the CLI.

use prettytable::{format, Cell, Row, Table};
use std::collections::BTreeSet;

use crate::{
    antibiogram::Antibiogram,
    export::Report,
    surveillance::{Overview, PhenotypeSeries, ResistanceRecord, Severity, Summary},
};

pub const NO_DATA: &str = "No data found for this date or period.";

/// Undefined rates print as "n/a".
pub fn fmt_pct(v: Option<f64>) -> String {
    v.map(|v| format!("{:.1}%", v)).unwrap_or_else(|| "n/a".to_string())
}

fn fmt_change(v: Option<f64>) -> String {
    v.map(|v| format!("{:+.1}%", v)).unwrap_or_else(|| "n/a".to_string())
}

/// `1234567` → `1,234,567`
pub fn fmt_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn new_table(titles: Vec<&str>) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BOX_CHARS);
    table.set_titles(Row::new(
        titles.into_iter().map(|t| Cell::new(t).style_spec("bFg")).collect(),
    ));
    table
}

pub fn summary_table(summary: &Summary) -> Table {
    let mut table = new_table(vec!["Metric", "Value"]);
    let vrsa = if summary.vrsa_alert {
        format!("{} (immediate attention)", summary.latest_vrsa_count)
    } else {
        summary.latest_vrsa_count.to_string()
    };
    for (k, v) in [
        ("Latest month", summary.latest_month.to_string()),
        ("Total cases analyzed", fmt_count(summary.total_cases)),
        ("Current MRSA rate", fmt_pct(summary.latest_mrsa_rate_pct)),
        ("Average MRSA rate", fmt_pct(summary.average_mrsa_rate_pct)),
        ("VRSA cases detected", vrsa),
    ] {
        table.add_row(Row::new(vec![Cell::new(k), Cell::new(&v).style_spec("r")]));
    }
    table
}

pub fn records_table(records: &[ResistanceRecord]) -> Table {
    let phenotypes: BTreeSet<&str> = records
        .iter()
        .flat_map(|r| r.phenotypes.keys().map(String::as_str))
        .collect();

    let mut titles = vec!["Month", "Total"];
    titles.extend(phenotypes.iter().copied());
    titles.extend(["MoM", "YoY"]);
    let mut table = new_table(titles);

    for r in records {
        let mut cells = vec![Cell::new(&r.month.to_string()), Cell::new(&fmt_count(r.total)).style_spec("r")];
        cells.extend(
            phenotypes
                .iter()
                .map(|p| Cell::new(&fmt_count(r.count(p))).style_spec("r")),
        );
        cells.push(Cell::new(&fmt_change(r.mom_change_pct)).style_spec("r"));
        cells.push(Cell::new(&fmt_change(r.yoy_change_pct)).style_spec("r"));
        table.add_row(Row::new(cells));
    }
    table
}

/// Series side by side, one column per highlighted phenotype.
pub fn series_table(series: &[PhenotypeSeries]) -> Table {
    let mut titles = vec!["Month"];
    titles.extend(series.iter().map(|s| s.phenotype.as_str()));
    let mut table = new_table(titles);

    let len = series.first().map(|s| s.points.len()).unwrap_or(0);
    for i in 0..len {
        let mut cells = vec![Cell::new(&series[0].points[i].month.to_string())];
        cells.extend(
            series
                .iter()
                .map(|s| Cell::new(&fmt_count(s.points[i].cases)).style_spec("r")),
        );
        table.add_row(Row::new(cells));
    }
    table
}

pub fn antibiogram_table(abg: &Antibiogram) -> Table {
    let mut titles = vec![abg.label_column.as_str()];
    titles.extend(abg.columns.iter().map(String::as_str));
    let mut table = new_table(titles);
    for row in &abg.rows {
        let mut cells = vec![Cell::new(&row.antibiotic)];
        cells.extend(abg.columns.iter().map(|c| {
            let v = row.values.get(c).copied().flatten();
            Cell::new(&v.map(|v| format!("{}", v)).unwrap_or_default()).style_spec("r")
        }));
        table.add_row(Row::new(cells));
    }
    table
}

/// The overview as plain text: summary, alerts, phenotype series, monthly table.
pub fn render_report(report: &Report) -> String {
    let summary = match &report.overview {
        Overview::NoData => return format!("{}\n", NO_DATA),
        Overview::Ready(summary) => summary,
    };

    let mut out = String::new();
    out.push_str("Dashboard Summary\n");
    out.push_str(&summary_table(summary).to_string());

    out.push_str("\nResistance Alerts\n");
    if report.alerts.is_empty() {
        out.push_str("  none\n");
    }
    for alert in &report.alerts {
        let tag = match alert.severity {
            Severity::Warning => "WARNING",
            Severity::Critical => "CRITICAL",
        };
        out.push_str(&format!("  [{}] {}\n", tag, alert.message));
    }

    if !report.series.is_empty() {
        out.push_str("\nPhenotype Distribution Over Time\n");
        out.push_str(&series_table(&report.series).to_string());
    }

    out.push_str("\nMonthly Totals\n");
    out.push_str(&records_table(&report.records).to_string());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surveillance::{phenotype_series, record::tests::record, summarize};

    #[test]
    fn formats_numbers() {
        assert_eq!(fmt_count(0), "0");
        assert_eq!(fmt_count(999), "999");
        assert_eq!(fmt_count(1_234_567), "1,234,567");
        assert_eq!(fmt_pct(None), "n/a");
        assert_eq!(fmt_pct(Some(22.94)), "22.9%");
        assert_eq!(fmt_change(Some(-25.0)), "-25.0%");
    }

    #[test]
    fn tables_have_a_row_per_item() {
        let recs = vec![record(2024, 1, 1200, 10, 0), record(2024, 2, 100, 30, 1)];
        assert_eq!(records_table(&recs).len(), 2);

        let series = phenotype_series(&recs, &["MRSA", "VRSA"]);
        assert_eq!(series_table(&series).len(), 2);

        let text = summary_table(&summarize(&recs).unwrap()).to_string();
        assert!(text.contains("1,300"));
        assert!(text.contains("immediate attention"));
    }
}
