use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{period::Period, record::ResistanceRecord};

/// Phenotype labels the range view offers for highlighting.
pub const PHENOTYPE_OPTIONS: [&str; 4] = ["MRSA", "VRSA", "Wild", "others"];

/// Highlighted by default.
pub const DEFAULT_HIGHLIGHT: [&str; 2] = ["MRSA", "VRSA"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub month: Period,
    pub cases: u64,
}

/// One layer of a stacked-area chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhenotypeSeries {
    pub phenotype: String,
    pub points: Vec<SeriesPoint>,
}

/// One series per selected label, in selection order. Selection only decides
/// which layers are produced; the counts come straight from the records.
pub fn phenotype_series<S: AsRef<str>>(records: &[ResistanceRecord], selected: &[S]) -> Vec<PhenotypeSeries> {
    selected
        .iter()
        .map(|label| {
            let label = label.as_ref();
            if !records.is_empty() && !records.iter().any(|r| r.has_phenotype(label)) {
                warn!(phenotype = label, "no such phenotype column; series will be all zeros");
            }
            PhenotypeSeries {
                phenotype: label.to_string(),
                points: records
                    .iter()
                    .map(|r| SeriesPoint {
                        month: r.month,
                        cases: r.count(label),
                    })
                    .collect(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surveillance::record::tests::record;

    #[test]
    fn one_series_per_selection() {
        let recs = vec![record(2024, 1, 100, 20, 0), record(2024, 2, 100, 25, 2)];
        let series = phenotype_series(&recs, &DEFAULT_HIGHLIGHT);

        assert_eq!(series.len(), 2);
        assert_eq!(series[0].phenotype, "MRSA");
        let mrsa: Vec<u64> = series[0].points.iter().map(|p| p.cases).collect();
        assert_eq!(mrsa, vec![20, 25]);
        assert_eq!(series[1].points[1].cases, 2);
        assert_eq!(series[1].points[1].month, Period::new(2024, 2).unwrap());
    }

    #[test]
    fn unknown_label_yields_zeros() {
        let recs = vec![record(2024, 1, 100, 20, 0)];
        let series = phenotype_series(&recs, &["Wild"]);
        assert_eq!(series[0].points[0].cases, 0);
    }

    #[test]
    fn empty_selection_or_records() {
        let recs = vec![record(2024, 1, 100, 20, 0)];
        assert!(phenotype_series::<&str>(&recs, &[]).is_empty());
        assert!(phenotype_series(&[], &["MRSA"])[0].points.is_empty());
    }
}
