//! Aggregation over the monthly phenotype counts: normalization, change
//! rates, filtering, summary metrics and alerts, chart series.

pub mod change;
pub mod error;
pub mod filter;
pub mod period;
pub mod record;
pub mod series;
pub mod summary;

pub use change::{compute_change_rates, pct_change};
pub use error::AggregateError;
pub use filter::{filter_by_exact_day, filter_by_range, PeriodFilter};
pub use period::{period_catalog, Period};
pub use record::{normalize, NormalizeOptions, ResistanceRecord, MRSA, VRSA};
pub use series::{phenotype_series, PhenotypeSeries, SeriesPoint, DEFAULT_HIGHLIGHT, PHENOTYPE_OPTIONS};
pub use summary::{overview, summarize, summarize_with, Alert, MrsaAlert, Overview, Severity, Summary};
