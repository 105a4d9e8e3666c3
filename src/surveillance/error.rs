use super::period::Period;

/// Caller errors in the aggregation functions. Data problems are logged and
/// recovered from instead; these are broken preconditions.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AggregateError {
    #[error("records must be strictly ascending by month: {previous} is followed by {next}")]
    Unsorted { previous: Period, next: Period },

    #[error("cannot summarize an empty selection")]
    EmptySelection,
}
