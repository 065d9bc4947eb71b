//! Error types for loading and querying sales data.

use chrono::NaiveDate;

/// Failure while loading the sales dataset.
///
/// Any of these aborts startup; a partially loaded dataset is never served.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("Column '{0}' contains no parseable values")]
    UnparseableColumn(String),

    #[error("Invalid value {value:?} in column '{column}' at line {line}: {reason}")]
    InvalidValue {
        line: usize,
        column: String,
        value: String,
        reason: String,
    },
}

/// A filter specification the engine refuses to apply.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FilterError {
    #[error("Date range start {start} is after end {end}")]
    InvertedDateRange { start: NaiveDate, end: NaiveDate },

    #[error("Invalid date: {0:?} (expected dd/mm/yyyy or yyyy-mm-dd)")]
    InvalidDate(String),
}

/// Failure to coerce a currency-formatted string into a decimal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoneyError {
    #[error("empty amount")]
    Empty,

    #[error("not a number: {0:?}")]
    Invalid(String),

    #[error("amount {0:?} exceeds the supported magnitude")]
    OutOfRange(String),
}
