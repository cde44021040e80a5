use chrono::NaiveDateTime;
use polars::error::PolarsError;
use polars::prelude::DataType;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SeriesError {
    #[error("Required column '{0}' not found in series data")]
    MissingColumn(String),

    #[error("Column '{column}' has type {dtype}, expected a numeric value column")]
    NonNumericValues { column: String, dtype: DataType },

    #[error("Column '{column}' has type {dtype}, expected a date or datetime column")]
    TimestampType { column: String, dtype: DataType },

    #[error("Timestamp column contains null entries")]
    NullTimestamp,

    #[error("Duplicate timestamp {0} in series")]
    DuplicateTimestamps(NaiveDateTime),

    #[error("Timestamp {0} (ms since epoch) is outside the representable range")]
    TimestampOutOfRange(i64),

    #[error("Polars operation failed: {0}")]
    Polars(#[from] PolarsError),
}
