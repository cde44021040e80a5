use crate::types::station::Station;
use chrono::NaiveDate;
use polars::error::PolarsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum KnmiDataError {
    #[error("Invalid date range: start {start} lies after end {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to read response body from {0}")]
    BodyRead(String, #[source] reqwest::Error),

    // Errors during CSV parsing (inside blocking task)
    #[error("I/O error processing CSV data for station {station}")]
    CsvReadIo {
        station: Station,
        #[source]
        source: std::io::Error,
    },
    #[error("Parsing error processing CSV data for station {station}")]
    CsvReadPolars {
        station: Station,
        #[source]
        source: PolarsError,
    },

    #[error("CSV column count ({found}) does not match the daggegevens layout ({expected}) for station {station}")]
    SchemaMismatch {
        station: Station,
        expected: usize,
        found: usize,
    },

    #[error("Failed to rename columns for station {station}")]
    ColumnRename {
        station: Station,
        #[source]
        source: PolarsError,
    },

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),

    #[error("Failed processing DataFrame: {0}")]
    DataFrameProcessing(#[from] PolarsError),

    #[error("Required column '{0}' not found in DataFrame")]
    ColumnNotFound(String, #[source] PolarsError),

    #[error("Unexpected data state, station {station}: {message}")]
    UnexpectedData { station: Station, message: String },
}
