use crate::series::error::SeriesError;
use polars::error::PolarsError;
use polars::prelude::DataType;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to read input directory '{0}'")]
    DirRead(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse CSV file '{path}'")]
    CsvRead {
        path: PathBuf,
        #[source]
        source: PolarsError,
    },

    #[error("File '{0}' has no columns")]
    NoColumns(PathBuf),

    #[error("First column of '{path}' has type {dtype}, expected dates or timestamps")]
    TimestampColumn { path: PathBuf, dtype: DataType },

    #[error("No numeric value column found in '{0}'")]
    NoValueColumn(PathBuf),

    #[error("File '{path}' does not hold a valid time series")]
    Series {
        path: PathBuf,
        #[source]
        source: SeriesError,
    },
}
