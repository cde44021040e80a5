//! Contains the `TimeSeries` structure, the canonical time-indexed numeric
//! series shared by the fetcher, the aligner and the local series store.

use crate::series::error::SeriesError;
use crate::utils::{day_end_exclusive_ms, day_start_ms, is_numeric_dtype};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use polars::prelude::*;

pub(crate) const COL_TIME: &str = "time";
pub(crate) const COL_VALUE: &str = "value";

/// A single observation in a [`TimeSeries`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesPoint {
    pub time: NaiveDateTime,
    /// `None` represents a missing observation, distinct from zero.
    pub value: Option<f64>,
}

/// A time-indexed numeric series backed by a two-column Polars `DataFrame`
/// (`time`: millisecond datetime, `value`: nullable float).
///
/// Timestamps are strictly increasing and never null; the constructors sort
/// their input and reject duplicates, so every `TimeSeries` handed to
/// [`crate::recharge`] or [`crate::resample_daily`] is already well formed.
/// Values may be null to represent missing observations.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use knmi_hydro::{SeriesPoint, TimeSeries};
///
/// let day = |d: u32| {
///     NaiveDate::from_ymd_opt(2024, 1, d)
///         .unwrap()
///         .and_hms_opt(0, 0, 0)
///         .unwrap()
/// };
/// let series = TimeSeries::from_points([
///     SeriesPoint { time: day(2), value: Some(1.5) },
///     SeriesPoint { time: day(1), value: None },
/// ])?;
///
/// // Points come back sorted by time.
/// assert_eq!(series.len(), 2);
/// assert_eq!(series.points()?[0].time, day(1));
/// # Ok::<(), knmi_hydro::SeriesError>(())
/// ```
#[derive(Debug, Clone)]
pub struct TimeSeries {
    df: DataFrame,
}

impl TimeSeries {
    /// Builds a `TimeSeries` from a `DataFrame` with a `time` and a `value`
    /// column.
    ///
    /// The `time` column may be a date or a datetime of any unit and is
    /// normalized to millisecond datetimes; the `value` column may be any
    /// numeric type and is widened to `f64`. Rows are sorted by time.
    ///
    /// # Errors
    ///
    /// Returns [`SeriesError::MissingColumn`] if either column is absent,
    /// [`SeriesError::TimestampType`] / [`SeriesError::NonNumericValues`] for
    /// wrong column types, [`SeriesError::NullTimestamp`] if any timestamp is
    /// null and [`SeriesError::DuplicateTimestamps`] if two rows share a
    /// timestamp.
    pub fn from_frame(df: DataFrame) -> Result<Self, SeriesError> {
        let time = df
            .column(COL_TIME)
            .map_err(|_| SeriesError::MissingColumn(COL_TIME.to_string()))?;
        match time.dtype() {
            DataType::Date | DataType::Datetime(_, _) => {}
            other => {
                return Err(SeriesError::TimestampType {
                    column: COL_TIME.to_string(),
                    dtype: other.clone(),
                })
            }
        }

        let value = df
            .column(COL_VALUE)
            .map_err(|_| SeriesError::MissingColumn(COL_VALUE.to_string()))?;
        if !is_numeric_dtype(value.dtype()) {
            return Err(SeriesError::NonNumericValues {
                column: COL_VALUE.to_string(),
                dtype: value.dtype().clone(),
            });
        }

        let time = time.cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?;
        let value = value.cast(&DataType::Float64)?;
        if time.null_count() > 0 {
            return Err(SeriesError::NullTimestamp);
        }

        let df = DataFrame::new(vec![time, value])?;
        let df = df.sort([COL_TIME], SortMultipleOptions::default())?;

        // Sorted, so duplicates are adjacent.
        let timestamps = df.column(COL_TIME)?.datetime()?;
        let mut previous: Option<i64> = None;
        for ms in timestamps.into_iter().flatten() {
            if previous == Some(ms) {
                return Err(SeriesError::DuplicateTimestamps(ms_to_naive(ms)?));
            }
            previous = Some(ms);
        }

        Ok(Self { df })
    }

    /// Builds a `TimeSeries` from typed points. Input order does not matter.
    ///
    /// # Errors
    ///
    /// Returns [`SeriesError::DuplicateTimestamps`] if two points share a
    /// timestamp.
    pub fn from_points(points: impl IntoIterator<Item = SeriesPoint>) -> Result<Self, SeriesError> {
        let mut times_ms: Vec<i64> = Vec::new();
        let mut values: Vec<Option<f64>> = Vec::new();
        for point in points {
            times_ms.push(point.time.and_utc().timestamp_millis());
            values.push(point.value);
        }
        let time = Series::new(COL_TIME.into(), times_ms)
            .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?;
        let value = Series::new(COL_VALUE.into(), values);
        let df = DataFrame::new(vec![time.into_column(), value.into_column()])?;
        Self::from_frame(df)
    }

    /// Wraps a frame already known to satisfy the series invariants
    /// (canonical schema, sorted unique non-null timestamps).
    pub(crate) fn from_valid_frame(df: DataFrame) -> Self {
        Self { df }
    }

    /// The underlying two-column `DataFrame`.
    pub fn frame(&self) -> &DataFrame {
        &self.df
    }

    /// Consumes the series, returning the underlying `DataFrame`.
    pub fn into_frame(self) -> DataFrame {
        self.df
    }

    pub fn len(&self) -> usize {
        self.df.height()
    }

    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }

    /// Extracts the series as typed points, sorted by time.
    pub fn points(&self) -> Result<Vec<SeriesPoint>, SeriesError> {
        let time = self.df.column(COL_TIME)?.datetime()?;
        let value = self.df.column(COL_VALUE)?.f64()?;
        time.into_iter()
            .zip(value.into_iter())
            .map(|(ms, value)| {
                let ms = ms.ok_or(SeriesError::NullTimestamp)?;
                Ok(SeriesPoint {
                    time: ms_to_naive(ms)?,
                    value,
                })
            })
            .collect()
    }

    /// The value column in time order, nulls preserved.
    pub fn values(&self) -> Result<Vec<Option<f64>>, SeriesError> {
        let value = self.df.column(COL_VALUE)?.f64()?;
        Ok(value.into_iter().collect())
    }

    /// Restricts the series to days within `start..=end`.
    pub fn get_range(&self, start: NaiveDate, end: NaiveDate) -> Result<TimeSeries, SeriesError> {
        let df = self
            .df
            .clone()
            .lazy()
            .filter(
                col(COL_TIME)
                    .gt_eq(datetime_lit(day_start_ms(start)))
                    .and(col(COL_TIME).lt(datetime_lit(day_end_exclusive_ms(end)))),
            )
            .collect()?;
        Ok(TimeSeries::from_valid_frame(df))
    }

    /// Drops points whose value is missing.
    pub fn drop_missing(&self) -> Result<TimeSeries, SeriesError> {
        let df = self
            .df
            .clone()
            .lazy()
            .filter(col(COL_VALUE).is_not_null())
            .collect()?;
        Ok(TimeSeries::from_valid_frame(df))
    }
}

/// Millisecond-datetime literal for comparisons against the `time` column.
pub(crate) fn datetime_lit(ms: i64) -> Expr {
    lit(ms).cast(DataType::Datetime(TimeUnit::Milliseconds, None))
}

fn ms_to_naive(ms: i64) -> Result<NaiveDateTime, SeriesError> {
    DateTime::from_timestamp_millis(ms)
        .map(|dt| dt.naive_utc())
        .ok_or(SeriesError::TimestampOutOfRange(ms))
}
