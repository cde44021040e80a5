//! Alignment and combination of [`TimeSeries`] values: recharge arithmetic
//! over the shared timestamp domain and daily resampling.

use crate::calibration::UnknownVariant;
use crate::series::error::SeriesError;
use crate::series::frame::{TimeSeries, COL_TIME, COL_VALUE};
use polars::prelude::*;
use std::fmt;
use std::str::FromStr;

/// Bucket reduction used by [`resample_daily`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Aggregation {
    Mean,
    Median,
    Max,
}

impl Aggregation {
    pub const ALL: [Aggregation; 3] = [Aggregation::Mean, Aggregation::Median, Aggregation::Max];

    pub(crate) fn name(&self) -> &'static str {
        match self {
            Aggregation::Mean => "mean",
            Aggregation::Median => "median",
            Aggregation::Max => "max",
        }
    }

    fn expr(&self) -> Expr {
        match self {
            Aggregation::Mean => col(COL_VALUE).mean(),
            Aggregation::Median => col(COL_VALUE).median(),
            Aggregation::Max => col(COL_VALUE).max(),
        }
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Aggregation {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mean" => Ok(Aggregation::Mean),
            "median" => Ok(Aggregation::Median),
            "max" => Ok(Aggregation::Max),
            other => Err(UnknownVariant {
                kind: "aggregation method",
                name: other.to_string(),
            }),
        }
    }
}

/// Subtracts `right` from `left` on the intersection of their timestamps.
///
/// Timestamps present in only one input are dropped silently, so the result
/// has at most `min(left.len(), right.len())` points. A missing value on
/// either side yields a missing value in the result. With precipitation on
/// the left and evapotranspiration on the right this is the groundwater
/// recharge series.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use knmi_hydro::{recharge, SeriesPoint, TimeSeries};
///
/// let day = |d: u32| {
///     NaiveDate::from_ymd_opt(2024, 1, d)
///         .unwrap()
///         .and_hms_opt(0, 0, 0)
///         .unwrap()
/// };
/// let prec = TimeSeries::from_points([
///     SeriesPoint { time: day(1), value: Some(4.0) },
///     SeriesPoint { time: day(2), value: Some(2.0) },
/// ])?;
/// let evap = TimeSeries::from_points([
///     SeriesPoint { time: day(2), value: Some(0.5) },
///     SeriesPoint { time: day(3), value: Some(1.0) },
/// ])?;
///
/// let net = recharge(&prec, &evap)?;
/// let points = net.points()?;
/// assert_eq!(points.len(), 1);
/// assert_eq!(points[0].time, day(2));
/// assert_eq!(points[0].value, Some(1.5));
/// # Ok::<(), knmi_hydro::SeriesError>(())
/// ```
pub fn recharge(left: &TimeSeries, right: &TimeSeries) -> Result<TimeSeries, SeriesError> {
    let df = left
        .frame()
        .clone()
        .lazy()
        .join(
            right.frame().clone().lazy(),
            [col(COL_TIME)],
            [col(COL_TIME)],
            JoinArgs::new(JoinType::Inner),
        )
        .select([
            col(COL_TIME),
            (col(COL_VALUE) - col("value_right")).alias(COL_VALUE),
        ])
        .sort([COL_TIME], Default::default())
        .collect()?;
    Ok(TimeSeries::from_valid_frame(df))
}

/// Buckets a series by calendar day and reduces each bucket with `method`.
///
/// Missing values are skipped within a bucket; a bucket with only missing
/// values yields a missing value. Days with no observations at all are absent
/// from the output rather than zero-filled. Resampling a series that is
/// already daily with [`Aggregation::Mean`] returns the series unchanged.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use knmi_hydro::{resample_daily, Aggregation, SeriesPoint, TimeSeries};
///
/// let at = |h: u32| {
///     NaiveDate::from_ymd_opt(2024, 1, 1)
///         .unwrap()
///         .and_hms_opt(h, 0, 0)
///         .unwrap()
/// };
/// let series = TimeSeries::from_points([
///     SeriesPoint { time: at(6), value: Some(1.0) },
///     SeriesPoint { time: at(18), value: Some(3.0) },
/// ])?;
///
/// let daily = resample_daily(&series, Aggregation::Mean)?;
/// assert_eq!(daily.values()?, vec![Some(2.0)]);
/// # Ok::<(), knmi_hydro::SeriesError>(())
/// ```
pub fn resample_daily(series: &TimeSeries, method: Aggregation) -> Result<TimeSeries, SeriesError> {
    let day = col(COL_TIME)
        .cast(DataType::Date)
        .cast(DataType::Datetime(TimeUnit::Milliseconds, None))
        .alias(COL_TIME);
    let df = series
        .frame()
        .clone()
        .lazy()
        .group_by([day])
        .agg([method.expr().alias(COL_VALUE)])
        .sort([COL_TIME], Default::default())
        .collect()?;
    Ok(TimeSeries::from_valid_frame(df))
}
