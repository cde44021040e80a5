//! Contains the `ClimateFrame` structure for lazy operations on KNMI daily
//! climate data.

use crate::climate::error::KnmiDataError;
use crate::series::frame::{TimeSeries, COL_TIME, COL_VALUE};
use crate::types::daily_climate::DailyClimate;
use crate::types::station::Station;
use crate::KnmiHydroError;
use chrono::NaiveDate;
use polars::prelude::*;
use std::fmt;

pub(crate) const COL_STN: &str = "stn";
pub(crate) const COL_DATE: &str = "date";
pub(crate) const COL_RADIATION: &str = "radiation";
pub(crate) const COL_PRCP: &str = "prcp";
pub(crate) const COL_TMIN: &str = "tmin";
pub(crate) const COL_TMAX: &str = "tmax";
pub(crate) const COL_TAVG: &str = "tavg";
pub(crate) const COL_ET: &str = "et";

/// A column of the daily climate frame that can be pulled out as a
/// [`TimeSeries`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClimateVariable {
    /// Global radiation in MJ/m²/day.
    Radiation,
    /// Precipitation sum in mm/day.
    Precipitation,
    /// Minimum temperature in °C.
    TempMin,
    /// Maximum temperature in °C.
    TempMax,
    /// Mean temperature in °C.
    TempAvg,
    /// Hargreaves potential evapotranspiration in mm/day.
    Evapotranspiration,
}

impl ClimateVariable {
    pub(crate) fn column(&self) -> &'static str {
        match self {
            ClimateVariable::Radiation => COL_RADIATION,
            ClimateVariable::Precipitation => COL_PRCP,
            ClimateVariable::TempMin => COL_TMIN,
            ClimateVariable::TempMax => COL_TMAX,
            ClimateVariable::TempAvg => COL_TAVG,
            ClimateVariable::Evapotranspiration => COL_ET,
        }
    }
}

impl fmt::Display for ClimateVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.column())
    }
}

/// A wrapper around a Polars `LazyFrame` holding daily climate data for a
/// single station.
///
/// Columns: `stn`, `date`, `radiation`, `prcp`, `tmin`, `tmax`, `tavg`, `et`,
/// one row per calendar day returned by the service. Raw fields that the
/// service omitted are null, as is `et` on days where any of its inputs is
/// missing.
///
/// Instances are obtained via [`crate::KnmiHydro::daily_climate`]. Filtering
/// methods stay lazy; [`ClimateFrame::collect_daily`] and
/// [`ClimateFrame::series`] trigger computation.
#[derive(Clone)]
pub struct ClimateFrame {
    /// The underlying Polars LazyFrame containing the daily data.
    pub frame: LazyFrame,
    /// The station the data was requested for.
    pub station: Station,
}

impl fmt::Debug for ClimateFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // LazyFrame has no Debug impl; show the station and elide the plan.
        f.debug_struct("ClimateFrame")
            .field("station", &self.station)
            .finish_non_exhaustive()
    }
}

impl ClimateFrame {
    pub(crate) fn new(frame: LazyFrame, station: Station) -> Self {
        Self { frame, station }
    }

    /// Applies an arbitrary Polars predicate, returning a new lazily filtered
    /// `ClimateFrame`.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use knmi_hydro::{KnmiHydro, Station};
    /// use chrono::NaiveDate;
    /// use polars::prelude::{col, lit};
    ///
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let client = KnmiHydro::new()?;
    /// let climate = client
    ///     .daily_climate()
    ///     .station(Station(260))
    ///     .start(NaiveDate::from_ymd_opt(2023, 1, 1).unwrap())
    ///     .end(NaiveDate::from_ymd_opt(2023, 12, 31).unwrap())
    ///     .call()
    ///     .await?;
    ///
    /// // Days with more than 5 mm of rain.
    /// let wet_days = climate.filter(col("prcp").gt(lit(5.0f64)));
    /// println!("{}", wet_days.frame.collect()?);
    /// # Ok(())
    /// # }
    /// ```
    pub fn filter(&self, predicate: Expr) -> ClimateFrame {
        ClimateFrame::new(self.frame.clone().filter(predicate), self.station)
    }

    /// Restricts the frame to dates within `start..=end`.
    pub fn get_range(&self, start: NaiveDate, end: NaiveDate) -> ClimateFrame {
        self.filter(
            col(COL_DATE)
                .gt_eq(lit(start))
                .and(col(COL_DATE).lt_eq(lit(end))),
        )
    }

    /// Restricts the frame to a single date; collecting yields zero or one
    /// row.
    pub fn get_at(&self, date: NaiveDate) -> ClimateFrame {
        self.filter(col(COL_DATE).eq(lit(date)))
    }

    /// Collects the frame into typed per-day records, sorted by date.
    pub fn collect_daily(&self) -> Result<Vec<DailyClimate>, KnmiHydroError> {
        let df = self
            .frame
            .clone()
            .collect()
            .map_err(KnmiDataError::DataFrameProcessing)?;

        let dates = get_column(&df, COL_DATE)?
            .date()
            .map_err(KnmiDataError::DataFrameProcessing)?;
        let radiation = get_column(&df, COL_RADIATION)?;
        let prcp = get_column(&df, COL_PRCP)?;
        let tmin = get_column(&df, COL_TMIN)?;
        let tmax = get_column(&df, COL_TMAX)?;
        let tavg = get_column(&df, COL_TAVG)?;
        let et = get_column(&df, COL_ET)?;

        let mut days = Vec::with_capacity(df.height());
        for idx in 0..df.height() {
            let date = dates
                .get(idx)
                .and_then(date_from_epoch_days)
                .ok_or_else(|| KnmiDataError::UnexpectedData {
                    station: self.station,
                    message: format!("invalid date in row {idx}"),
                })?;
            days.push(DailyClimate {
                date,
                radiation: get_opt_float(radiation, idx),
                precipitation: get_opt_float(prcp, idx),
                temp_min: get_opt_float(tmin, idx),
                temp_max: get_opt_float(tmax, idx),
                temp_avg: get_opt_float(tavg, idx),
                evapotranspiration: get_opt_float(et, idx),
            });
        }
        Ok(days)
    }

    /// Extracts one climate variable as a [`TimeSeries`] indexed by date.
    pub fn series(&self, variable: ClimateVariable) -> Result<TimeSeries, KnmiHydroError> {
        let df = self
            .frame
            .clone()
            .select([
                col(COL_DATE).alias(COL_TIME),
                col(variable.column()).alias(COL_VALUE),
            ])
            .collect()
            .map_err(KnmiDataError::DataFrameProcessing)?;
        Ok(TimeSeries::from_frame(df)?)
    }

    /// The precipitation and evapotranspiration series, sharing one date
    /// domain.
    pub fn prec_evap(&self) -> Result<(TimeSeries, TimeSeries), KnmiHydroError> {
        Ok((
            self.series(ClimateVariable::Precipitation)?,
            self.series(ClimateVariable::Evapotranspiration)?,
        ))
    }
}

/// Retrieves a column by name from a DataFrame.
fn get_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Column, KnmiDataError> {
    df.column(name)
        .map_err(|e| KnmiDataError::ColumnNotFound(name.to_string(), e))
}

/// Extracts an optional float value from a specific row of a Column.
fn get_opt_float(column: &Column, idx: usize) -> Option<f64> {
    column.f64().ok().and_then(|ca| ca.get(idx))
}

fn date_from_epoch_days(days: i32) -> Option<NaiveDate> {
    NaiveDate::default().checked_add_signed(chrono::Duration::days(days as i64))
}
