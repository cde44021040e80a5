//! This module provides the main entry point for fetching KNMI data. It
//! covers the daggegevens service (daily climate, with derived Hargreaves
//! evapotranspiration) and the open-data platform's measurement series.

use crate::climate::data_loader::{ClimateDataLoader, DAGGEGEVENS_URL};
use crate::error::KnmiHydroError;
use crate::platform::open_data::{
    CatalogSeries, OpenDataClient, SERIES_CATALOG_URL, SERIES_VALUES_URL,
};
use crate::series::frame::{SeriesPoint, TimeSeries};
use crate::types::climate_frame::ClimateFrame;
use crate::types::station::Station;
use bon::bon;
use chrono::NaiveDate;
use polars::prelude::IntoLazy;
use reqwest::Client;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// The service endpoints a [`KnmiHydro`] client talks to.
///
/// The defaults point at the public KNMI services; override individual
/// fields to run against a mirror or a local fixture.
///
/// # Examples
///
/// ```
/// use knmi_hydro::{Endpoints, KnmiHydro};
///
/// let client = KnmiHydro::with_endpoints(Endpoints {
///     daggegevens: "http://localhost:8080/daggegevens".to_string(),
///     ..Endpoints::default()
/// })?;
/// # let _ = client;
/// # Ok::<(), knmi_hydro::KnmiHydroError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Endpoints {
    /// POST endpoint of the daggegevens daily climate service.
    pub daggegevens: String,
    /// GET endpoint listing the open-data platform's measurement series.
    pub series_catalog: String,
    /// GET endpoint serving the values of one measurement series.
    pub series_values: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Endpoints {
            daggegevens: DAGGEGEVENS_URL.to_string(),
            series_catalog: SERIES_CATALOG_URL.to_string(),
            series_values: SERIES_VALUES_URL.to_string(),
        }
    }
}

/// The main client struct for accessing KNMI data.
///
/// This struct fetches daily climate data from the daggegevens service and
/// measurement series from the open-data platform. Every request goes out
/// over the network; wrap the client in a [`crate::ClimateCache`] when the
/// same climate range is requested repeatedly.
///
/// Create an instance using [`KnmiHydro::new()`] for the public services or
/// [`KnmiHydro::with_endpoints()`] to point it elsewhere.
///
/// # Examples
///
/// ```no_run
/// # use knmi_hydro::{KnmiHydro, KnmiHydroError};
/// # fn run() -> Result<(), KnmiHydroError> {
/// let client = KnmiHydro::new()?;
/// // Now you can use the client to fetch climate or measurement data.
/// # Ok(())
/// # }
/// ```
pub struct KnmiHydro {
    loader: ClimateDataLoader,
    open_data: OpenDataClient,
}

#[bon]
impl KnmiHydro {
    /// Creates a new `KnmiHydro` client against custom service endpoints.
    ///
    /// # Errors
    ///
    /// Returns [`KnmiHydroError::HttpClient`] if the underlying HTTP client
    /// cannot be constructed.
    pub fn with_endpoints(endpoints: Endpoints) -> Result<Self, KnmiHydroError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(KnmiHydroError::HttpClient)?;
        Ok(Self {
            loader: ClimateDataLoader::new(endpoints.daggegevens, http.clone()),
            open_data: OpenDataClient::new(
                endpoints.series_catalog,
                endpoints.series_values,
                http,
            ),
        })
    }

    /// Creates a new `KnmiHydro` client against the public KNMI services.
    ///
    /// # Errors
    ///
    /// Returns [`KnmiHydroError::HttpClient`] if the underlying HTTP client
    /// cannot be constructed.
    pub fn new() -> Result<Self, KnmiHydroError> {
        Self::with_endpoints(Endpoints::default())
    }

    /// Fetches daily climate data for one station over an inclusive date
    /// range.
    ///
    /// The returned [`ClimateFrame`] wraps a Polars `LazyFrame` with one row
    /// per day the service reported: rescaled radiation, precipitation and
    /// temperatures plus the derived Hargreaves evapotranspiration column.
    ///
    /// This method uses a builder pattern.
    ///
    /// # Arguments
    ///
    /// * `.station(Station)`: **Required.** The KNMI station code.
    /// * `.start(NaiveDate)`: **Required.** First day of the range.
    /// * `.end(NaiveDate)`: **Required.** Last day of the range, inclusive.
    ///
    /// # Errors
    ///
    /// Returns [`KnmiHydroError::KnmiData`] variants for an inverted date
    /// range, network or HTTP failures, and malformed CSV payloads.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use knmi_hydro::{KnmiHydro, KnmiHydroError, Station};
    /// # use chrono::NaiveDate;
    /// #
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), KnmiHydroError> {
    /// let client = KnmiHydro::new()?;
    ///
    /// let climate = client
    ///     .daily_climate()
    ///     .station(Station(260))
    ///     .start(NaiveDate::from_ymd_opt(2023, 1, 1).unwrap())
    ///     .end(NaiveDate::from_ymd_opt(2023, 12, 31).unwrap())
    ///     .call()
    ///     .await?;
    ///
    /// for day in climate.collect_daily()? {
    ///     println!("{}: {:?} mm", day.date, day.precipitation);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    #[builder]
    pub async fn daily_climate(
        &self,
        station: Station,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<ClimateFrame, KnmiHydroError> {
        let df = self.loader.fetch_daily(station, start, end).await?;
        Ok(ClimateFrame::new(df.lazy(), station))
    }

    /// Fetches the precipitation and evapotranspiration series for one
    /// station over an inclusive date range.
    ///
    /// Shorthand for [`KnmiHydro::daily_climate`] followed by
    /// [`ClimateFrame::prec_evap`]; the two series share one date domain, so
    /// they feed directly into [`crate::recharge`].
    ///
    /// This method uses a builder pattern.
    ///
    /// # Arguments
    ///
    /// * `.station(Station)`: **Required.** The KNMI station code.
    /// * `.start(NaiveDate)`: **Required.** First day of the range.
    /// * `.end(NaiveDate)`: **Required.** Last day of the range, inclusive.
    ///
    /// # Errors
    ///
    /// As [`KnmiHydro::daily_climate`], plus [`KnmiHydroError::Series`] if
    /// the fetched frame cannot be reshaped into series.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use knmi_hydro::{recharge, KnmiHydro, KnmiHydroError, Station};
    /// # use chrono::NaiveDate;
    /// #
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), KnmiHydroError> {
    /// let client = KnmiHydro::new()?;
    ///
    /// let (prec, evap) = client
    ///     .prec_evap()
    ///     .station(Station(249))
    ///     .start(NaiveDate::from_ymd_opt(2023, 1, 1).unwrap())
    ///     .end(NaiveDate::from_ymd_opt(2023, 6, 30).unwrap())
    ///     .call()
    ///     .await?;
    ///
    /// let net = recharge(&prec, &evap)?;
    /// println!("{} recharge days", net.len());
    /// # Ok(())
    /// # }
    /// ```
    #[builder]
    pub async fn prec_evap(
        &self,
        station: Station,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<(TimeSeries, TimeSeries), KnmiHydroError> {
        self.daily_climate()
            .station(station)
            .start(start)
            .end(end)
            .call()
            .await?
            .prec_evap()
    }

    /// Lists the measurement series the open-data platform publishes.
    ///
    /// # Errors
    ///
    /// Returns [`KnmiHydroError::Platform`] variants for network, HTTP and
    /// JSON decoding failures.
    pub async fn series_catalog(&self) -> Result<Vec<CatalogSeries>, KnmiHydroError> {
        Ok(self.open_data.series_catalog().await?)
    }

    /// Fetches one measurement series from the open-data platform as a
    /// [`TimeSeries`].
    ///
    /// The date range is inclusive and widened to whole days in UTC.
    /// Timestamps keep the platform's sampling (typically ten minutes);
    /// missing observations stay in the series as nulls.
    ///
    /// This method uses a builder pattern.
    ///
    /// # Arguments
    ///
    /// * `.series_id(&str)`: **Required.** Catalog id of the series.
    /// * `.start(NaiveDate)`: **Required.** First day of the range.
    /// * `.end(NaiveDate)`: **Required.** Last day of the range, inclusive.
    ///
    /// # Errors
    ///
    /// Returns [`KnmiHydroError::Platform`] variants for network, HTTP and
    /// JSON decoding failures, and [`KnmiHydroError::Series`] if the decoded
    /// values violate the series invariants.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use knmi_hydro::{KnmiHydro, KnmiHydroError};
    /// # use chrono::NaiveDate;
    /// #
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), KnmiHydroError> {
    /// let client = KnmiHydro::new()?;
    /// let catalog = client.series_catalog().await?;
    ///
    /// if let Some(series) = catalog.first() {
    ///     let values = client
    ///         .measurement_series()
    ///         .series_id(&series.id)
    ///         .start(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
    ///         .end(NaiveDate::from_ymd_opt(2024, 1, 7).unwrap())
    ///         .call()
    ///         .await?;
    ///     println!("{}: {} observations", series.label, values.len());
    /// }
    /// # Ok(())
    /// # }
    /// ```
    #[builder]
    pub async fn measurement_series(
        &self,
        series_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<TimeSeries, KnmiHydroError> {
        let values = self
            .open_data
            .measurement_values(series_id, start, end)
            .await?;
        let points = values.into_iter().map(|value| SeriesPoint {
            time: value.timestamp.naive_utc(),
            value: value.value,
        });
        Ok(TimeSeries::from_points(points)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::align::recharge;
    use crate::test_support::{serve, Reply};

    const CLIMATE_FIXTURE: &str = "\
# STN,YYYYMMDD,    Q,   RH,   TN,   TX,   TG
  249,20240101,  250,  123,  100,  200,  155
  249,20240102, 1500,   40,  100,  200,  150
  249,20240103,  800,   -1,   20,  110,   65
";

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn client_with_daggegevens(url: String) -> KnmiHydro {
        KnmiHydro::with_endpoints(Endpoints {
            daggegevens: url,
            ..Endpoints::default()
        })
        .unwrap()
    }

    fn client_with_values(url: String) -> KnmiHydro {
        KnmiHydro::with_endpoints(Endpoints {
            series_values: url,
            ..Endpoints::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn fetched_prec_evap_feed_directly_into_recharge() {
        let (url, _) = serve(Reply::csv(CLIMATE_FIXTURE), 1).await;
        let client = client_with_daggegevens(url);

        let (prec, evap) = client
            .prec_evap()
            .station(Station(249))
            .start(date(1))
            .end(date(3))
            .call()
            .await
            .unwrap();

        let net = recharge(&prec, &evap).unwrap();
        let values = net.values().unwrap();
        assert_eq!(values.len(), 3);

        // prcp 12.3, et = 0.0023 * (15.5 + 17.8) * sqrt(10) * 2.5
        let et_day1 = 0.0023 * 33.3 * 10.0f64.sqrt() * 2.5;
        assert!((values[0].unwrap() - (12.3 - et_day1)).abs() < 1e-9);
        // Trace precipitation (-0.1) still participates.
        let et_day3 = 0.0023 * 24.3 * 9.0f64.sqrt() * 8.0;
        assert!((values[2].unwrap() - (-0.1 - et_day3)).abs() < 1e-9);
    }

    #[tokio::test]
    async fn recharge_against_an_overlapping_head_series() {
        let (url, _) = serve(Reply::csv(CLIMATE_FIXTURE), 1).await;
        let client = client_with_daggegevens(url);

        let (prec, _) = client
            .prec_evap()
            .station(Station(249))
            .start(date(1))
            .end(date(3))
            .call()
            .await
            .unwrap();

        // Head observations cover Jan 2..4; only Jan 2..3 overlap the fetch.
        let head = TimeSeries::from_points((2..=4).map(|day| SeriesPoint {
            time: date(day).and_hms_opt(0, 0, 0).unwrap(),
            value: Some(day as f64 - 1.0),
        }))
        .unwrap();

        let net = recharge(&prec, &head).unwrap();
        let points = net.points().unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].time, date(2).and_hms_opt(0, 0, 0).unwrap());
        assert!((points[0].value.unwrap() - (4.0 - 1.0)).abs() < 1e-9);
        assert_eq!(points[1].time, date(3).and_hms_opt(0, 0, 0).unwrap());
        assert!((points[1].value.unwrap() - (-0.1 - 2.0)).abs() < 1e-9);
    }

    #[tokio::test]
    async fn daily_climate_exposes_typed_rows() {
        let (url, _) = serve(Reply::csv(CLIMATE_FIXTURE), 1).await;
        let client = client_with_daggegevens(url);

        let climate = client
            .daily_climate()
            .station(Station(249))
            .start(date(1))
            .end(date(3))
            .call()
            .await
            .unwrap();

        let days = climate.collect_daily().unwrap();
        assert_eq!(days.len(), 3);
        assert_eq!(days[0].date, date(1));
        assert_eq!(days[0].radiation, Some(2.5));
        assert_eq!(days[1].precipitation, Some(4.0));
        assert_eq!(days[2].temp_max, Some(11.0));
    }

    #[tokio::test]
    async fn measurement_series_becomes_a_time_series() {
        let body = r#"{"values":[
            {"timestamp":"2024-01-02T10:10:00Z","value":null},
            {"timestamp":"2024-01-02T10:00:00Z","value":1.5}
        ]}"#;
        let (url, _) = serve(Reply::json(body), 1).await;
        let client = client_with_values(url);

        let series = client
            .measurement_series()
            .series_id("neerslag_10m")
            .start(date(2))
            .end(date(2))
            .call()
            .await
            .unwrap();

        let points = series.points().unwrap();
        assert_eq!(points.len(), 2);
        // Sorted by time, nulls kept.
        assert_eq!(
            points[0].time,
            date(2).and_hms_opt(10, 0, 0).unwrap()
        );
        assert_eq!(points[0].value, Some(1.5));
        assert_eq!(points[1].value, None);
    }

    #[tokio::test]
    async fn inverted_range_never_reaches_the_network() {
        // Port 9 (discard) never answers; the request must fail before I/O.
        let client =
            client_with_daggegevens("http://127.0.0.1:9/daggegevens".to_string());

        let err = client
            .daily_climate()
            .station(Station(249))
            .start(date(3))
            .end(date(1))
            .call()
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            KnmiHydroError::KnmiData(crate::climate::error::KnmiDataError::InvalidDateRange {
                ..
            })
        ));
    }

    #[tokio::test]
    #[ignore = "hits the public KNMI service"]
    async fn live_daggegevens_round_trip() -> Result<(), KnmiHydroError> {
        let client = KnmiHydro::new()?;

        let (prec, evap) = client
            .prec_evap()
            .station(Station(260)) // De Bilt
            .start(NaiveDate::from_ymd_opt(2023, 1, 1).unwrap())
            .end(NaiveDate::from_ymd_opt(2023, 1, 31).unwrap())
            .call()
            .await?;

        assert_eq!(prec.len(), 31);
        assert_eq!(evap.len(), 31);
        Ok(())
    }
}
