//! Retrieval and parsing of daily climate observations from the KNMI
//! daggegevens service, including the Hargreaves evapotranspiration column.

use crate::climate::error::KnmiDataError;
use crate::types::climate_frame::{
    COL_DATE, COL_ET, COL_PRCP, COL_RADIATION, COL_STN, COL_TAVG, COL_TMAX, COL_TMIN,
};
use crate::types::station::Station;
use chrono::NaiveDate;
use log::{info, warn};
use polars::frame::DataFrame;
use polars::prelude::*;
use reqwest::Client;
use std::io::Write;
use tempfile::NamedTempFile;
use tokio::task;

pub(crate) const DAGGEGEVENS_URL: &str =
    "https://www.daggegevens.knmi.nl/klimatologie/daggegevens";

/// Variables requested from the service, in response column order.
const DAGGEGEVENS_VARS: &str = "Q:RH:TN:TX:TG";

/// Column layout of a daggegevens data row, using the service's own names.
const RAW_COLUMNS: [&str; 7] = ["STN", "DATE", "Q", "RH", "TN", "TX", "TG"];

const COMMENT_MARKER: char = '#';

pub(crate) struct ClimateDataLoader {
    endpoint: String,
    http: Client,
}

impl ClimateDataLoader {
    pub(crate) fn new(endpoint: String, http: Client) -> ClimateDataLoader {
        ClimateDataLoader { endpoint, http }
    }

    /// Fetches one station's daily observations for `start..=end` and returns
    /// the derived climate frame (rescaled raw fields plus the `et` column).
    ///
    /// Exactly one outbound POST is issued per call; an inverted range is
    /// rejected before any network I/O.
    pub(crate) async fn fetch_daily(
        &self,
        station: Station,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<DataFrame, KnmiDataError> {
        if start > end {
            return Err(KnmiDataError::InvalidDateRange { start, end });
        }

        let body = self.download(station, start, end).await?;
        let df = task::spawn_blocking(move || parse_daily_body(&body, station)).await??;
        info!("Parsed {} daily rows for station {}", df.height(), station);
        Ok(df)
    }

    /// Posts the form request and returns the raw response text.
    async fn download(
        &self,
        station: Station,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<String, KnmiDataError> {
        let params = [
            ("start", start.format("%Y%m%d").to_string()),
            ("end", end.format("%Y%m%d").to_string()),
            ("stns", station.to_string()),
            ("vars", DAGGEGEVENS_VARS.to_string()),
            ("fmt", "csv".to_string()),
        ];
        info!(
            "Requesting daggegevens for station {} from {} to {}",
            station, start, end
        );

        let response = self
            .http
            .post(&self.endpoint)
            .form(&params)
            .send()
            .await
            .map_err(|e| KnmiDataError::NetworkRequest(self.endpoint.clone(), e))?;

        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                warn!("HTTP error for {}: {:?}", self.endpoint, e);
                return Err(if let Some(status) = e.status() {
                    KnmiDataError::HttpStatus {
                        url: self.endpoint.clone(),
                        status,
                        source: e,
                    }
                } else {
                    KnmiDataError::NetworkRequest(self.endpoint.clone(), e)
                });
            }
        };

        response
            .text()
            .await
            .map_err(|e| KnmiDataError::BodyRead(self.endpoint.clone(), e))
    }
}

/// Parses a daggegevens response body into the derived climate frame.
///
/// Comment lines are stripped, the remaining rows are read as headerless CSV
/// with the fixed seven-column layout, raw values are rescaled to physical
/// units and the Hargreaves `et` column is appended. An all-comment body
/// yields an empty frame with the full schema. Blocking; run on a blocking
/// thread from async contexts.
pub(crate) fn parse_daily_body(
    body: &str,
    station: Station,
) -> Result<DataFrame, KnmiDataError> {
    let data = body
        .lines()
        .filter(|line| !line.starts_with(COMMENT_MARKER))
        .collect::<Vec<_>>()
        .join("\n");

    if data.trim().is_empty() {
        info!("Daggegevens returned no data rows for station {}", station);
        return empty_daily_frame();
    }

    let raw = csv_to_dataframe(&data, station)?;
    derive_daily(raw)
}

/// Reads headerless CSV text into a DataFrame with the raw daggegevens column
/// names. All columns are read as strings; the service pads fields with
/// spaces and leaves missing values empty, so typing happens later under a
/// lenient cast.
fn csv_to_dataframe(data: &str, station: Station) -> Result<DataFrame, KnmiDataError> {
    let mut temp_file = NamedTempFile::new().map_err(|e| KnmiDataError::CsvReadIo {
        station,
        source: e,
    })?;
    temp_file
        .write_all(data.as_bytes())
        .map_err(|e| KnmiDataError::CsvReadIo {
            station,
            source: e,
        })?;
    temp_file.flush().map_err(|e| KnmiDataError::CsvReadIo {
        station,
        source: e,
    })?;

    let mut df = CsvReadOptions::default()
        .with_has_header(false)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(temp_file.path().to_path_buf()))
        .map_err(|e| KnmiDataError::CsvReadPolars {
            station,
            source: e,
        })?
        .finish()
        .map_err(|e| KnmiDataError::CsvReadPolars {
            station,
            source: e,
        })?;

    if df.width() != RAW_COLUMNS.len() {
        warn!(
            "CSV column count ({}) does not match the daggegevens layout ({}) for station {}",
            df.width(),
            RAW_COLUMNS.len(),
            station
        );
        return Err(KnmiDataError::SchemaMismatch {
            station,
            expected: RAW_COLUMNS.len(),
            found: df.width(),
        });
    }

    df.set_column_names(RAW_COLUMNS.iter().copied())
        .map_err(|e| KnmiDataError::ColumnRename {
            station,
            source: e,
        })?;

    Ok(df)
}

/// Rescales the raw columns to physical units and appends the Hargreaves
/// evapotranspiration column.
///
/// The service reports radiation in J/cm² (× 0.01 → MJ/m²/day) and
/// precipitation and temperatures in tenths (÷ 10 → mm/day and °C); the
/// divisors must match the service convention exactly or every derived value
/// is off by an order of magnitude.
fn derive_daily(raw: DataFrame) -> Result<DataFrame, KnmiDataError> {
    let trimmed = |name: &str| col(name).str().strip_chars(lit(NULL));
    let number = |name: &str| trimmed(name).cast(DataType::Float64);

    let mut df = raw
        .lazy()
        .select([
            trimmed("STN").cast(DataType::Int32).alias(COL_STN),
            trimmed("DATE")
                .str()
                .to_date(StrptimeOptions {
                    format: Some("%Y%m%d".into()),
                    strict: false,
                    ..StrptimeOptions::default()
                })
                .alias(COL_DATE),
            (number("Q") * lit(0.01)).alias(COL_RADIATION),
            (number("RH") / lit(10.0)).alias(COL_PRCP),
            (number("TN") / lit(10.0)).alias(COL_TMIN),
            (number("TX") / lit(10.0)).alias(COL_TMAX),
            (number("TG") / lit(10.0)).alias(COL_TAVG),
        ])
        .sort([COL_DATE], Default::default())
        .collect()?;

    let radiation = df.column(COL_RADIATION)?.f64()?;
    let tmin = df.column(COL_TMIN)?.f64()?;
    let tmax = df.column(COL_TMAX)?.f64()?;
    let tavg = df.column(COL_TAVG)?.f64()?;

    let mut et: Vec<Option<f64>> = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        et.push(hargreaves_et(
            tavg.get(idx),
            tmax.get(idx),
            tmin.get(idx),
            radiation.get(idx),
        ));
    }

    df.with_column(Series::new(COL_ET.into(), et))?;
    Ok(df)
}

/// Hargreaves potential evapotranspiration for one day, in mm/day.
///
/// `ET = 0.0023 × (Tavg + 17.8) × sqrt(Tmax − Tmin) × Ra` with temperatures
/// in °C and radiation in MJ/m²/day. Any missing input yields a missing
/// estimate, as does an inverted temperature span (Tmax < Tmin, a data
/// artifact that would otherwise put a negative number under the root).
pub(crate) fn hargreaves_et(
    tavg: Option<f64>,
    tmax: Option<f64>,
    tmin: Option<f64>,
    radiation: Option<f64>,
) -> Option<f64> {
    let (tavg, tmax, tmin, radiation) = (tavg?, tmax?, tmin?, radiation?);
    let span = tmax - tmin;
    if span < 0.0 {
        return None;
    }
    Some(0.0023 * (tavg + 17.8) * span.sqrt() * radiation)
}

fn empty_daily_frame() -> Result<DataFrame, KnmiDataError> {
    let columns = vec![
        Series::new_empty(COL_STN.into(), &DataType::Int32).into_column(),
        Series::new_empty(COL_DATE.into(), &DataType::Date).into_column(),
        Series::new_empty(COL_RADIATION.into(), &DataType::Float64).into_column(),
        Series::new_empty(COL_PRCP.into(), &DataType::Float64).into_column(),
        Series::new_empty(COL_TMIN.into(), &DataType::Float64).into_column(),
        Series::new_empty(COL_TMAX.into(), &DataType::Float64).into_column(),
        Series::new_empty(COL_TAVG.into(), &DataType::Float64).into_column(),
        Series::new_empty(COL_ET.into(), &DataType::Float64).into_column(),
    ];
    DataFrame::new(columns).map_err(KnmiDataError::DataFrameProcessing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{serve, Reply};
    use crate::types::climate_frame::ClimateFrame;

    /// A plausible daggegevens response: comment preamble, space-padded
    /// fields, values in the service's raw units.
    const FIXTURE: &str = "\
# BRON: KONINKLIJK NEDERLANDS METEOROLOGISCH INSTITUUT (KNMI)
# Q = Globale straling (in J/cm2); RH = Etmaalsom van de neerslag (in 0.1 mm)
# STN,YYYYMMDD,    Q,   RH,   TN,   TX,   TG
  249,20240101,  250,  123,  100,  200,  155
  249,20240102, 1500,   40,  100,  200,  150
  249,20240103,  800,   -1,   20,  110,   65
";

    fn frame_for(body: &str) -> ClimateFrame {
        let df = parse_daily_body(body, Station(249)).unwrap();
        ClimateFrame::new(df.lazy(), Station(249))
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[test]
    fn rescaling_is_exact() {
        let days = frame_for(FIXTURE).collect_daily().unwrap();
        assert_eq!(days.len(), 3);

        let first = &days[0];
        assert_eq!(first.date, date(1));
        assert_eq!(first.radiation, Some(2.5));
        assert_eq!(first.precipitation, Some(12.3));
        assert_eq!(first.temp_min, Some(10.0));
        assert_eq!(first.temp_max, Some(20.0));
        assert_eq!(first.temp_avg, Some(15.5));
    }

    #[test]
    fn hargreaves_concrete_case() {
        // Tavg=15.0, Tmax=20.0, Tmin=10.0, Ra=15.0 -> 0.0023*32.8*sqrt(10)*15
        let days = frame_for(FIXTURE).collect_daily().unwrap();
        let et = days[1].evapotranspiration.unwrap();
        assert!((et - 3.578).abs() < 1e-3, "et was {et}");

        let direct = hargreaves_et(Some(15.0), Some(20.0), Some(10.0), Some(15.0)).unwrap();
        assert!((direct - 3.578).abs() < 1e-3);
    }

    #[test]
    fn trace_precipitation_is_carried_through() {
        // The service encodes trace amounts as -1 raw (-0.1 mm); interpreting
        // them is a presentation concern.
        let days = frame_for(FIXTURE).collect_daily().unwrap();
        assert_eq!(days[2].precipitation, Some(-0.1));
    }

    #[test]
    fn missing_input_yields_missing_et_but_keeps_precipitation() {
        let body = "\
# STN,YYYYMMDD,    Q,   RH,   TN,   TX,   TG
  249,20240101,  250,  123,  100,     ,  155
";
        let days = frame_for(body).collect_daily().unwrap();
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].temp_max, None);
        assert_eq!(days[0].evapotranspiration, None);
        assert_eq!(days[0].precipitation, Some(12.3));
    }

    #[test]
    fn inverted_temperature_span_yields_missing_et() {
        let body = "\
  249,20240101,  250,  123,  100,   50,   80
";
        let days = frame_for(body).collect_daily().unwrap();
        assert_eq!(days[0].temp_min, Some(10.0));
        assert_eq!(days[0].temp_max, Some(5.0));
        assert_eq!(days[0].evapotranspiration, None);

        assert_eq!(hargreaves_et(Some(8.0), Some(5.0), Some(10.0), Some(2.5)), None);
    }

    #[test]
    fn hargreaves_missing_inputs_propagate() {
        assert_eq!(hargreaves_et(None, Some(20.0), Some(10.0), Some(15.0)), None);
        assert_eq!(hargreaves_et(Some(15.0), None, Some(10.0), Some(15.0)), None);
        assert_eq!(hargreaves_et(Some(15.0), Some(20.0), None, Some(15.0)), None);
        assert_eq!(hargreaves_et(Some(15.0), Some(20.0), Some(10.0), None), None);
    }

    #[test]
    fn all_comment_body_yields_empty_frame_with_schema() {
        let df = parse_daily_body("# no data this period\n# at all\n", Station(249)).unwrap();
        assert_eq!(df.height(), 0);
        assert_eq!(
            df.get_column_names(),
            [COL_STN, COL_DATE, COL_RADIATION, COL_PRCP, COL_TMIN, COL_TMAX, COL_TAVG, COL_ET]
        );
    }

    #[test]
    fn column_count_deviation_is_a_schema_mismatch() {
        let body = "  249,20240101,  250,  123,  100,  200\n";
        let err = parse_daily_body(body, Station(249)).unwrap_err();
        assert!(matches!(
            err,
            KnmiDataError::SchemaMismatch {
                expected: 7,
                found: 6,
                ..
            }
        ));
    }

    #[test]
    fn rows_are_sorted_by_date() {
        let body = "\
  249,20240103,  800,   10,   20,  110,   65
  249,20240101,  250,  123,  100,  200,  155
";
        let days = frame_for(body).collect_daily().unwrap();
        assert_eq!(days[0].date, date(1));
        assert_eq!(days[1].date, date(3));
    }

    #[tokio::test]
    async fn fetch_parses_a_served_response() {
        let (url, _) = serve(Reply::csv(FIXTURE), 1).await;
        let loader = ClimateDataLoader::new(url, Client::new());

        let df = loader
            .fetch_daily(Station(249), date(1), date(3))
            .await
            .unwrap();
        assert_eq!(df.height(), 3);
    }

    #[tokio::test]
    async fn server_error_fails_the_fetch() {
        let (url, _) = serve(Reply::status("500 Internal Server Error"), 1).await;
        let loader = ClimateDataLoader::new(url, Client::new());

        let err = loader
            .fetch_daily(Station(249), date(1), date(3))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            KnmiDataError::HttpStatus { status, .. } if status.as_u16() == 500
        ));
    }

    #[tokio::test]
    async fn inverted_range_is_rejected_before_any_network_io() {
        // Port 9 (discard) is not listening; a network attempt would surface
        // as a NetworkRequest error instead.
        let loader = ClimateDataLoader::new(
            "http://127.0.0.1:9/klimatologie/daggegevens".to_string(),
            Client::new(),
        );

        let err = loader
            .fetch_daily(Station(249), date(3), date(1))
            .await
            .unwrap_err();
        assert!(matches!(err, KnmiDataError::InvalidDateRange { .. }));
    }
}
