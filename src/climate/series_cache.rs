//! Opt-in memoization of daily-climate fetches, keyed by request identity.

use crate::climate::error::KnmiDataError;
use crate::error::KnmiHydroError;
use crate::knmi_hydro::KnmiHydro;
use crate::series::frame::TimeSeries;
use crate::types::climate_frame::ClimateFrame;
use crate::types::station::Station;
use chrono::NaiveDate;
use polars::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};

type CacheKey = (Station, NaiveDate, NaiveDate);

/// An in-memory cache over [`KnmiHydro::daily_climate`] keyed by
/// `(station, start, end)`.
///
/// Each key is fetched at most once at a time: concurrent requests for the
/// same key share a single outbound call and all observe its result. A
/// failed fetch leaves the key unset so a later request retries. The
/// fetcher itself stays cache-free; layer this only where repeated
/// identical requests are expected.
///
/// # Examples
///
/// ```no_run
/// # use knmi_hydro::{ClimateCache, KnmiHydro, Station};
/// use chrono::NaiveDate;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), knmi_hydro::KnmiHydroError> {
/// let cache = ClimateCache::new(KnmiHydro::new()?);
/// let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
/// let end = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
///
/// // Only the first of these goes out over the network.
/// let (prec, _) = cache.prec_evap(Station(260), start, end).await?;
/// let (again, _) = cache.prec_evap(Station(260), start, end).await?;
/// assert_eq!(prec.len(), again.len());
/// # Ok(())
/// # }
/// ```
pub struct ClimateCache {
    client: KnmiHydro,
    cells: Mutex<HashMap<CacheKey, Arc<OnceCell<DataFrame>>>>,
}

impl ClimateCache {
    pub fn new(client: KnmiHydro) -> ClimateCache {
        ClimateCache {
            client,
            cells: Mutex::new(HashMap::new()),
        }
    }

    /// The wrapped client, for requests that should bypass the cache.
    pub fn client(&self) -> &KnmiHydro {
        &self.client
    }

    /// As [`KnmiHydro::daily_climate`], fetching each distinct request once.
    pub async fn daily_climate(
        &self,
        station: Station,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<ClimateFrame, KnmiHydroError> {
        let cell = {
            let mut cells = self.cells.lock().await;
            Arc::clone(cells.entry((station, start, end)).or_default())
        };

        let df = cell
            .get_or_try_init(|| async {
                let climate = self
                    .client
                    .daily_climate()
                    .station(station)
                    .start(start)
                    .end(end)
                    .call()
                    .await?;
                climate
                    .frame
                    .collect()
                    .map_err(|e| KnmiHydroError::from(KnmiDataError::DataFrameProcessing(e)))
            })
            .await?;

        Ok(ClimateFrame::new(df.clone().lazy(), station))
    }

    /// As [`KnmiHydro::prec_evap`], fetching each distinct request once.
    pub async fn prec_evap(
        &self,
        station: Station,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<(TimeSeries, TimeSeries), KnmiHydroError> {
        self.daily_climate(station, start, end).await?.prec_evap()
    }
}
