//! Client for the measurement-series endpoints of the KNMI open-data platform.

use crate::platform::error::PlatformError;
use chrono::{DateTime, NaiveDate, Utc};
use log::{info, warn};
use reqwest::Client;
use serde::Deserialize;

pub(crate) const SERIES_CATALOG_URL: &str =
    "https://api.dataplatform.knmi.nl/open-data/v1/datasets/Actuele10mindataKNMIstations/versions/2.0/series";
pub(crate) const SERIES_VALUES_URL: &str =
    "https://api.dataplatform.knmi.nl/open-data/v1/datasets/Actuele10mindataKNMIstations/versions/2.0/data";

/// One entry of the platform's series catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogSeries {
    /// Identifier to pass when requesting the series' measurements.
    pub id: String,
    /// Display name; equals `id` when the platform publishes none.
    pub label: String,
}

#[derive(Debug, Deserialize)]
struct CatalogResponse {
    #[serde(default)]
    series: Vec<CatalogEntry>,
}

#[derive(Debug, Deserialize)]
struct CatalogEntry {
    id: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ValuesResponse {
    #[serde(default)]
    values: Vec<MeasurementValue>,
}

/// A single timestamped observation of a measurement series.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct MeasurementValue {
    pub(crate) timestamp: DateTime<Utc>,
    #[serde(default)]
    pub(crate) value: Option<f64>,
}

/// Performs the raw HTTP traffic against the open-data platform.
pub(crate) struct OpenDataClient {
    catalog_url: String,
    values_url: String,
    http: Client,
}

impl OpenDataClient {
    pub(crate) fn new(catalog_url: String, values_url: String, http: Client) -> OpenDataClient {
        OpenDataClient {
            catalog_url,
            values_url,
            http,
        }
    }

    /// Lists the measurement series the platform currently publishes.
    ///
    /// Entries without a name are labelled by their id; entries without an
    /// id fall back to their position in the catalog.
    pub(crate) async fn series_catalog(&self) -> Result<Vec<CatalogSeries>, PlatformError> {
        let body = self.get_text(&self.catalog_url, &[]).await?;
        let decoded: CatalogResponse = serde_json::from_str(&body)?;
        let catalog: Vec<CatalogSeries> = decoded
            .series
            .into_iter()
            .enumerate()
            .map(|(index, entry)| {
                let id = entry.id.unwrap_or_else(|| index.to_string());
                let label = entry.name.unwrap_or_else(|| id.clone());
                CatalogSeries { id, label }
            })
            .collect();
        info!("Fetched series catalog with {} entries", catalog.len());
        Ok(catalog)
    }

    /// Fetches the observations of one series over a day range, inclusive on
    /// both ends. The dates are widened to whole days in UTC.
    pub(crate) async fn measurement_values(
        &self,
        series_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<MeasurementValue>, PlatformError> {
        let query = [
            ("seriesId", series_id.to_string()),
            ("start", format!("{start}T00:00:00Z")),
            ("end", format!("{end}T23:59:59Z")),
        ];
        let body = self.get_text(&self.values_url, &query).await?;
        let decoded: ValuesResponse = serde_json::from_str(&body)?;
        info!(
            "Fetched {} values for series {} between {} and {}",
            decoded.values.len(),
            series_id,
            start,
            end
        );
        Ok(decoded.values)
    }

    async fn get_text(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<String, PlatformError> {
        let response = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| PlatformError::NetworkRequest(url.to_string(), e))?;

        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                warn!("HTTP error for {}: {:?}", url, e);
                return Err(if let Some(status) = e.status() {
                    PlatformError::HttpStatus {
                        url: url.to_string(),
                        status,
                        source: e,
                    }
                } else {
                    PlatformError::NetworkRequest(url.to_string(), e)
                });
            }
        };

        response
            .text()
            .await
            .map_err(|e| PlatformError::BodyRead(url.to_string(), e))
    }
}
