use crate::climate::error::KnmiDataError;
use crate::platform::error::PlatformError;
use crate::series::error::SeriesError;
use crate::store::error::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum KnmiHydroError {
    #[error(transparent)]
    KnmiData(#[from] KnmiDataError),

    #[error(transparent)]
    Platform(#[from] PlatformError),

    #[error(transparent)]
    Series(#[from] SeriesError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Failed to construct the HTTP client")]
    HttpClient(#[source] reqwest::Error),
}
