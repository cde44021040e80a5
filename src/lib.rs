mod calibration;
mod climate;
mod error;
mod knmi_hydro;
mod platform;
mod series;
mod store;
mod types;
mod utils;

#[cfg(test)]
mod test_support;

pub use error::KnmiHydroError;
pub use knmi_hydro::*;

pub use calibration::*;

pub use series::align::*;
pub use series::frame::{SeriesPoint, TimeSeries};

pub use types::climate_frame::*;
pub use types::daily_climate::DailyClimate;
pub use types::station::*;

pub use climate::error::KnmiDataError;
pub use climate::series_cache::ClimateCache;
pub use platform::error::PlatformError;
pub use platform::open_data::CatalogSeries;
pub use series::error::SeriesError;
pub use store::error::StoreError;
pub use store::series_store::*;
