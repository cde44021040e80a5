pub mod climate_frame;
pub mod daily_climate;
pub mod station;
