pub mod error;
pub mod open_data;
