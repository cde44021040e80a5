pub mod align;
pub mod error;
pub mod frame;
