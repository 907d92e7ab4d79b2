// src/lib.rs
pub mod batch;
pub mod cli;
pub mod error;
pub mod io;
pub mod processing;
pub mod render;

pub use error::NdwiError;
pub use processing::indices::calculate_ndwi;
pub use processing::Band;

// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
