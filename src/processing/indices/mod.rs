// src/processing/indices/mod.rs
pub mod ndwi;

// Re-export indices
pub use ndwi::{calculate_ndwi, ndwi_pixel, NDWI};
