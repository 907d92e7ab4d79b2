// src/error.rs
use thiserror::Error;

/// Errors raised by the NDWI calculator itself.
///
/// Shapes are reported as `(rows, cols)`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NdwiError {
    #[error("band shape mismatch: green is {green_rows}x{green_cols}, nir is {nir_rows}x{nir_cols}")]
    ShapeMismatch {
        green_rows: usize,
        green_cols: usize,
        nir_rows: usize,
        nir_cols: usize,
    },

    #[error("{band} band is empty: {rows}x{cols}")]
    EmptyInput {
        band: &'static str,
        rows: usize,
        cols: usize,
    },

    #[error("input band {index} requested but only {provided} provided")]
    MissingBand { index: usize, provided: usize },

    #[error("band data length {len} does not match {rows}x{cols}")]
    InvalidDimensions { rows: usize, cols: usize, len: usize },
}

pub type Result<T> = std::result::Result<T, NdwiError>;
