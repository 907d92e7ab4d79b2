// src/processing/indices/ndwi.rs
use itertools::izip;
use rayon::prelude::*;

use crate::error::{NdwiError, Result};
use crate::processing::band::Band;
use crate::processing::parallel::IndexCalculator;

/// Value written for pixels where the index is undefined.
pub const DEGENERATE_VALUE: f32 = 0.0;

/// NDWI for a single pixel: `(green - nir) / (green + nir)`.
///
/// A zero denominator or a non-finite quotient yields [`DEGENERATE_VALUE`].
#[inline]
pub fn ndwi_pixel(green: f32, nir: f32) -> f32 {
    let denominator = green + nir;
    if denominator == 0.0 {
        return DEGENERATE_VALUE;
    }

    let value = (green - nir) / denominator;
    if value.is_finite() {
        value
    } else {
        DEGENERATE_VALUE
    }
}

/// Check that both bands are non-empty and share one shape.
pub fn check_bands(green: &Band, nir: &Band) -> Result<()> {
    check_shapes(green.shape(), nir.shape())
}

/// Shape validation on `(rows, cols)` pairs, for callers that know the
/// dimensions before any pixel is read.
pub fn check_shapes(green: (usize, usize), nir: (usize, usize)) -> Result<()> {
    for (band, (rows, cols)) in [("green", green), ("nir", nir)] {
        if rows == 0 || cols == 0 {
            return Err(NdwiError::EmptyInput { band, rows, cols });
        }
    }

    if green != nir {
        return Err(NdwiError::ShapeMismatch {
            green_rows: green.0,
            green_cols: green.1,
            nir_rows: nir.0,
            nir_cols: nir.1,
        });
    }

    Ok(())
}

/// Compute the Normalized Difference Water Index (McFeeters, 1996).
///
/// Both inputs are borrowed and left untouched; the result is a new band
/// of the same shape in which every value is finite.
pub fn calculate_ndwi(green: &Band, nir: &Band) -> Result<Band> {
    check_bands(green, nir)?;

    let (rows, cols) = green.shape();
    let mut result_data = vec![DEGENERATE_VALUE; rows * cols];

    // Rows are independent, so the parallel split does not affect the output
    result_data
        .par_chunks_mut(cols)
        .zip(green.data().par_chunks(cols))
        .zip(nir.data().par_chunks(cols))
        .for_each(|((out_row, green_row), nir_row)| {
            for (out, &g, &n) in izip!(out_row, green_row, nir_row) {
                *out = ndwi_pixel(g, n);
            }
        });

    Band::new(rows, cols, result_data)
}

/// Normalized Difference Water Index (NDWI) calculator
pub struct NDWI {
    green_index: usize,
    nir_index: usize,
    name: String,
}

impl NDWI {
    pub fn new(green_index: usize, nir_index: usize, name: Option<String>) -> Self {
        Self {
            green_index,
            nir_index,
            name: name.unwrap_or_else(|| "NDWI".to_string()),
        }
    }

    fn input<'a>(&self, inputs: &'a [Band], index: usize) -> Result<&'a Band> {
        inputs.get(index).ok_or(NdwiError::MissingBand {
            index,
            provided: inputs.len(),
        })
    }
}

impl Default for NDWI {
    fn default() -> Self {
        Self::new(0, 1, None)
    }
}

impl IndexCalculator for NDWI {
    fn calculate(&self, inputs: &[Band]) -> Result<Band> {
        let green = self.input(inputs, self.green_index)?;
        let nir = self.input(inputs, self.nir_index)?;
        calculate_ndwi(green, nir)
    }

    fn required_bands(&self) -> usize {
        self.green_index.max(self.nir_index) + 1
    }

    fn name(&self) -> &str {
        &self.name
    }
}
