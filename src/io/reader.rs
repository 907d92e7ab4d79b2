// src/io/reader.rs
use anyhow::{Context, Result};
use gdal::Dataset;
use std::path::Path;
use tracing::debug;

use crate::processing::band::Band;

/// Georeferencing carried from an input raster to the NDWI output.
///
/// Nothing in the calculation looks at these fields; they are forwarded to
/// the writer as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterProfile {
    pub projection: String,
    pub geo_transform: Option<[f64; 6]>,
    pub width: usize,
    pub height: usize,
    pub nodata: Option<f64>,
    pub driver: String,
}

impl RasterProfile {
    pub fn from_dataset(dataset: &Dataset, band_number: usize) -> Result<Self> {
        let (width, height) = dataset.raster_size();
        let band = dataset
            .rasterband(band_number)
            .with_context(|| format!("band {band_number} not found"))?;

        Ok(Self {
            projection: dataset.projection(),
            geo_transform: dataset.geo_transform().ok(),
            width,
            height,
            nodata: band.no_data_value(),
            driver: dataset.driver().short_name(),
        })
    }

    /// `(rows, cols)` of the raster this profile describes.
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }
}

pub fn open_dataset(path: &Path) -> Result<Dataset> {
    Dataset::open(path).with_context(|| format!("failed to open raster {}", path.display()))
}

/// Read one band (1-based, as GDAL numbers them) as `f32`, together with
/// the profile of its dataset.
pub fn read_band(path: &Path, band_number: usize) -> Result<(Band, RasterProfile)> {
    let dataset = open_dataset(path)?;
    let profile = RasterProfile::from_dataset(&dataset, band_number)
        .with_context(|| format!("failed to read profile of {}", path.display()))?;

    let band = dataset.rasterband(band_number)?;
    let (width, height) = (profile.width, profile.height);
    let buffer = band
        .read_as::<f32>((0, 0), (width, height), (width, height), None)
        .with_context(|| format!("failed to read band {band_number} of {}", path.display()))?;

    debug!(
        path = %path.display(),
        band = band_number,
        rows = height,
        cols = width,
        "read band"
    );

    let band = Band::new(height, width, buffer.data().to_vec())?;
    Ok((band, profile))
}
