// src/io/writer.rs
use anyhow::{anyhow, Context, Result};
use gdal::raster::{Buffer, RasterBand, RasterCreationOptions};
use gdal::{Dataset, DriverManager, DriverType, Metadata};
use std::path::Path;
use tracing::info;

use super::reader::RasterProfile;
use crate::error::NdwiError;
use crate::processing::band::Band;

/// Rows handed to GDAL per write when persisting an in-memory grid.
const STRIP_ROWS: usize = 256;

/// GDAL creation options for the NDWI output raster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriterOptions {
    pub compress: String,
    pub compress_level: u8,
    pub tiled: bool,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            compress: "DEFLATE".to_string(),
            compress_level: 6,
            tiled: true,
        }
    }
}

impl WriterOptions {
    pub fn creation_options(&self) -> Vec<String> {
        let mut options = Vec::new();
        let compress = self.compress.to_uppercase();

        if compress != "NONE" {
            options.push(format!("COMPRESS={compress}"));

            match compress.as_str() {
                "DEFLATE" => options.push(format!("ZLEVEL={}", self.compress_level.min(9))),
                "ZSTD" => options.push(format!("ZSTD_LEVEL={}", self.compress_level.min(22))),
                _ => {}
            }
        }

        if self.tiled {
            options.push("TILED=YES".to_string());
        }

        options.push("NUM_THREADS=ALL_CPUS".to_string());
        options
    }
}

/// Create an empty single-band float32 raster carrying `profile`'s
/// georeferencing. The driver is picked from the output extension.
pub fn create_output(path: &Path, profile: &RasterProfile, options: &WriterOptions) -> Result<Dataset> {
    let driver = DriverManager::get_output_driver_for_dataset_name(path, DriverType::Raster)
        .ok_or_else(|| anyhow!("no raster driver for output {}", path.display()))?;

    let creation_options = RasterCreationOptions::from_iter(options.creation_options());
    let mut output = driver
        .create_with_band_type_with_options::<f32, _>(
            path,
            profile.width,
            profile.height,
            1,
            &creation_options,
        )
        .with_context(|| format!("failed to create {}", path.display()))?;

    if !profile.projection.is_empty() {
        output.set_projection(&profile.projection)?;
    }
    if let Some(geo_transform) = &profile.geo_transform {
        output.set_geo_transform(geo_transform)?;
    }

    {
        let mut band = output.rasterband(1)?;
        band.set_no_data_value(profile.nodata)?;
        band.set_description("NDWI")?;
    }

    Ok(output)
}

/// Write a window of NDWI values at pixel offset `(x, y)`.
pub fn write_window(band: &mut RasterBand, offset: (usize, usize), window: Band) -> Result<()> {
    let size = (window.cols(), window.rows());
    let mut buffer = Buffer::new(size, window.into_vec());
    band.write((offset.0 as isize, offset.1 as isize), size, &mut buffer)?;
    Ok(())
}

/// Persist a full NDWI grid as a single float32 band.
///
/// The grid is staged in strips of [`STRIP_ROWS`] rows, so at most one strip
/// is copied at a time.
pub fn write_ndwi(path: &Path, ndwi: &Band, profile: &RasterProfile, options: &WriterOptions) -> Result<()> {
    if ndwi.is_empty() {
        return Err(NdwiError::EmptyInput {
            band: "ndwi",
            rows: ndwi.rows(),
            cols: ndwi.cols(),
        }
        .into());
    }
    if ndwi.shape() != profile.shape() {
        return Err(anyhow!(
            "NDWI grid is {}x{} but the raster profile is {}x{}",
            ndwi.rows(),
            ndwi.cols(),
            profile.height,
            profile.width
        ));
    }

    let mut output = create_output(path, profile, options)?;
    {
        let mut band = output.rasterband(1)?;
        let cols = ndwi.cols();
        for (i, strip) in ndwi.data().chunks(STRIP_ROWS * cols).enumerate() {
            let size = (cols, strip.len() / cols);
            let mut buffer = Buffer::new(size, strip.to_vec());
            band.write((0, (i * STRIP_ROWS) as isize), size, &mut buffer)?;
        }
    }
    output.flush_cache()?;

    info!(path = %path.display(), rows = ndwi.rows(), cols = ndwi.cols(), "wrote NDWI raster");
    Ok(())
}
