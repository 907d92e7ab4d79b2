// src/processing/job.rs
use anyhow::{anyhow, Result};
use std::path::PathBuf;
use tracing::{info, warn};

use crate::io::{read_band, write_ndwi, WriterOptions};
use crate::processing::band::Band;
use crate::processing::indices::ndwi::{calculate_ndwi, NDWI};
use crate::processing::parallel::{BandSource, ParallelProcessor};
use crate::render::{save_plot, PlotOptions};

/// One NDWI computation: a green and a NIR band, plus where the result goes.
#[derive(Debug, Clone)]
pub struct NdwiJob {
    pub green: BandSource,
    pub nir: BandSource,
    /// Raster to write. `None` keeps the result in memory only.
    pub output: Option<PathBuf>,
    /// Image to render the result into.
    pub plot: Option<PathBuf>,
    pub writer: WriterOptions,
    pub plot_options: PlotOptions,
}

impl NdwiJob {
    pub fn new(green: impl Into<PathBuf>, nir: impl Into<PathBuf>) -> Self {
        Self {
            green: BandSource::new(green, 1),
            nir: BandSource::new(nir, 1),
            output: None,
            plot: None,
            writer: WriterOptions::default(),
            plot_options: PlotOptions::default(),
        }
    }

    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = Some(output.into());
        self
    }

    pub fn with_plot(mut self, plot: impl Into<PathBuf>) -> Self {
        self.plot = Some(plot.into());
        self
    }

    /// Read both bands, compute NDWI, then write and plot as requested.
    ///
    /// The NDWI band is returned whether or not anything was persisted. The
    /// output raster carries the green band's georeferencing.
    pub fn run(&self) -> Result<Band> {
        info!(
            green = %self.green.path.display(),
            nir = %self.nir.path.display(),
            "computing NDWI"
        );

        let (green, profile) = read_band(&self.green.path, self.green.band)?;
        let (nir, _) = read_band(&self.nir.path, self.nir.band)?;

        let ndwi = calculate_ndwi(&green, &nir)?;

        if let Some(output) = &self.output {
            write_ndwi(output, &ndwi, &profile, &self.writer)?;
        }

        if let Some(plot) = &self.plot {
            save_plot(plot, &ndwi, &self.plot_options)?;
        }

        Ok(ndwi)
    }

    /// Stream the computation block by block straight into the output raster.
    ///
    /// Requires `output`. A plot, if requested, is rendered from the written
    /// raster afterwards.
    pub fn run_blocked(&self, processor: &ParallelProcessor) -> Result<()> {
        let output = self
            .output
            .as_ref()
            .ok_or_else(|| anyhow!("block processing needs an output path"))?;

        processor.process(
            &NDWI::default(),
            &[self.green.clone(), self.nir.clone()],
            output,
            &self.writer,
        )?;

        if let Some(plot) = &self.plot {
            warn!("reading the full NDWI raster back to render the plot");
            let (ndwi, _) = read_band(output, 1)?;
            save_plot(plot, &ndwi, &self.plot_options)?;
        }

        Ok(())
    }
}
