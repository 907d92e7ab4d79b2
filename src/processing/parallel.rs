// src/processing/parallel.rs
use std::{
    path::{Path, PathBuf},
    thread,
};

use anyhow::{anyhow, Context, Result};
use flume::{Receiver, Sender};
use gdal::Dataset;
use itertools::iproduct;
use tracing::{debug, info, warn};

use crate::error;
use crate::io::reader::{open_dataset, RasterProfile};
use crate::io::writer::{create_output, write_window, WriterOptions};
use crate::processing::band::Band;
use crate::processing::indices::ndwi::check_shapes;

/// Fallback window edge when the source raster reports no block size.
const DEFAULT_REGION_SIZE: usize = 256;

/// One band of one raster file; band numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BandSource {
    pub path: PathBuf,
    pub band: usize,
}

impl BandSource {
    pub fn new(path: impl Into<PathBuf>, band: usize) -> Self {
        Self {
            path: path.into(),
            band,
        }
    }
}

/// Pixel window, `offset` and `size` in `(x, y)` / `(cols, rows)` order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Window {
    offset: (usize, usize),
    size: (usize, usize),
}

struct WindowResult {
    window: Window,
    block: Band,
}

/// Block-wise processor for scenes that should not be held in memory whole.
///
/// Windows of every input are read by a pool of worker threads, each with
/// its own GDAL handles; results are written by the calling thread.
pub struct ParallelProcessor {
    io_threads: usize,
}

impl ParallelProcessor {
    pub fn new(io_threads: Option<usize>) -> Self {
        let io_threads = io_threads
            .filter(|&n| n > 0)
            .unwrap_or_else(|| num_cpus::get().max(4));

        Self { io_threads }
    }

    pub fn io_threads(&self) -> usize {
        self.io_threads
    }

    /// Run `calculator` over `inputs` window by window and write a single
    /// float32 band to `output_path`. Returns the profile of the output.
    pub fn process<I: IndexCalculator>(
        &self,
        calculator: &I,
        inputs: &[BandSource],
        output_path: &Path,
        options: &WriterOptions,
    ) -> Result<RasterProfile> {
        if inputs.len() < calculator.required_bands() {
            return Err(anyhow!(
                "Not enough input bands provided. Required: {}, provided: {}",
                calculator.required_bands(),
                inputs.len()
            ));
        }

        let profiles = inputs
            .iter()
            .map(|source| {
                let dataset = open_dataset(&source.path)?;
                RasterProfile::from_dataset(&dataset, source.band)
                    .with_context(|| format!("failed to read profile of {}", source.path.display()))
            })
            .collect::<Result<Vec<_>>>()?;

        let profile = profiles[0].clone();
        for other in &profiles[1..] {
            check_shapes(profile.shape(), other.shape())?;
        }

        let region_size = region_size(&inputs[0], &profile)?;
        let windows = windows(profile.width, profile.height, region_size);
        let workers = self.io_threads.min(windows.len());

        info!(
            index = calculator.name(),
            rows = profile.height,
            cols = profile.width,
            windows = windows.len(),
            workers,
            "processing in blocks"
        );

        let mut output = create_output(output_path, &profile, options)?;
        if let Err(e) = self.write_windows(calculator, inputs, &windows, workers, &mut output) {
            // A partially filled raster must not survive a failed run
            let driver = output.driver();
            drop(output);
            if let Err(cleanup) = driver.delete(output_path) {
                warn!(path = %output_path.display(), error = %cleanup, "failed to remove partial output");
            }
            return Err(e);
        }

        info!(path = %output_path.display(), "block processing complete");
        Ok(profile)
    }

    fn write_windows<I: IndexCalculator>(
        &self,
        calculator: &I,
        inputs: &[BandSource],
        windows: &[Window],
        workers: usize,
        output: &mut Dataset,
    ) -> Result<()> {
        let mut output_band = output.rasterband(1)?;

        thread::scope(|scope| -> Result<()> {
            let (req_tx, req_rx) = flume::unbounded::<Window>();
            let (res_tx, res_rx) = flume::unbounded::<Result<WindowResult>>();

            for _ in 0..workers {
                let req_rx = req_rx.clone();
                let res_tx = res_tx.clone();
                scope.spawn(move || read_worker(calculator, inputs, req_rx, res_tx));
            }
            drop(res_tx);

            for window in windows {
                req_tx.send(*window)?;
            }
            drop(req_tx);

            for result in res_rx.iter() {
                match result {
                    Ok(WindowResult { window, block }) => {
                        debug!(x = window.offset.0, y = window.offset.1, "writing window");
                        write_window(&mut output_band, window.offset, block)?;
                    }
                    Err(e) => {
                        // Let idle workers see an empty queue and exit
                        while req_rx.try_recv().is_ok() {}
                        return Err(e);
                    }
                }
            }
            Ok(())
        })?;
        drop(output_band);

        output.flush_cache()?;
        Ok(())
    }
}

fn read_worker<I: IndexCalculator>(
    calculator: &I,
    inputs: &[BandSource],
    req_rx: Receiver<Window>,
    res_tx: Sender<Result<WindowResult>>,
) {
    let datasets = match inputs
        .iter()
        .map(|source| open_dataset(&source.path))
        .collect::<Result<Vec<_>>>()
    {
        Ok(datasets) => datasets,
        Err(e) => {
            let _ = res_tx.send(Err(e));
            return;
        }
    };

    for window in req_rx.iter() {
        let result = compute_window(calculator, inputs, &datasets, window);
        let failed = result.is_err();
        if res_tx.send(result).is_err() || failed {
            return;
        }
    }
}

fn compute_window<I: IndexCalculator>(
    calculator: &I,
    inputs: &[BandSource],
    datasets: &[Dataset],
    window: Window,
) -> Result<WindowResult> {
    let (cols, rows) = window.size;
    let blocks = inputs
        .iter()
        .zip(datasets)
        .map(|(source, dataset)| -> Result<Band> {
            let band = dataset.rasterband(source.band)?;
            let buffer = band
                .read_as::<f32>(
                    (window.offset.0 as isize, window.offset.1 as isize),
                    window.size,
                    window.size,
                    None,
                )
                .with_context(|| format!("failed to read window of {}", source.path.display()))?;
            Ok(Band::new(rows, cols, buffer.data().to_vec())?)
        })
        .collect::<Result<Vec<_>>>()?;

    let block = calculator.calculate(&blocks)?;
    Ok(WindowResult { window, block })
}

/// Window size from the first input's natural block size, never larger than
/// the raster itself.
fn region_size(source: &BandSource, profile: &RasterProfile) -> Result<(usize, usize)> {
    let dataset = open_dataset(&source.path)?;
    let band = dataset.rasterband(source.band)?;
    let block_size = band.block_size();

    let region = if block_size.0 > 0 && block_size.1 > 0 {
        block_size
    } else {
        (DEFAULT_REGION_SIZE, DEFAULT_REGION_SIZE)
    };

    Ok((region.0.min(profile.width), region.1.min(profile.height)))
}

fn windows(width: usize, height: usize, region_size: (usize, usize)) -> Vec<Window> {
    let blocks_x = width.div_ceil(region_size.0);
    let blocks_y = height.div_ceil(region_size.1);

    iproduct!(0..blocks_y, 0..blocks_x)
        .map(|(by, bx)| {
            let offset = (bx * region_size.0, by * region_size.1);
            let size = (
                region_size.0.min(width - offset.0),
                region_size.1.min(height - offset.1),
            );
            Window { offset, size }
        })
        .collect()
}

/// Trait for spectral index calculators
pub trait IndexCalculator: Send + Sync {
    /// Calculate the index from the provided input bands
    fn calculate(&self, inputs: &[Band]) -> error::Result<Band>;

    /// Return the number of required input bands
    fn required_bands(&self) -> usize;

    /// Return the name of the index
    fn name(&self) -> &str;
}
