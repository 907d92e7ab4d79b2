// src/batch.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::io::WriterOptions;
use crate::processing::{BandSource, NdwiJob, ParallelProcessor};
use crate::render::PlotOptions;

#[derive(Deserialize, Serialize, Debug)]
pub struct BatchConfig {
    #[serde(default)]
    pub global: GlobalParams,
    pub jobs: Vec<JobSpec>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct GlobalParams {
    #[serde(default = "default_compress")]
    pub compress: String,
    #[serde(default = "default_compress_level")]
    pub compress_level: u8,
    #[serde(default = "default_true")]
    pub tiled: bool,
}

impl Default for GlobalParams {
    fn default() -> Self {
        Self {
            compress: default_compress(),
            compress_level: default_compress_level(),
            tiled: default_true(),
        }
    }
}

fn default_compress() -> String {
    "DEFLATE".to_string()
}

fn default_compress_level() -> u8 {
    6
}

fn default_true() -> bool {
    true
}

fn default_band() -> usize {
    1
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct JobSpec {
    pub green: PathBuf,
    pub nir: PathBuf,
    #[serde(default = "default_band")]
    pub green_band: usize,
    #[serde(default = "default_band")]
    pub nir_band: usize,
    pub output: Option<PathBuf>,
    pub plot: Option<PathBuf>,
    pub title: Option<String>,
    #[serde(default)]
    pub blocked: bool,
    pub compress: Option<String>,
    pub compress_level: Option<u8>,
    pub tiled: Option<bool>,
}

impl JobSpec {
    /// Per-job writer settings, falling back to the global ones.
    pub fn writer_options(&self, global: &GlobalParams) -> WriterOptions {
        WriterOptions {
            compress: self.compress.clone().unwrap_or_else(|| global.compress.clone()),
            compress_level: self.compress_level.unwrap_or(global.compress_level),
            tiled: self.tiled.unwrap_or(global.tiled),
        }
    }

    pub fn to_job(&self, global: &GlobalParams) -> NdwiJob {
        let mut plot_options = PlotOptions::default();
        if let Some(title) = &self.title {
            plot_options.title = title.clone();
        }

        NdwiJob {
            green: BandSource::new(self.green.clone(), self.green_band),
            nir: BandSource::new(self.nir.clone(), self.nir_band),
            output: self.output.clone(),
            plot: self.plot.clone(),
            writer: self.writer_options(global),
            plot_options,
        }
    }
}

impl BatchConfig {
    pub fn from_json(content: &str) -> Result<Self> {
        let config: BatchConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read batch config {}", path.display()))?;
        Self::from_json(&content).with_context(|| format!("invalid batch config {}", path.display()))
    }

    /// Reject jobs that could never produce anything before running any of them.
    pub fn validate(&self) -> Result<()> {
        for (i, job) in self.jobs.iter().enumerate() {
            if job.output.is_none() && job.plot.is_none() {
                return Err(anyhow!("job {} has neither an output nor a plot", i + 1));
            }
            if job.blocked && job.output.is_none() {
                return Err(anyhow!("job {} is blocked but has no output", i + 1));
            }
            if job.green_band == 0 || job.nir_band == 0 {
                return Err(anyhow!("job {}: band numbers start at 1", i + 1));
            }
        }
        Ok(())
    }
}

pub fn process_batch(config_path: &Path, processor: &ParallelProcessor) -> Result<()> {
    let config = BatchConfig::load(config_path)?;

    info!("Starting batch processing with {} jobs", config.jobs.len());

    for (i, spec) in config.jobs.iter().enumerate() {
        info!(
            "[{}/{}] {} + {}",
            i + 1,
            config.jobs.len(),
            spec.green.display(),
            spec.nir.display()
        );

        let job = spec.to_job(&config.global);
        let result = if spec.blocked {
            job.run_blocked(processor)
        } else {
            job.run().map(|_| ())
        };
        result.with_context(|| format!("job {} failed", i + 1))?;
    }

    info!("Batch processing complete");
    Ok(())
}
