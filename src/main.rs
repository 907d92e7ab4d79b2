// src/main.rs
use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use ndwi_calc::batch::process_batch;
use ndwi_calc::cli::{Cli, Commands};
use ndwi_calc::processing::{BandSource, NdwiJob, ParallelProcessor};
use ndwi_calc::render::PlotOptions;

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    let processor = ParallelProcessor::new(cli.threads);

    match &cli.command {
        Commands::Ndwi {
            green,
            nir,
            output,
            plot,
            green_band,
            nir_band,
            blocked,
            title,
        } => {
            let mut plot_options = PlotOptions::default();
            if let Some(title) = title {
                plot_options.title = title.clone();
            }

            let job = NdwiJob {
                green: BandSource::new(green.clone(), *green_band as usize),
                nir: BandSource::new(nir.clone(), *nir_band as usize),
                output: output.clone(),
                plot: plot.clone(),
                writer: cli.writer_options(),
                plot_options,
            };

            if *blocked {
                job.run_blocked(&processor)?;
            } else {
                job.run()?;
            }

            if let Some(output) = output {
                info!("Processing complete: {}", output.display());
            }
        }
        Commands::Batch { config } => {
            process_batch(config, &processor)?;
        }
    }

    Ok(())
}
