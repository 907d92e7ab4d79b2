use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::io::WriterOptions;

#[derive(Parser)]
#[command(name = "ndwi-calc")]
#[command(about = "Normalized Difference Water Index calculator")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Reader threads for block processing (default: number of CPUs)
    #[arg(long, global = true)]
    pub threads: Option<usize>,

    /// Output compression (DEFLATE, LZW, ZSTD, NONE)
    #[arg(long, default_value = "DEFLATE", global = true)]
    pub compress: String,

    /// Compression level
    #[arg(long, default_value = "6", global = true)]
    pub compress_level: u8,

    /// Write a striped instead of a tiled output
    #[arg(long, global = true)]
    pub no_tiled: bool,
}

impl Cli {
    pub fn writer_options(&self) -> WriterOptions {
        WriterOptions {
            compress: self.compress.clone(),
            compress_level: self.compress_level,
            tiled: !self.no_tiled,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Normalized Difference Water Index: (GREEN-NIR)/(GREEN+NIR)
    #[command(group(
        clap::ArgGroup::new("destination")
            .required(true)
            .multiple(true)
            .args(["output", "plot"]),
    ))]
    Ndwi {
        /// Green band (A), e.g. Landsat 8 B3
        #[arg(short = 'a', long)]
        green: PathBuf,

        /// NIR band (B), e.g. Landsat 8 B5
        #[arg(short = 'b', long)]
        nir: PathBuf,

        /// Output raster path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Render a color-mapped PNG of the result
        #[arg(short, long)]
        plot: Option<PathBuf>,

        /// Band number to read from the green raster
        #[arg(long, default_value = "1", value_parser = clap::value_parser!(u16).range(1..))]
        green_band: u16,

        /// Band number to read from the NIR raster
        #[arg(long, default_value = "1", value_parser = clap::value_parser!(u16).range(1..))]
        nir_band: u16,

        /// Process window by window instead of loading whole bands
        #[arg(long, requires = "output")]
        blocked: bool,

        /// Plot title
        #[arg(long)]
        title: Option<String>,
    },

    /// Run NDWI jobs from a JSON configuration file
    Batch {
        /// Batch configuration file
        config: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn ndwi_requires_a_destination() {
        assert!(Cli::try_parse_from(["ndwi-calc", "ndwi", "-a", "g.tif", "-b", "n.tif"]).is_err());
        assert!(
            Cli::try_parse_from(["ndwi-calc", "ndwi", "-a", "g.tif", "-b", "n.tif", "-p", "x.png"]).is_ok()
        );
    }

    #[test]
    fn global_writer_options() {
        let cli = Cli::try_parse_from([
            "ndwi-calc", "ndwi", "-a", "g.tif", "-b", "n.tif", "-o", "o.tif", "--compress", "ZSTD",
            "--no-tiled",
        ])
        .unwrap();
        let options = cli.writer_options();
        assert_eq!(options.compress, "ZSTD");
        assert_eq!(options.compress_level, 6);
        assert!(!options.tiled);
    }

    #[test]
    fn band_zero_is_rejected() {
        assert!(Cli::try_parse_from([
            "ndwi-calc", "ndwi", "-a", "g.tif", "-b", "n.tif", "-o", "o.tif", "--green-band", "0",
        ])
        .is_err());
    }

    #[test]
    fn blocked_needs_output() {
        assert!(Cli::try_parse_from([
            "ndwi-calc", "ndwi", "-a", "g.tif", "-b", "n.tif", "-p", "p.png", "--blocked",
        ])
        .is_err());
    }
}
