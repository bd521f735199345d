pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::domain::model::Layer;
#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "demproc")]
#[command(about = "Derive hydrological and terrain layers from a DEM with TauDEM and gdaldem")]
pub struct CliConfig {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log CPU and memory usage per stage")]
    pub monitor: bool,

    #[arg(long, global = true, help = "Emit logs as JSON lines")]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Derive every layer for a study site into <output-root>/<site>
    DeriveAll {
        /// Source DEM GeoTIFF
        dem: String,

        /// Study site name, used as the output directory name
        site: String,

        #[arg(long)]
        output_root: Option<String>,

        /// Trim this many cells from every edge of each derived layer
        #[arg(long)]
        trim: Option<usize>,

        /// Layers to skip (comma-separated); existing files still feed later stages
        #[arg(long, value_enum, value_delimiter = ',')]
        skip: Vec<Layer>,

        #[arg(long)]
        execution_id: Option<String>,

        /// Show the commands that would run without executing them
        #[arg(long)]
        dry_run: bool,
    },

    /// Remove pits to make a hydrologically correct DEM
    HydroCorrect {
        dem: String,
        #[arg(short, long)]
        output: Option<String>,
    },

    /// D8 flow direction map (1=E, 2=NE, 3=N, ..., 8=SE)
    FlowDirection {
        dem: String,
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Slope map in percent incline
    Slope {
        dem: String,
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Continuous aspect in degrees (0=E, 90=N, 180=W, 270=S)
    ContinuousAspect {
        dem: String,
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Binary aspect from a continuous aspect map (0=northerly, 1=southerly)
    BinaryAspect {
        continuous_aspect: String,
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Write a copy of a GeoTIFF with n cells trimmed from each edge
    Trim {
        src: String,
        tgt: String,
        #[arg(short, default_value = "1")]
        n: usize,
    },
}
