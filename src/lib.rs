pub mod config;
pub mod core;
pub mod domain;
pub mod raster;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{CliConfig, Command};

pub use config::{cli::SiteOutput, toml_config::DemprocConfig};
pub use core::{derive::DemProcessor, layers::LayerMaker, runner::ProcessRunner};
pub use domain::model::Layer;
pub use raster::{read_geotiff_as_array, trim_geotiff_edge};
pub use utils::error::{DemError, Result};
