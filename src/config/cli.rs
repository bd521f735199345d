use crate::domain::model::Layer;
use crate::domain::ports::OutputConfig;
use crate::utils::error::Result;
use crate::utils::paths::get_suffixed_fname;
use std::fs;
use std::path::{Path, PathBuf};

pub const SUMMARY_FILE: &str = "derivation-summary.json";

/// The per-site output directory, `<root>/<site>`, and the file names in it.
#[derive(Debug, Clone)]
pub struct SiteOutput {
    site_dir: PathBuf,
    hydro_correct_suffix: String,
    flow_direction: String,
    slope: String,
    continuous_aspect: String,
    binary_aspect: String,
}

impl SiteOutput {
    pub fn new<C: OutputConfig + ?Sized>(config: &C, site: &str) -> Self {
        Self {
            site_dir: Path::new(config.output_root()).join(site),
            hydro_correct_suffix: config.hydro_correct_suffix().to_string(),
            flow_direction: config.flow_direction_name().to_string(),
            slope: config.slope_name().to_string(),
            continuous_aspect: config.continuous_aspect_name().to_string(),
            binary_aspect: config.binary_aspect_name().to_string(),
        }
    }

    pub fn site_dir(&self) -> &Path {
        &self.site_dir
    }

    pub fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.site_dir)?;
        Ok(())
    }

    /// Path of `layer` inside the site directory. The hydro-corrected DEM
    /// keeps the source DEM's name with a suffix.
    pub fn layer_path(&self, layer: Layer, dem: &Path) -> PathBuf {
        let name = match layer {
            Layer::HydroCorrect => {
                let dem_name = dem.file_name().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("dem.tif"));
                return self
                    .site_dir
                    .join(get_suffixed_fname(&dem_name, &self.hydro_correct_suffix));
            }
            Layer::FlowDirection => &self.flow_direction,
            Layer::Slope => &self.slope,
            Layer::ContinuousAspect => &self.continuous_aspect,
            Layer::BinaryAspect => &self.binary_aspect,
        };
        self.site_dir.join(name)
    }

    pub fn summary_path(&self) -> PathBuf {
        self.site_dir.join(SUMMARY_FILE)
    }

    pub fn write_file(&self, name: &str, data: &[u8]) -> Result<PathBuf> {
        self.ensure_dir()?;
        let full_path = self.site_dir.join(name);
        fs::write(&full_path, data)?;
        Ok(full_path)
    }
}
