use crate::domain::ports::{OutputConfig, ToolConfig};
use crate::utils::error::{DemError, Result};
use crate::utils::validation::{self, Validate, GEOTIFF_EXTENSIONS};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_MPI_PROCESSES: usize = 2;
pub const DEFAULT_HYDRO_CORRECT_SUFFIX: &str = "-hydrocorrect";
pub const DEFAULT_FLOW_DIRECTION: &str = "flowdir.tif";
pub const DEFAULT_SLOPE: &str = "slope.tif";
pub const DEFAULT_CONTINUOUS_ASPECT: &str = "continuous-aspect.tif";
pub const DEFAULT_BINARY_ASPECT: &str = "binary-aspect.tif";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DemprocConfig {
    #[serde(default)]
    pub tools: ToolsSection,
    #[serde(default)]
    pub output: OutputSection,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolsSection {
    pub mpiexec: Option<String>,
    pub use_mpi: Option<bool>,
    pub mpi_processes: Option<usize>,
    pub pitremove: Option<String>,
    pub d8flowdir: Option<String>,
    pub gdaldem: Option<String>,
    pub compute_edges: Option<bool>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputSection {
    pub root: Option<String>,
    pub hydro_correct_suffix: Option<String>,
    pub flow_direction: Option<String>,
    pub slope: Option<String>,
    pub continuous_aspect: Option<String>,
    pub binary_aspect: Option<String>,
    pub keep_flow_slope: Option<bool>,
    pub trim_edge: Option<usize>,
    pub write_summary: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
}

impl DemprocConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(DemError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| DemError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${TAUDEM_HOME})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| DemError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_non_empty_string("tools.mpiexec", self.mpiexec())?;
        validation::validate_non_empty_string("tools.pitremove", self.pitremove())?;
        validation::validate_non_empty_string("tools.d8flowdir", self.d8flowdir())?;
        validation::validate_non_empty_string("tools.gdaldem", self.gdaldem())?;
        validation::validate_positive_number("tools.mpi_processes", self.mpi_processes(), 1)?;

        if let Some(timeout) = self.tools.timeout_seconds {
            validation::validate_positive_number("tools.timeout_seconds", timeout as usize, 1)?;
        }

        validation::validate_path("output.root", self.output_root())?;

        let names = [
            ("output.flow_direction", self.flow_direction_name()),
            ("output.slope", self.slope_name()),
            ("output.continuous_aspect", self.continuous_aspect_name()),
            ("output.binary_aspect", self.binary_aspect_name()),
        ];
        for (field, name) in names {
            validation::validate_file_extension(field, name, GEOTIFF_EXTENSIONS)?;
        }

        Ok(())
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }
}

impl ToolConfig for DemprocConfig {
    fn mpiexec(&self) -> &str {
        self.tools.mpiexec.as_deref().unwrap_or("mpiexec")
    }

    fn use_mpi(&self) -> bool {
        self.tools.use_mpi.unwrap_or(true)
    }

    fn mpi_processes(&self) -> usize {
        self.tools.mpi_processes.unwrap_or(DEFAULT_MPI_PROCESSES)
    }

    fn pitremove(&self) -> &str {
        self.tools.pitremove.as_deref().unwrap_or("pitremove")
    }

    fn d8flowdir(&self) -> &str {
        self.tools.d8flowdir.as_deref().unwrap_or("d8flowdir")
    }

    fn gdaldem(&self) -> &str {
        self.tools.gdaldem.as_deref().unwrap_or("gdaldem")
    }

    fn compute_edges(&self) -> bool {
        self.tools.compute_edges.unwrap_or(false)
    }

    fn timeout_seconds(&self) -> Option<u64> {
        self.tools.timeout_seconds
    }
}

impl OutputConfig for DemprocConfig {
    fn output_root(&self) -> &str {
        self.output.root.as_deref().unwrap_or(".")
    }

    fn hydro_correct_suffix(&self) -> &str {
        self.output
            .hydro_correct_suffix
            .as_deref()
            .unwrap_or(DEFAULT_HYDRO_CORRECT_SUFFIX)
    }

    fn flow_direction_name(&self) -> &str {
        self.output.flow_direction.as_deref().unwrap_or(DEFAULT_FLOW_DIRECTION)
    }

    fn slope_name(&self) -> &str {
        self.output.slope.as_deref().unwrap_or(DEFAULT_SLOPE)
    }

    fn continuous_aspect_name(&self) -> &str {
        self.output
            .continuous_aspect
            .as_deref()
            .unwrap_or(DEFAULT_CONTINUOUS_ASPECT)
    }

    fn binary_aspect_name(&self) -> &str {
        self.output.binary_aspect.as_deref().unwrap_or(DEFAULT_BINARY_ASPECT)
    }

    fn keep_flow_slope(&self) -> bool {
        self.output.keep_flow_slope.unwrap_or(false)
    }

    fn trim_edge(&self) -> usize {
        self.output.trim_edge.unwrap_or(0)
    }

    fn write_summary(&self) -> bool {
        self.output.write_summary.unwrap_or(true)
    }
}

impl Validate for DemprocConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
