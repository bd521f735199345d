use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// A raster layer derived from the source DEM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "kebab-case")]
pub enum Layer {
    HydroCorrect,
    FlowDirection,
    Slope,
    ContinuousAspect,
    BinaryAspect,
}

impl Layer {
    /// Execution order of a full derivation.
    pub const ALL: [Layer; 5] = [
        Layer::HydroCorrect,
        Layer::FlowDirection,
        Layer::Slope,
        Layer::ContinuousAspect,
        Layer::BinaryAspect,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Layer::HydroCorrect => "hydro-correct",
            Layer::FlowDirection => "flow-direction",
            Layer::Slope => "slope",
            Layer::ContinuousAspect => "continuous-aspect",
            Layer::BinaryAspect => "binary-aspect",
        }
    }

    /// Layers whose files must exist before this one can be made.
    /// An empty slice means the source DEM is the only input.
    pub fn depends_on(&self) -> &'static [Layer] {
        match self {
            Layer::HydroCorrect => &[],
            Layer::FlowDirection | Layer::Slope | Layer::ContinuousAspect => &[Layer::HydroCorrect],
            Layer::BinaryAspect => &[Layer::ContinuousAspect],
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Layer::HydroCorrect => "hydrologically corrected DEM (pits removed)",
            Layer::FlowDirection => "D8 flow direction (1=E, 2=NE, 3=N, ..., 8=SE)",
            Layer::Slope => "slope (percent incline)",
            Layer::ContinuousAspect => "continuous aspect (0=E, 90=N, 180=W, 270=S)",
            Layer::BinaryAspect => "binary aspect (0=northerly, 1=southerly)",
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A program invocation, kept as data so it can be logged, planned and mocked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalCommand {
    pub program: String,
    pub args: Vec<String>,
    /// Tool started through a launcher (`mpiexec`, `srun`, ...), if any.
    pub launched_tool: Option<String>,
}

impl ExternalCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            launched_tool: None,
        }
    }

    /// Run `tool` through `launcher`; `launcher_args` go before the tool name.
    pub fn launched(launcher: impl Into<String>, launcher_args: &[String], tool: impl Into<String>) -> Self {
        let tool = tool.into();
        let mut cmd = Self::new(launcher);
        cmd.args.extend(launcher_args.iter().cloned());
        cmd.args.push(tool.clone());
        cmd.launched_tool = Some(tool);
        cmd
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn path_arg(self, path: &std::path::Path) -> Self {
        self.arg(path.to_string_lossy().into_owned())
    }

    /// The program TauDEM/gdal actually provides, not its launcher.
    pub fn tool_name(&self) -> &str {
        self.launched_tool.as_deref().unwrap_or(self.program.as_str())
    }
}

impl fmt::Display for ExternalCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " '{}'", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// Outcome of one stage of a derivation.
#[derive(Debug, Clone, Serialize)]
pub struct StageResult {
    pub layer: Layer,
    pub output_path: PathBuf,
    #[serde(rename = "duration_ms", serialize_with = "serialize_millis")]
    pub duration: Duration,
    pub skipped: bool,
}

/// Everything `derive_all` produced, also written out as the run summary.
#[derive(Debug, Clone, Serialize)]
pub struct DerivationReport {
    pub execution_id: String,
    pub dem: PathBuf,
    pub site_dir: PathBuf,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub stages: Vec<StageResult>,
    #[serde(rename = "total_duration_ms", serialize_with = "serialize_millis")]
    pub total_duration: Duration,
    pub trimmed_cells: usize,
}

impl DerivationReport {
    pub fn output_for(&self, layer: Layer) -> Option<&PathBuf> {
        self.stages.iter().find(|s| s.layer == layer).map(|s| &s.output_path)
    }

    pub fn executed_layers(&self) -> Vec<Layer> {
        self.stages.iter().filter(|s| !s.skipped).map(|s| s.layer).collect()
    }
}

fn serialize_millis<S: serde::Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis() as u64)
}
