use crate::config::cli::{SiteOutput, SUMMARY_FILE};
use crate::core::command;
use crate::core::layers::LayerMaker;
use crate::domain::model::{DerivationReport, Layer, StageResult};
use crate::domain::ports::{CommandRunner, OutputConfig, ToolConfig};
use crate::raster::trim_geotiff_edge;
use crate::utils::error::{DemError, Result};
use crate::utils::monitor::SystemMonitor;
use crate::utils::validation::{self, GEOTIFF_EXTENSIONS};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// One step of a derivation as it would be executed.
#[derive(Debug, Clone)]
pub struct PlannedStage {
    pub layer: Layer,
    pub output: PathBuf,
    pub skipped: bool,
    pub action: String,
}

/// Runs every derivation stage for a study site, in order.
pub struct DemProcessor<R: CommandRunner, C: ToolConfig + OutputConfig> {
    maker: LayerMaker<R, C>,
    skip: Vec<Layer>,
    trim_edge: usize,
    monitor: SystemMonitor,
    execution_id: Option<String>,
}

impl<R: CommandRunner, C: ToolConfig + OutputConfig> DemProcessor<R, C> {
    pub fn new(runner: R, config: C) -> Self {
        let trim_edge = config.trim_edge();
        let keep_flow_slope = config.keep_flow_slope();
        Self {
            maker: LayerMaker::new(runner, config).with_keep_flow_slope(keep_flow_slope),
            skip: Vec::new(),
            trim_edge,
            monitor: SystemMonitor::new(false),
            execution_id: None,
        }
    }

    pub fn with_monitoring(mut self, enabled: bool) -> Self {
        self.monitor = SystemMonitor::new(enabled);
        self
    }

    pub fn with_skip(mut self, layers: Vec<Layer>) -> Self {
        self.skip = layers;
        self
    }

    pub fn with_trim_edge(mut self, n: usize) -> Self {
        self.trim_edge = n;
        self
    }

    pub fn with_execution_id(mut self, id: impl Into<String>) -> Self {
        self.execution_id = Some(id.into());
        self
    }

    pub fn config(&self) -> &C {
        self.maker.tools()
    }

    fn site_output(&self, dem: &Path, site: &str) -> Result<SiteOutput> {
        let dem_str = dem.to_string_lossy();
        validation::validate_path("dem", &dem_str)?;
        validation::validate_file_extension("dem", &dem_str, GEOTIFF_EXTENSIONS)?;
        validation::validate_site_name("site", site)?;
        Ok(SiteOutput::new(self.config(), site))
    }

    /// Input file a layer is computed from.
    fn input_for(&self, layer: Layer, dem: &Path, site: &SiteOutput) -> PathBuf {
        match layer {
            Layer::HydroCorrect => dem.to_path_buf(),
            Layer::FlowDirection | Layer::Slope | Layer::ContinuousAspect => {
                site.layer_path(Layer::HydroCorrect, dem)
            }
            Layer::BinaryAspect => site.layer_path(Layer::ContinuousAspect, dem),
        }
    }

    /// What `derive_all` would do, without running anything.
    pub fn plan(&self, dem: &Path, site: &str) -> Result<Vec<PlannedStage>> {
        let site = self.site_output(dem, site)?;
        let tools = self.config();

        let stages = Layer::ALL
            .iter()
            .map(|&layer| {
                let input = self.input_for(layer, dem, &site);
                let output = site.layer_path(layer, dem);
                let action = match layer {
                    Layer::HydroCorrect => command::pitremove_command(tools, &input, &output).to_string(),
                    Layer::FlowDirection => {
                        let slope_out = self.maker.flow_slope_path(&output);
                        command::d8flowdir_command(tools, &input, &slope_out, &output).to_string()
                    }
                    Layer::Slope => command::slope_command(tools, &input, &output).to_string(),
                    Layer::ContinuousAspect => command::aspect_command(tools, &input, &output).to_string(),
                    Layer::BinaryAspect => format!(
                        "reclassify {} -> {} (< 180 => 0, otherwise 1)",
                        input.display(),
                        output.display()
                    ),
                };
                PlannedStage {
                    layer,
                    skipped: self.skip.contains(&layer),
                    output,
                    action,
                }
            })
            .collect();

        Ok(stages)
    }

    /// Derive every layer of `dem` into `<output_root>/<site>`.
    pub async fn derive_all(&self, dem: &Path, site: &str) -> Result<DerivationReport> {
        let site_output = self.site_output(dem, site)?;
        if !dem.is_file() {
            return Err(DemError::missing_input(dem));
        }

        let started_at = chrono::Utc::now();
        let start = Instant::now();
        let execution_id = self
            .execution_id
            .clone()
            .unwrap_or_else(|| format!("demproc_{}", started_at.format("%Y%m%d_%H%M%S")));

        tracing::info!(
            "🚀 Deriving layers for site '{}' from {} (execution {})",
            site,
            dem.display(),
            execution_id
        );
        site_output.ensure_dir()?;
        self.monitor.log_stats("Derivation started");

        let mut stages = Vec::with_capacity(Layer::ALL.len());
        for layer in Layer::ALL {
            let output = site_output.layer_path(layer, dem);

            if self.skip.contains(&layer) {
                tracing::info!("⏭️ Skipping {}", layer);
                if !output.exists() {
                    tracing::warn!("{} is skipped and {} does not exist", layer, output.display());
                }
                stages.push(StageResult {
                    layer,
                    output_path: output,
                    duration: Default::default(),
                    skipped: true,
                });
                continue;
            }

            for dep in layer.depends_on() {
                let dep_path = site_output.layer_path(*dep, dem);
                if !dep_path.exists() {
                    tracing::error!("{} needs {} at {}", layer, dep, dep_path.display());
                    return Err(DemError::missing_input(&dep_path));
                }
            }

            let stage_start = Instant::now();
            let input = self.input_for(layer, dem, &site_output);
            self.run_stage(layer, &input, &output).await?;

            let duration = stage_start.elapsed();
            tracing::info!("✅ {} done in {:?}", layer, duration);
            self.monitor.log_stats(layer.name());

            stages.push(StageResult {
                layer,
                output_path: output,
                duration,
                skipped: false,
            });
        }

        if self.trim_edge > 0 {
            for stage in stages.iter().filter(|s| !s.skipped) {
                tracing::info!("✂️ Trimming {} cell(s) from {}", self.trim_edge, stage.output_path.display());
                trim_geotiff_edge(&stage.output_path, &stage.output_path, self.trim_edge)?;
            }
        }

        let report = DerivationReport {
            execution_id,
            dem: dem.to_path_buf(),
            site_dir: site_output.site_dir().to_path_buf(),
            started_at,
            stages,
            total_duration: start.elapsed(),
            trimmed_cells: self.trim_edge,
        };

        if self.config().write_summary() {
            let json = serde_json::to_vec_pretty(&report)?;
            let path = site_output.write_file(SUMMARY_FILE, &json)?;
            tracing::debug!("Summary written to {}", path.display());
        }

        self.monitor.log_final_stats();
        tracing::info!(
            "🏁 {} layer(s) derived in {:?}",
            report.executed_layers().len(),
            report.total_duration
        );
        Ok(report)
    }

    async fn run_stage(&self, layer: Layer, input: &Path, output: &Path) -> Result<PathBuf> {
        match layer {
            Layer::HydroCorrect => self.maker.make_hydro_correct_dem(input, Some(output)).await,
            Layer::FlowDirection => self.maker.make_flow_direction_map(input, Some(output)).await,
            Layer::Slope => self.maker.make_slope_map(input, Some(output)).await,
            Layer::ContinuousAspect => self.maker.make_continuous_aspect_map(input, Some(output)).await,
            Layer::BinaryAspect => self.maker.make_binary_aspect_map(input, Some(output)).await,
        }
    }
}
