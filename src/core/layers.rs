use crate::config::toml_config::{
    DEFAULT_BINARY_ASPECT, DEFAULT_CONTINUOUS_ASPECT, DEFAULT_FLOW_DIRECTION, DEFAULT_HYDRO_CORRECT_SUFFIX,
    DEFAULT_SLOPE,
};
use crate::core::command;
use crate::domain::model::ExternalCommand;
use crate::domain::ports::{CommandRunner, ToolConfig};
use crate::raster::{read_geotiff, write_geotiff, Raster};
use crate::utils::error::{DemError, Result};
use crate::utils::paths::{get_suffixed_fname, temp_sibling};
use std::path::{Path, PathBuf};

/// Aspect below this (trigonometric degrees) faces north.
pub const NORTHERLY_ASPECT_LIMIT: f64 = 180.0;

/// Makes one derived layer at a time. Each `make_*` returns the path it wrote.
pub struct LayerMaker<R: CommandRunner, C: ToolConfig> {
    runner: R,
    tools: C,
    keep_flow_slope: bool,
}

impl<R: CommandRunner, C: ToolConfig> LayerMaker<R, C> {
    pub fn new(runner: R, tools: C) -> Self {
        Self {
            runner,
            tools,
            keep_flow_slope: false,
        }
    }

    /// Keep the slope grid d8flowdir writes alongside the flow directions.
    pub fn with_keep_flow_slope(mut self, keep: bool) -> Self {
        self.keep_flow_slope = keep;
        self
    }

    pub fn tools(&self) -> &C {
        &self.tools
    }

    /// Remove pits from the DEM. Defaults to `<dem>-hydrocorrect.<ext>`.
    pub async fn make_hydro_correct_dem(&self, dem: &Path, out: Option<&Path>) -> Result<PathBuf> {
        tracing::info!("Calculating hydrologically corrected DEM...");
        require_input(dem)?;
        let out = out
            .map(Path::to_path_buf)
            .unwrap_or_else(|| get_suffixed_fname(dem, DEFAULT_HYDRO_CORRECT_SUFFIX));

        self.run_producing(&command::pitremove_command(&self.tools, dem, &out), &out)
            .await?;
        Ok(out)
    }

    /// D8 flow directions, 1=E, 2=NE, 3=N, ..., 8=SE. Defaults to `flowdir.tif`.
    pub async fn make_flow_direction_map(&self, dem: &Path, out: Option<&Path>) -> Result<PathBuf> {
        tracing::info!("Calculating flow directions...");
        require_input(dem)?;
        let out = out.map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from(DEFAULT_FLOW_DIRECTION));
        let slope_out = self.flow_slope_path(&out);

        let cmd = command::d8flowdir_command(&self.tools, dem, &slope_out, &out);
        let result = self.run_producing(&cmd, &out).await;

        if !self.keep_flow_slope && slope_out.exists() {
            if let Err(e) = std::fs::remove_file(&slope_out) {
                tracing::warn!("Could not remove {}: {}", slope_out.display(), e);
            }
        }

        result.map(|_| out)
    }

    /// Path d8flowdir writes its slope grid to: `<out>-sd8.<ext>` if kept,
    /// otherwise a hidden temporary sibling.
    pub fn flow_slope_path(&self, out: &Path) -> PathBuf {
        if self.keep_flow_slope {
            get_suffixed_fname(out, "-sd8")
        } else {
            temp_sibling(out, "sd8")
        }
    }

    /// Slope in percent incline. Defaults to `slope.tif`.
    pub async fn make_slope_map(&self, dem: &Path, out: Option<&Path>) -> Result<PathBuf> {
        tracing::info!("Calculating slope...");
        require_input(dem)?;
        let out = out.map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from(DEFAULT_SLOPE));

        self.run_producing(&command::slope_command(&self.tools, dem, &out), &out)
            .await?;
        Ok(out)
    }

    /// Aspect in degrees, 0=E, 90=N, 180=W, 270=S, flat cells 0.
    /// Defaults to `continuous-aspect.tif`.
    pub async fn make_continuous_aspect_map(&self, dem: &Path, out: Option<&Path>) -> Result<PathBuf> {
        tracing::info!("Calculating aspect...");
        require_input(dem)?;
        let out = out
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONTINUOUS_ASPECT));

        self.run_producing(&command::aspect_command(&self.tools, dem, &out), &out)
            .await?;
        Ok(out)
    }

    /// 0 where the continuous aspect is northerly, 1 where southerly.
    /// Defaults to `binary-aspect.tif`.
    pub async fn make_binary_aspect_map(&self, continuous_aspect: &Path, out: Option<&Path>) -> Result<PathBuf> {
        tracing::info!("Calculating binary aspect...");
        require_input(continuous_aspect)?;
        let out = out
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_BINARY_ASPECT));

        let aspect = read_geotiff(continuous_aspect)?;
        write_geotiff(&classify_binary_aspect(&aspect), &out)?;
        Ok(out)
    }

    async fn run_producing(&self, cmd: &ExternalCommand, out: &Path) -> Result<()> {
        self.runner.run(cmd).await?;

        // Some TauDEM builds exit 0 after failing to open their input.
        if !out.exists() {
            return Err(DemError::ToolFailed {
                program: cmd.tool_name().to_string(),
                code: Some(0),
                stderr: format!("no output written to {}", out.display()),
            });
        }
        tracing::info!("📁 Wrote {}", out.display());
        Ok(())
    }
}

/// Reclassify aspect degrees into 0 (< 180, northerly) and 1 (southerly).
/// Nodata cells stay nodata.
pub fn classify_binary_aspect(aspect: &Raster) -> Raster {
    aspect.map(|v| {
        if aspect.is_nodata(v) {
            v
        } else if v < NORTHERLY_ASPECT_LIMIT {
            0.0
        } else {
            1.0
        }
    })
}

fn require_input(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(DemError::missing_input(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::toml_config::DemprocConfig;
    use crate::domain::model::CommandOutput;
    use crate::raster::dummy::make_dummy_hydro_incorrect_dem;
    use crate::raster::{read_geotiff_as_array, GeoKeys, GeoTransform, PixelType};
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    /// Records commands and touches every `.tif` argument that doesn't exist yet.
    #[derive(Clone, Default)]
    struct TouchingRunner {
        commands: Arc<Mutex<Vec<ExternalCommand>>>,
    }

    impl TouchingRunner {
        fn recorded(&self) -> Vec<ExternalCommand> {
            self.commands.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl CommandRunner for TouchingRunner {
        async fn run(&self, command: &ExternalCommand) -> Result<CommandOutput> {
            self.commands.lock().unwrap().push(command.clone());
            for arg in &command.args {
                let path = Path::new(arg);
                if arg.ends_with(".tif") && !path.exists() {
                    std::fs::write(path, b"")?;
                }
            }
            Ok(CommandOutput::default())
        }
    }

    /// Succeeds without writing anything.
    struct SilentRunner;

    #[async_trait::async_trait]
    impl CommandRunner for SilentRunner {
        async fn run(&self, _command: &ExternalCommand) -> Result<CommandOutput> {
            Ok(CommandOutput::default())
        }
    }

    fn dummy_dem(dir: &TempDir) -> PathBuf {
        let dem = dir.path().join("dem.tif");
        make_dummy_hydro_incorrect_dem(&dem).unwrap();
        dem
    }

    #[tokio::test]
    async fn test_hydro_correct_default_name() {
        let temp_dir = TempDir::new().unwrap();
        let dem = dummy_dem(&temp_dir);
        let runner = TouchingRunner::default();
        let maker = LayerMaker::new(runner.clone(), DemprocConfig::default());

        let out = maker.make_hydro_correct_dem(&dem, None).await.unwrap();

        assert_eq!(out, temp_dir.path().join("dem-hydrocorrect.tif"));
        assert!(out.exists());
        assert_eq!(runner.recorded()[0].tool_name(), "pitremove");
    }

    #[tokio::test]
    async fn test_flow_direction_removes_slope_grid() {
        let temp_dir = TempDir::new().unwrap();
        let dem = dummy_dem(&temp_dir);
        let out = temp_dir.path().join("flowdir.tif");
        let runner = TouchingRunner::default();
        let maker = LayerMaker::new(runner.clone(), DemprocConfig::default());

        maker.make_flow_direction_map(&dem, Some(&out)).await.unwrap();

        let cmd = &runner.recorded()[0];
        let sd8_idx = cmd.args.iter().position(|a| a == "-sd8").unwrap();
        let sd8 = PathBuf::from(&cmd.args[sd8_idx + 1]);
        assert!(out.exists());
        assert!(!sd8.exists());
    }

    #[tokio::test]
    async fn test_flow_direction_can_keep_slope_grid() {
        let temp_dir = TempDir::new().unwrap();
        let dem = dummy_dem(&temp_dir);
        let out = temp_dir.path().join("flowdir.tif");
        let maker = LayerMaker::new(TouchingRunner::default(), DemprocConfig::default()).with_keep_flow_slope(true);

        maker.make_flow_direction_map(&dem, Some(&out)).await.unwrap();

        assert!(temp_dir.path().join("flowdir-sd8.tif").exists());
    }

    #[tokio::test]
    async fn test_missing_input_runs_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let runner = TouchingRunner::default();
        let maker = LayerMaker::new(runner.clone(), DemprocConfig::default());

        let err = maker
            .make_slope_map(&temp_dir.path().join("absent.tif"), None)
            .await
            .unwrap_err();

        assert!(matches!(err, DemError::MissingInput { .. }));
        assert!(runner.recorded().is_empty());
    }

    #[tokio::test]
    async fn test_tool_that_writes_nothing_fails() {
        let temp_dir = TempDir::new().unwrap();
        let dem = dummy_dem(&temp_dir);
        let maker = LayerMaker::new(SilentRunner, DemprocConfig::default());

        let err = maker
            .make_continuous_aspect_map(&dem, Some(&temp_dir.path().join("aspect.tif")))
            .await
            .unwrap_err();

        assert!(matches!(err, DemError::ToolFailed { ref program, .. } if program == "gdaldem"));
    }

    #[tokio::test]
    async fn test_binary_aspect_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let aspect_path = temp_dir.path().join("continuous-aspect.tif");
        let out = temp_dir.path().join("binary-aspect.tif");

        let mut aspect = Raster::from_rows(&[[0.0, 90.0, 179.9], [180.0, 270.0, -9999.0]], PixelType::Float32).unwrap();
        aspect.set_transform(GeoTransform::new(1000.0, 2000.0, 5.0, -5.0));
        aspect.set_geokeys(Some(GeoKeys::geographic(4326)));
        aspect.set_nodata(Some(-9999.0));
        write_geotiff(&aspect, &aspect_path).unwrap();

        let maker = LayerMaker::new(SilentRunner, DemprocConfig::default());
        maker.make_binary_aspect_map(&aspect_path, Some(&out)).await.unwrap();

        assert_eq!(
            read_geotiff_as_array(&out).unwrap(),
            vec![vec![0.0, 0.0, 0.0], vec![1.0, 1.0, -9999.0]]
        );
        let written = read_geotiff(&out).unwrap();
        assert_eq!(written.transform(), aspect.transform());
        assert_eq!(written.geokeys(), aspect.geokeys());
        assert_eq!(written.epsg(), Some(4326));
        assert_eq!(written.nodata(), Some(-9999.0));
    }

    #[test]
    fn test_classify_binary_aspect_without_nodata() {
        let aspect = Raster::from_rows(&[[0.0, 359.0], [180.0, 45.0]], PixelType::Float32).unwrap();
        assert_eq!(
            classify_binary_aspect(&aspect).to_rows(),
            vec![vec![0.0, 1.0], vec![1.0, 0.0]]
        );
    }
}
