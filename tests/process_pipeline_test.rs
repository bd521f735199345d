#![cfg(unix)]

use anyhow::Result;
use demproc::raster::dummy::{make_dummy_hydro_incorrect_dem, BRITISH_NATIONAL_GRID};
use demproc::raster::read_geotiff;
use demproc::{read_geotiff_as_array, DemError, DemProcessor, DemprocConfig, Layer, ProcessRunner};
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use tempfile::TempDir;

// Stand-in tools that copy their input to where the real ones write output.
const PITREMOVE: &str = "#!/bin/sh\n# -z <dem> -fel <out>\ncp \"$2\" \"$4\"\n";
const D8FLOWDIR: &str = "#!/bin/sh\n# -fel <dem> -sd8 <slope> -p <out>\ncp \"$2\" \"$4\" && cp \"$2\" \"$6\"\n";
const GDALDEM: &str = "#!/bin/sh\ncase \"$1\" in\n  slope) cp \"$3\" \"$4\" ;;\n  aspect) cp \"$2\" \"$3\" ;;\n  *) echo \"unknown mode $1\" >&2; exit 1 ;;\nesac\n";
const BROKEN: &str = "#!/bin/sh\necho \"ERROR 4: cannot open $2\" >&2\nexit 4\n";

fn write_script(dir: &Path, name: &str, body: &str) -> Result<String> {
    let path = dir.join(name);
    std::fs::write(&path, body)?;
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))?;
    Ok(path.to_string_lossy().into_owned())
}

fn config(root: &Path, pitremove: &str, d8flowdir: &str, gdaldem: &str) -> Result<DemprocConfig> {
    let toml = format!(
        r#"
[tools]
use_mpi = false
pitremove = "{pitremove}"
d8flowdir = "{d8flowdir}"
gdaldem = "{gdaldem}"
timeout_seconds = 30

[output]
root = "{root}"
"#,
        root = root.to_string_lossy()
    );
    Ok(DemprocConfig::from_toml_str(&toml)?)
}

#[tokio::test]
async fn test_derive_all_with_child_processes() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let bin_dir = temp_dir.path().join("bin");
    std::fs::create_dir_all(&bin_dir)?;

    let pitremove = write_script(&bin_dir, "pitremove", PITREMOVE)?;
    let d8flowdir = write_script(&bin_dir, "d8flowdir", D8FLOWDIR)?;
    let gdaldem = write_script(&bin_dir, "gdaldem", GDALDEM)?;
    let broken = write_script(&bin_dir, "broken-gdaldem", BROKEN)?;

    let dem = temp_dir.path().join("dem.tif");
    make_dummy_hydro_incorrect_dem(&dem)?;
    let out_root = temp_dir.path().join("out");

    // Happy path: every layer lands in the site directory.
    let report = DemProcessor::new(
        ProcessRunner::new(),
        config(&out_root, &pitremove, &d8flowdir, &gdaldem)?,
    )
    .derive_all(&dem, "copied")
    .await?;

    assert_eq!(report.executed_layers(), Layer::ALL.to_vec());
    let slope = read_geotiff(report.output_for(Layer::Slope).unwrap())?;
    assert_eq!(slope.shape(), (5, 5));
    assert_eq!(slope.epsg(), Some(BRITISH_NATIONAL_GRID));

    // The copied DEM never exceeds 4 degrees, so every cell is northerly.
    let binary = read_geotiff_as_array(report.output_for(Layer::BinaryAspect).unwrap())?;
    assert!(binary.iter().flatten().all(|&v| v == 0.0));

    // A failing tool surfaces its exit code and stderr.
    let err = DemProcessor::new(
        ProcessRunner::new(),
        config(&out_root, &pitremove, &d8flowdir, &broken)?,
    )
    .derive_all(&dem, "broken")
    .await
    .unwrap_err();

    match err {
        DemError::ToolFailed { code, stderr, .. } => {
            assert_eq!(code, Some(4));
            assert!(stderr.contains("cannot open"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!out_root.join("broken").join("slope.tif").exists());

    // An executable that isn't there.
    let missing = bin_dir.join("no-such-pitremove").to_string_lossy().into_owned();
    let err = DemProcessor::new(
        ProcessRunner::new(),
        config(&out_root, &missing, &d8flowdir, &gdaldem)?,
    )
    .derive_all(&dem, "missing")
    .await
    .unwrap_err();
    assert!(matches!(err, DemError::ToolNotFound { .. }));

    Ok(())
}
