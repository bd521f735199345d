use anyhow::Context;
use clap::Parser;
use demproc::raster::dummy::{make_dummy_hydro_incorrect_dem, BRITISH_NATIONAL_GRID};
use demproc::utils::logger;

#[derive(Parser)]
#[command(name = "make-dummy-dem")]
#[command(about = "Write a 5x5 test DEM with a single pit, for trying out TauDEM and gdaldem")]
struct Args {
    /// Where to write the GeoTIFF
    #[arg(default_value = "hydro_incorrect_dummy.tif")]
    path: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logger::init_cli_logger(args.verbose);

    make_dummy_hydro_incorrect_dem(&args.path)
        .with_context(|| format!("Failed to write dummy DEM to '{}'", args.path))?;

    tracing::info!("Wrote 5x5 dummy DEM (EPSG:{}) to {}", BRITISH_NATIONAL_GRID, args.path);
    println!("📁 Output saved to: {}", args.path);
    Ok(())
}
