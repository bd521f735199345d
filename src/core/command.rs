use crate::domain::model::ExternalCommand;
use crate::domain::ports::ToolConfig;
use std::path::Path;

/// TauDEM tools are MPI programs; launch them through mpiexec unless disabled.
fn taudem<C: ToolConfig + ?Sized>(tools: &C, program: &str) -> ExternalCommand {
    if tools.use_mpi() {
        let launcher_args = ["-n".to_string(), tools.mpi_processes().to_string()];
        ExternalCommand::launched(tools.mpiexec(), &launcher_args, program)
    } else {
        ExternalCommand::new(program)
    }
}

/// `pitremove -z <dem> -fel <out>`
pub fn pitremove_command<C: ToolConfig + ?Sized>(tools: &C, dem: &Path, out: &Path) -> ExternalCommand {
    taudem(tools, tools.pitremove())
        .arg("-z")
        .path_arg(dem)
        .arg("-fel")
        .path_arg(out)
}

/// `d8flowdir -fel <dem> -sd8 <slope> -p <out>`; d8flowdir always writes the slope grid too.
pub fn d8flowdir_command<C: ToolConfig + ?Sized>(
    tools: &C,
    dem: &Path,
    slope_out: &Path,
    out: &Path,
) -> ExternalCommand {
    taudem(tools, tools.d8flowdir())
        .arg("-fel")
        .path_arg(dem)
        .arg("-sd8")
        .path_arg(slope_out)
        .arg("-p")
        .path_arg(out)
}

/// `gdaldem slope -p <dem> <out>`, percent incline.
pub fn slope_command<C: ToolConfig + ?Sized>(tools: &C, dem: &Path, out: &Path) -> ExternalCommand {
    let cmd = ExternalCommand::new(tools.gdaldem())
        .arg("slope")
        .arg("-p")
        .path_arg(dem)
        .path_arg(out);
    with_edges(tools, cmd)
}

/// `gdaldem aspect <dem> <out> -trigonometric -zero_for_flat`
pub fn aspect_command<C: ToolConfig + ?Sized>(tools: &C, dem: &Path, out: &Path) -> ExternalCommand {
    let cmd = ExternalCommand::new(tools.gdaldem())
        .arg("aspect")
        .path_arg(dem)
        .path_arg(out)
        .arg("-trigonometric")
        .arg("-zero_for_flat");
    with_edges(tools, cmd)
}

fn with_edges<C: ToolConfig + ?Sized>(tools: &C, cmd: ExternalCommand) -> ExternalCommand {
    if tools.compute_edges() {
        cmd.arg("-compute_edges")
    } else {
        cmd
    }
}
