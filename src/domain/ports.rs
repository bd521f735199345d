use crate::domain::model::{CommandOutput, ExternalCommand};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Runs external programs. The process runner is the only production
/// implementation; tests substitute recorders.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, command: &ExternalCommand) -> Result<CommandOutput>;
}

#[async_trait]
impl<R: CommandRunner + ?Sized> CommandRunner for std::sync::Arc<R> {
    async fn run(&self, command: &ExternalCommand) -> Result<CommandOutput> {
        (**self).run(command).await
    }
}

/// Where the external tools live and how they are launched.
pub trait ToolConfig: Send + Sync {
    fn mpiexec(&self) -> &str;
    fn use_mpi(&self) -> bool;
    fn mpi_processes(&self) -> usize;
    fn pitremove(&self) -> &str;
    fn d8flowdir(&self) -> &str;
    fn gdaldem(&self) -> &str;
    fn compute_edges(&self) -> bool;
    fn timeout_seconds(&self) -> Option<u64>;
}

/// Output file names and post-processing of a derivation.
pub trait OutputConfig: Send + Sync {
    fn output_root(&self) -> &str;
    fn hydro_correct_suffix(&self) -> &str;
    fn flow_direction_name(&self) -> &str;
    fn slope_name(&self) -> &str;
    fn continuous_aspect_name(&self) -> &str;
    fn binary_aspect_name(&self) -> &str;
    fn keep_flow_slope(&self) -> bool;
    fn trim_edge(&self) -> usize;
    fn write_summary(&self) -> bool;
}
