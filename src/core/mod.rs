pub mod command;
pub mod derive;
pub mod layers;
pub mod runner;

pub use crate::domain::model::{CommandOutput, DerivationReport, ExternalCommand, Layer, StageResult};
pub use crate::domain::ports::{CommandRunner, OutputConfig, ToolConfig};
pub use crate::utils::error::Result;
