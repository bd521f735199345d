use crate::domain::model::{CommandOutput, ExternalCommand};
use crate::domain::ports::CommandRunner;
use crate::utils::error::{DemError, Result};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

// Keep error messages readable when a tool dumps a lot on stderr.
const STDERR_TAIL_LINES: usize = 20;

/// Runs external commands as child processes.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    timeout: Option<Duration>,
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait::async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, command: &ExternalCommand) -> Result<CommandOutput> {
        tracing::info!("▶️ {}", command);

        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd.spawn().map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => DemError::ToolNotFound {
                program: command.program.clone(),
            },
            _ => DemError::IoError(e),
        })?;

        let output = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait_with_output()).await {
                Ok(output) => output?,
                Err(_) => {
                    return Err(DemError::ToolTimeout {
                        program: command.tool_name().to_string(),
                        timeout: limit,
                    })
                }
            },
            None => child.wait_with_output().await?,
        };

        let result = CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if !result.stdout.trim().is_empty() {
            tracing::debug!("{} stdout:\n{}", command.tool_name(), result.stdout.trim_end());
        }
        if !result.stderr.trim().is_empty() {
            tracing::debug!("{} stderr:\n{}", command.tool_name(), result.stderr.trim_end());
        }

        if !output.status.success() {
            return Err(DemError::ToolFailed {
                program: command.tool_name().to_string(),
                code: result.code,
                stderr: tail_lines(&result.stderr, STDERR_TAIL_LINES),
            });
        }

        Ok(result)
    }
}

fn tail_lines(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.trim_end().lines().collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].join("\n")
}
