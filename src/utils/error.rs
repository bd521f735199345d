use thiserror::Error;

#[derive(Error, Debug)]
pub enum DemError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("GeoTIFF error: {0}")]
    TiffError(#[from] tiff::TiffError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Input file not found: {path}")]
    MissingInput { path: String },

    #[error("External tool '{program}' was not found on PATH")]
    ToolNotFound { program: String },

    #[error("External tool '{program}' failed (exit code {code:?}): {stderr}")]
    ToolFailed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("External tool '{program}' timed out after {timeout:?}")]
    ToolTimeout {
        program: String,
        timeout: std::time::Duration,
    },

    #[error("Raster error: {message}")]
    RasterError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Input,
    ExternalTool,
    Raster,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl DemError {
    pub fn raster(message: impl Into<String>) -> Self {
        DemError::RasterError {
            message: message.into(),
        }
    }

    pub fn missing_input(path: &std::path::Path) -> Self {
        DemError::MissingInput {
            path: path.display().to_string(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            DemError::ConfigError { .. }
            | DemError::ConfigValidationError { .. }
            | DemError::InvalidConfigValueError { .. }
            | DemError::MissingConfigError { .. } => ErrorCategory::Configuration,
            DemError::MissingInput { .. } => ErrorCategory::Input,
            DemError::ToolNotFound { .. }
            | DemError::ToolFailed { .. }
            | DemError::ToolTimeout { .. } => ErrorCategory::ExternalTool,
            DemError::TiffError(_) | DemError::RasterError { .. } => ErrorCategory::Raster,
            DemError::IoError(_) | DemError::SerializationError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Configuration | ErrorCategory::Input | ErrorCategory::Raster => {
                ErrorSeverity::High
            }
            ErrorCategory::ExternalTool => ErrorSeverity::Medium,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            DemError::ToolNotFound { program } => format!(
                "Install TauDEM and GDAL, or point [tools].{} in the config file at the binary",
                tool_key(program)
            ),
            DemError::ToolFailed { .. } => {
                "Check the tool output above; the DEM may be malformed or use a projection the tool rejects".to_string()
            }
            DemError::ToolTimeout { .. } => {
                "Increase [tools].timeout_seconds or run on a smaller DEM".to_string()
            }
            DemError::MissingInput { .. } => {
                "Check the input path, or run the stage that produces it first".to_string()
            }
            DemError::TiffError(_) | DemError::RasterError { .. } => {
                "Make sure the file is a single-band GeoTIFF".to_string()
            }
            DemError::ConfigError { .. }
            | DemError::ConfigValidationError { .. }
            | DemError::InvalidConfigValueError { .. }
            | DemError::MissingConfigError { .. } => {
                "Fix the configuration file or command-line arguments and retry".to_string()
            }
            DemError::IoError(_) | DemError::SerializationError(_) => {
                "Check disk space and permissions on the output directory".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            DemError::ToolNotFound { program } => {
                format!("Could not find '{}'. Is it installed?", program)
            }
            DemError::ToolFailed { program, code, .. } => match code {
                Some(code) => format!("'{}' exited with code {}", program, code),
                None => format!("'{}' was terminated by a signal", program),
            },
            other => other.to_string(),
        }
    }
}

fn tool_key(program: &str) -> &str {
    match program {
        "mpiexec" | "pitremove" | "d8flowdir" | "gdaldem" => program,
        _ => "<tool>",
    }
}

pub type Result<T> = std::result::Result<T, DemError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_errors_are_medium_severity() {
        let err = DemError::ToolFailed {
            program: "pitremove".to_string(),
            code: Some(1),
            stderr: "boom".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::ExternalTool);
        assert_eq!(err.severity(), ErrorSeverity::Medium);
        assert_eq!(err.user_friendly_message(), "'pitremove' exited with code 1");
    }

    #[test]
    fn test_io_errors_are_critical() {
        let err = DemError::from(std::io::Error::new(std::io::ErrorKind::Other, "disk"));
        assert_eq!(err.severity(), ErrorSeverity::Critical);
    }

    #[test]
    fn test_missing_tool_suggestion_names_config_key() {
        let err = DemError::ToolNotFound {
            program: "gdaldem".to_string(),
        };
        assert!(err.recovery_suggestion().contains("[tools].gdaldem"));
    }
}
