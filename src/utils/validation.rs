use crate::utils::error::{DemError, Result};
use std::collections::HashSet;
use std::path::Path;

pub const GEOTIFF_EXTENSIONS: &[&str] = &["tif", "tiff"];

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(DemError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(DemError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(DemError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_file_extension(field_name: &str, file: &str, allowed_extensions: &[&str]) -> Result<()> {
    let allowed_set: HashSet<String> = allowed_extensions.iter().map(|e| e.to_ascii_lowercase()).collect();

    match Path::new(file).extension().and_then(|ext| ext.to_str()) {
        Some(extension) if allowed_set.contains(&extension.to_ascii_lowercase()) => Ok(()),
        Some(extension) => Err(DemError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: file.to_string(),
            reason: format!(
                "Unsupported file extension: {}. Allowed extensions: {}",
                extension,
                allowed_extensions.join(", ")
            ),
        }),
        None => Err(DemError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: file.to_string(),
            reason: "File has no extension or invalid filename".to_string(),
        }),
    }
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(DemError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

/// A site name becomes a single directory under the output root.
pub fn validate_site_name(field_name: &str, site: &str) -> Result<()> {
    validate_non_empty_string(field_name, site)?;

    if site.contains('/') || site.contains('\\') || site == "." || site == ".." {
        return Err(DemError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: site.to_string(),
            reason: "Site name must be a single directory name".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_path() {
        assert!(validate_path("dem", "data/dem.tif").is_ok());
        assert!(validate_path("dem", "").is_err());
        assert!(validate_path("dem", "bad\0path").is_err());
    }

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("tools.mpi_processes", 2, 1).is_ok());
        assert!(validate_positive_number("tools.mpi_processes", 0, 1).is_err());
    }

    #[test]
    fn test_validate_file_extension() {
        assert!(validate_file_extension("dem", "dem.tif", GEOTIFF_EXTENSIONS).is_ok());
        assert!(validate_file_extension("dem", "DEM.TIFF", GEOTIFF_EXTENSIONS).is_ok());
        assert!(validate_file_extension("dem", "dem.asc", GEOTIFF_EXTENSIONS).is_err());
        assert!(validate_file_extension("dem", "dem", GEOTIFF_EXTENSIONS).is_err());
    }

    #[test]
    fn test_validate_site_name() {
        assert!(validate_site_name("site", "glen_coe").is_ok());
        assert!(validate_site_name("site", "  ").is_err());
        assert!(validate_site_name("site", "a/b").is_err());
        assert!(validate_site_name("site", "..").is_err());
    }
}
