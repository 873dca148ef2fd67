//! Error types for License Gather

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using LicenseGatherError
pub type Result<T> = std::result::Result<T, LicenseGatherError>;

/// Main error type for License Gather operations
#[derive(Debug, Error)]
pub enum LicenseGatherError {
    /// Configuration-related errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Dependency check errors
    #[error(transparent)]
    Check(#[from] CheckError),

    /// License expression syntax errors
    #[error("Invalid license expression: {0}")]
    Parse(#[from] license_gather_spdx::ParseError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found at {0}")]
    NotFound(PathBuf),

    /// Invalid configuration value
    #[error("Invalid configuration: {field} - {message}")]
    InvalidValue { field: String, message: String },

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// IO error
    #[error("IO error reading config: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while checking dependencies or scanning a tree
#[derive(Debug, Error)]
pub enum CheckError {
    /// Dependency manifest not found
    #[error("Dependency manifest not found at {0}")]
    ManifestNotFound(PathBuf),

    /// Failed to parse the dependency manifest
    #[error("Failed to parse manifest {path}: {reason}")]
    ManifestParse { path: PathBuf, reason: String },

    /// A dependency entry is unusable
    #[error("Invalid dependency '{name}': {reason}")]
    InvalidDependency { name: String, reason: String },

    /// Dependency declares neither a license nor a license file
    #[error("No license or license file declared for {0}")]
    NoLicense(String),

    /// A license file could not be read
    #[error("Failed to read license file {path}: {reason}")]
    LicenseFile { path: PathBuf, reason: String },

    /// License text matched no known license
    #[error("Could not identify a license in the text")]
    Unclassified,

    /// Scan root is not a directory
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),
}

impl LicenseGatherError {
    /// Create a new "other" error with a message
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Self::Other(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_is_transparent() {
        let err: LicenseGatherError = ConfigError::InvalidValue {
            field: "batch.max_batch_size".to_string(),
            message: "must be greater than zero".to_string(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "Invalid configuration: batch.max_batch_size - must be greater than zero"
        );
    }

    #[test]
    fn test_parse_error_conversion() {
        let parse_error = license_gather_spdx::parse_expression("MIT AND").unwrap_err();
        let err: LicenseGatherError = parse_error.into();
        assert!(err.to_string().starts_with("Invalid license expression"));
    }
}
