//! Dependency manifest

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CheckError, Result};

/// Default manifest file name
pub const DEFAULT_MANIFEST: &str = "license-deps.toml";

/// List of third-party dependencies to check
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyManifest {
    /// Dependencies, in declaration order
    #[serde(default, rename = "dependency")]
    pub dependencies: Vec<Dependency>,
}

/// One third-party dependency
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    /// Package name
    pub name: String,

    /// Package version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Declared SPDX license expression
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,

    /// License text file, relative to the manifest's directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_file: Option<PathBuf>,
}

impl Dependency {
    /// Create a dependency with just a name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
            license: None,
            license_file: None,
        }
    }

    /// Set the version
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Set the declared license expression
    pub fn with_license(mut self, license: impl Into<String>) -> Self {
        self.license = Some(license.into());
        self
    }

    /// Set the license file
    pub fn with_license_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.license_file = Some(path.into());
        self
    }

    /// `name@version`, or just the name
    pub fn display_name(&self) -> String {
        match &self.version {
            Some(version) => format!("{}@{}", self.name, version),
            None => self.name.clone(),
        }
    }
}

impl DependencyManifest {
    /// Load and validate a manifest file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(CheckError::ManifestNotFound(path.to_path_buf()).into());
        }
        let content = std::fs::read_to_string(path)?;
        let manifest: Self = toml::from_str(&content).map_err(|e| CheckError::ManifestParse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        manifest.validate()?;
        debug!(
            path = %path.display(),
            dependencies = manifest.dependencies.len(),
            "manifest loaded"
        );
        Ok(manifest)
    }

    /// Parse a manifest from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let manifest: Self = toml::from_str(content)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Reject empty and duplicate dependency entries
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for dependency in &self.dependencies {
            if dependency.name.trim().is_empty() {
                return Err(CheckError::InvalidDependency {
                    name: dependency.name.clone(),
                    reason: "name cannot be empty".to_string(),
                }
                .into());
            }
            if !seen.insert(dependency.display_name()) {
                return Err(CheckError::InvalidDependency {
                    name: dependency.display_name(),
                    reason: "listed more than once".to_string(),
                }
                .into());
            }
        }
        Ok(())
    }

    /// Number of dependencies
    pub fn len(&self) -> usize {
        self.dependencies.len()
    }

    /// Whether the manifest lists no dependencies
    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }
}
