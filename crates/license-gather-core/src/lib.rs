//! License Gather Core - Configuration and license check workflows
//!
//! This crate wires the SPDX policy interpreter and the batching engine into
//! the workflows the `license-gather` CLI runs: checking a dependency
//! manifest and scanning a source tree for license files.

pub mod config;
pub mod error;
pub mod workflow;

pub use config::{BatchConfig, Config, PolicyConfig};
pub use error::{CheckError, ConfigError, LicenseGatherError, Result};
pub use workflow::{
    check_dependencies, scan_directory, CheckReport, Dependency, DependencyManifest,
    DependencyVerdict, LicenseTextClassifier,
};
