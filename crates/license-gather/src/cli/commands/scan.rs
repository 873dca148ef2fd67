//! Scan command

use std::path::PathBuf;

use clap::Args;
use tracing::info;

use license_gather_core::config::load_config_or_default;
use license_gather_core::scan_directory;

use super::check::print_report;
use crate::cli::output::{self, path_style};
use crate::cli::{Cli, OutputFormat};
use crate::exit_codes;

/// Find and classify license files in a directory tree
#[derive(Debug, Args)]
pub struct ScanCommand {
    /// Directory to scan (defaults to current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,
}

impl ScanCommand {
    /// Execute the scan command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(path = %self.path.display(), "executing scan command");
        let cwd = std::env::current_dir()?;

        let path = if self.path.is_absolute() {
            self.path.clone()
        } else {
            cwd.join(&self.path)
        };

        if !path.exists() {
            anyhow::bail!("Path not found: {}", path.display());
        }

        let (config, _) = load_config_or_default(&cwd)?;

        if !cli.quiet && cli.format == OutputFormat::Text {
            output::info(&format!(
                "Scanning {} for license files",
                path_style().apply_to(path.display())
            ));
        }

        let rt = tokio::runtime::Runtime::new()?;
        let report = rt.block_on(scan_directory(&path, &config))?;

        if report.verdicts.is_empty() {
            if cli.format == OutputFormat::Text {
                output::warning("No license files found");
            } else {
                print_report(&report, cli, "License Scan")?;
            }
            return Ok(());
        }

        print_report(&report, cli, "License Scan")?;

        if !report.passed() {
            std::process::exit(exit_codes::POLICY_VIOLATION);
        }

        Ok(())
    }
}
