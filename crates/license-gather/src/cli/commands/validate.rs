//! Validate command

use std::path::{Path, PathBuf};

use clap::Args;
use console::style;
use tracing::info;

use license_gather_core::config::load_config_from_dir;
use license_gather_spdx::LicenseCategory;

use crate::cli::output::{key_value, path_style};
use crate::cli::{Cli, OutputFormat};
use crate::exit_codes;

/// Validate the configuration file
#[derive(Debug, Args)]
pub struct ValidateCommand {
    /// Strict mode - treat warnings as errors
    #[arg(long)]
    pub strict: bool,
}

/// Findings of a configuration check
#[derive(Debug, Default)]
struct ValidationReport {
    config_path: Option<PathBuf>,
    known_licenses: usize,
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl ValidationReport {
    fn passed(&self) -> bool {
        self.errors.is_empty()
    }
}

impl ValidateCommand {
    /// Execute the validate command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(strict = self.strict, "executing validate command");
        let cwd = std::env::current_dir()?;

        let report = self.validate(&cwd);
        let passed = report.passed();
        let ValidationReport {
            config_path,
            known_licenses,
            errors,
            warnings,
        } = report;

        match cli.format {
            OutputFormat::Json => {
                let output = serde_json::json!({
                    "valid": passed,
                    "config_path": config_path.map(|p| p.to_string_lossy().to_string()),
                    "known_licenses": known_licenses,
                    "errors": errors,
                    "warnings": warnings
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            OutputFormat::Text => {
                if !cli.quiet {
                    println!("{}", style("Validation Results").bold());
                    println!();

                    if let Some(path) = config_path {
                        println!(
                            "{}",
                            key_value("Config", &path_style().apply_to(path.display()).to_string())
                        );
                        println!("{}", key_value("Known licenses", &known_licenses.to_string()));
                        println!();
                    }

                    if !errors.is_empty() {
                        println!("{}", style("Errors:").red().bold());
                        for error in &errors {
                            println!("  {} {}", style("✗").red(), error);
                        }
                        println!();
                    }

                    if !warnings.is_empty() {
                        println!("{}", style("Warnings:").yellow().bold());
                        for warning in &warnings {
                            println!("  {} {}", style("!").yellow(), warning);
                        }
                        println!();
                    }

                    if passed {
                        if warnings.is_empty() {
                            println!("{}", style("✓ Configuration is valid").green().bold());
                        } else {
                            println!(
                                "{} with {} warning(s)",
                                style("✓ Validation passed").green().bold(),
                                warnings.len()
                            );
                        }
                    } else {
                        println!(
                            "{} with {} error(s)",
                            style("✗ Validation failed").red().bold(),
                            errors.len()
                        );
                    }
                }
            }
        }

        if !passed {
            std::process::exit(exit_codes::CONFIG_ERROR);
        }

        Ok(())
    }

    /// Load and check the configuration found from `dir`
    fn validate(&self, dir: &Path) -> ValidationReport {
        let mut report = ValidationReport::default();

        let config = match load_config_from_dir(dir) {
            Ok((config, path)) => {
                report.config_path = Some(path);
                config
            }
            Err(e) => {
                report.errors.push(format!("Configuration: {}", e));
                return report;
            }
        };

        let table = config.policy.table();
        report.known_licenses = table.len();
        if table.is_empty() {
            report
                .warnings
                .push("Policy table is empty: every license evaluates to Unknown".to_string());
        }
        if config.policy.allows(LicenseCategory::X)
            || config.policy.allows(LicenseCategory::Unknown)
        {
            report
                .warnings
                .push("Policy allows category X or Unknown licenses".to_string());
        }

        if self.strict {
            let mut warnings = std::mem::take(&mut report.warnings);
            report.errors.append(&mut warnings);
        }
        report
    }
}
