//! Check command

use std::path::PathBuf;

use clap::Args;
use console::style;
use tracing::info;

use license_gather_core::config::{load_config_or_default, validate_config};
use license_gather_core::workflow::DEFAULT_MANIFEST;
use license_gather_core::{check_dependencies, CheckReport, DependencyManifest};

use crate::cli::output::{self, category_label, header, path_style};
use crate::cli::{Cli, OutputFormat};
use crate::exit_codes;

/// Check the dependencies listed in a manifest against the license policy
#[derive(Debug, Args)]
pub struct CheckCommand {
    /// Dependency manifest (TOML, `[[dependency]]` entries)
    #[arg(short, long, default_value = DEFAULT_MANIFEST)]
    pub manifest: PathBuf,

    /// Override the configured batch size cap
    #[arg(long)]
    pub max_batch_size: Option<usize>,
}

impl CheckCommand {
    /// Execute the check command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(manifest = %self.manifest.display(), "executing check command");
        let cwd = std::env::current_dir()?;

        let (mut config, _) = load_config_or_default(&cwd)?;
        if let Some(max) = self.max_batch_size {
            config.batch.max_batch_size = Some(max);
            validate_config(&config)?;
        }

        let manifest_path = cwd.join(&self.manifest);
        let manifest = DependencyManifest::load(&manifest_path)?;
        let base_dir = manifest_path
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| cwd.clone());

        if !cli.quiet && cli.format == OutputFormat::Text {
            output::info(&format!(
                "Checking {} dependencies from {}",
                manifest.len(),
                path_style().apply_to(manifest_path.display())
            ));
        }

        let rt = tokio::runtime::Runtime::new()?;
        let report = rt.block_on(check_dependencies(&manifest, &base_dir, &config))?;

        print_report(&report, cli, "License Check")?;

        if !report.passed() {
            std::process::exit(exit_codes::POLICY_VIOLATION);
        }

        Ok(())
    }
}

/// Print a check or scan report in the selected format
pub(super) fn print_report(report: &CheckReport, cli: &Cli, title: &str) -> anyhow::Result<()> {
    match cli.format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "passed": report.passed(),
                "allowed": report.allowed,
                "verdicts": report.verdicts,
                "summary": {
                    "checked": report.verdicts.len(),
                    "rejected": report.rejected().len(),
                    "errors": report.error_count(),
                    "batches": report.summary.batches,
                    "classified": report.summary.requests,
                    "largest_batch": report.summary.largest_batch,
                    "duration_ms": report.summary.duration.as_millis() as u64,
                }
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text => {
            let allowed = report
                .allowed
                .iter()
                .map(|c| c.as_str())
                .collect::<Vec<_>>()
                .join(", ");

            if !cli.quiet {
                println!();
                println!("{}", header(title));
                println!();
                for verdict in &report.verdicts {
                    let detail = match (&verdict.expression, &verdict.error) {
                        (Some(expression), _) => expression.to_string(),
                        (None, Some(error)) => style(error).red().to_string(),
                        (None, None) => String::new(),
                    };
                    let name = match &verdict.version {
                        Some(version) => format!("{}@{}", verdict.name, version),
                        None => verdict.name.clone(),
                    };
                    println!(
                        "  {} {}  {}",
                        category_label(verdict.category),
                        style(name).bold(),
                        detail
                    );
                }
                println!();
                println!(
                    "{}",
                    style(format!(
                        "{} checked, {} text(s) classified in {} batch(es)",
                        report.verdicts.len(),
                        report.summary.requests,
                        report.summary.batches
                    ))
                    .dim()
                );
            }

            if report.passed() {
                if !cli.quiet {
                    output::success(&format!(
                        "All licenses within allowed categories ({})",
                        allowed
                    ));
                }
            } else {
                for verdict in report.rejected() {
                    if cli.quiet {
                        output::error(&format!(
                            "{}: {}",
                            verdict.name,
                            verdict
                                .category
                                .map(|c| c.as_str().to_string())
                                .or_else(|| verdict.error.clone())
                                .unwrap_or_default()
                        ));
                    }
                }
                output::error(&format!(
                    "{} of {} not within allowed categories ({})",
                    report.rejected().len(),
                    report.verdicts.len(),
                    allowed
                ));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_default_manifest() {
        let cli = Cli::try_parse_from(["license-gather", "check"]).unwrap();
        match cli.command {
            crate::cli::Commands::Check(cmd) => {
                assert_eq!(cmd.manifest, PathBuf::from(DEFAULT_MANIFEST));
                assert!(cmd.max_batch_size.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_manifest_flag() {
        let cli = Cli::try_parse_from([
            "license-gather",
            "check",
            "--manifest",
            "deps.toml",
            "--max-batch-size",
            "8",
        ])
        .unwrap();
        match cli.command {
            crate::cli::Commands::Check(cmd) => {
                assert_eq!(cmd.manifest, PathBuf::from("deps.toml"));
                assert_eq!(cmd.max_batch_size, Some(8));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
