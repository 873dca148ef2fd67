//! Eval command

use clap::Args;
use console::style;
use serde::Serialize;
use tracing::info;

use license_gather_core::config::load_config_or_default;
use license_gather_spdx::{parse_expression, LicenseCategory, LicenseInterpreter};

use crate::cli::output::category_label;
use crate::cli::{Cli, OutputFormat};
use crate::exit_codes;

/// Categorise license expressions under the configured policy
#[derive(Debug, Args)]
pub struct EvalCommand {
    /// SPDX license expressions, e.g. "MIT OR Apache-2.0"
    #[arg(required = true)]
    pub expressions: Vec<String>,

    /// Ignore any config file and use the built-in ASF policy
    #[arg(long)]
    pub builtin: bool,
}

/// Evaluation of one expression
#[derive(Debug, Serialize)]
struct Evaluation {
    input: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    expression: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<LicenseCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl EvalCommand {
    /// Execute the eval command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(count = self.expressions.len(), builtin = self.builtin, "executing eval command");

        let interpreter = if self.builtin {
            LicenseInterpreter::asf()
        } else {
            let cwd = std::env::current_dir()?;
            let (config, _) = load_config_or_default(&cwd)?;
            config.policy.interpreter()
        };

        let evaluations = evaluate_all(&interpreter, &self.expressions);
        let failed = evaluations.iter().any(|e| e.error.is_some());

        match cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&evaluations)?);
            }
            OutputFormat::Text => {
                for evaluation in &evaluations {
                    match (&evaluation.expression, &evaluation.error) {
                        (Some(expression), _) => {
                            if !cli.quiet {
                                let description = evaluation
                                    .category
                                    .map(|c| c.description())
                                    .unwrap_or_default();
                                println!(
                                    "{} {}  {}",
                                    category_label(evaluation.category),
                                    expression,
                                    style(description).dim()
                                );
                            }
                        }
                        (None, error) => {
                            eprintln!(
                                "{} {}: {}",
                                category_label(None),
                                evaluation.input,
                                error.as_deref().unwrap_or_default()
                            );
                        }
                    }
                }
            }
        }

        if failed {
            std::process::exit(exit_codes::PARSE_ERROR);
        }

        Ok(())
    }
}

fn evaluate_all(interpreter: &LicenseInterpreter, inputs: &[String]) -> Vec<Evaluation> {
    inputs
        .iter()
        .map(|input| match parse_expression(input) {
            Ok(expression) => Evaluation {
                input: input.clone(),
                category: Some(interpreter.evaluate(&expression)),
                expression: Some(expression.to_string()),
                error: None,
            },
            Err(e) => Evaluation {
                input: input.clone(),
                expression: None,
                category: None,
                error: Some(e.to_string()),
            },
        })
        .collect()
}
