//! Dependency license check

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use license_gather_batch::{BatchError, BatchProcessor, RunSummary};
use license_gather_spdx::{parse_expression, LicenseCategory, LicenseExpression};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::config::Config;
use crate::error::{CheckError, LicenseGatherError, Result};

use super::classifier::LicenseTextClassifier;
use super::manifest::DependencyManifest;

/// Where a checked item's license comes from
#[derive(Debug, Clone)]
pub(crate) enum LicenseSource {
    /// An SPDX expression given verbatim
    Declared(String),
    /// A license text file on disk
    File(PathBuf),
    /// Nothing declared
    Missing,
}

/// One item to check
#[derive(Debug, Clone)]
pub(crate) struct Subject {
    pub name: String,
    pub version: Option<String>,
    pub license_file: Option<PathBuf>,
    pub source: LicenseSource,
}

/// Outcome of checking one dependency or license file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DependencyVerdict {
    /// Dependency name, or the file's path for scans
    pub name: String,

    /// Dependency version
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// License file the expression was read from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_file: Option<PathBuf>,

    /// Resolved license expression
    pub expression: Option<LicenseExpression>,

    /// Category under the configured policy
    pub category: Option<LicenseCategory>,

    /// Why no expression could be resolved
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DependencyVerdict {
    /// Whether the verdict has a category within `allowed`
    pub fn is_allowed(&self, allowed: &[LicenseCategory]) -> bool {
        self.category.is_some_and(|c| allowed.contains(&c))
    }
}

/// Result of a check or scan
#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    /// Verdicts in input order
    pub verdicts: Vec<DependencyVerdict>,

    /// Categories that pass
    pub allowed: Vec<LicenseCategory>,

    /// Batch engine statistics
    pub summary: RunSummary,
}

impl CheckReport {
    /// Every verdict resolved to an allowed category
    pub fn passed(&self) -> bool {
        self.verdicts.iter().all(|v| v.is_allowed(&self.allowed))
    }

    /// Verdicts that fail the policy, including unresolved ones
    pub fn rejected(&self) -> Vec<&DependencyVerdict> {
        self.verdicts
            .iter()
            .filter(|v| !v.is_allowed(&self.allowed))
            .collect()
    }

    /// Number of verdicts per category; unresolved verdicts are not counted
    pub fn category_counts(&self) -> BTreeMap<LicenseCategory, usize> {
        let mut counts = BTreeMap::new();
        for category in self.verdicts.iter().filter_map(|v| v.category) {
            *counts.entry(category).or_insert(0) += 1;
        }
        counts
    }

    /// Number of verdicts with no resolved expression
    pub fn error_count(&self) -> usize {
        self.verdicts.iter().filter(|v| v.error.is_some()).count()
    }
}

/// Check every dependency of a manifest against the configured policy.
///
/// Declared expressions are parsed directly; license files are read relative
/// to `base_dir` and classified in batches by [`LicenseTextClassifier`].
#[instrument(skip_all, fields(dependencies = manifest.len()))]
pub async fn check_dependencies(
    manifest: &DependencyManifest,
    base_dir: &Path,
    config: &Config,
) -> Result<CheckReport> {
    manifest.validate()?;
    info!(base_dir = %base_dir.display(), "checking dependencies");

    let subjects = manifest
        .dependencies
        .iter()
        .map(|dependency| Subject {
            name: dependency.name.clone(),
            version: dependency.version.clone(),
            license_file: dependency.license_file.clone(),
            source: match (&dependency.license, &dependency.license_file) {
                (Some(license), _) => LicenseSource::Declared(license.clone()),
                (None, Some(file)) => LicenseSource::File(base_dir.join(file)),
                (None, None) => LicenseSource::Missing,
            },
        })
        .collect();

    Ok(evaluate_subjects(subjects, config, LicenseTextClassifier::new()).await)
}

/// Resolve and categorise every subject through one batch run
pub(crate) async fn evaluate_subjects(
    subjects: Vec<Subject>,
    config: &Config,
    classifier: LicenseTextClassifier,
) -> CheckReport {
    let interpreter = Arc::new(config.policy.interpreter());
    let mut processor: BatchProcessor<String, LicenseExpression, LicenseExpression> =
        BatchProcessor::with_options(classifier, config.batch.to_options());

    let mut pending = Vec::with_capacity(subjects.len());
    for subject in subjects {
        let name = subject.name.clone();
        let source = subject.source.clone();
        let handle = processor.task(move |mut loader| async move {
            match source {
                LicenseSource::Declared(expression) => {
                    Ok(parse_expression(&expression).map_err(LicenseGatherError::from)?)
                }
                LicenseSource::File(path) => {
                    let text = tokio::fs::read_to_string(&path).await.map_err(|e| {
                        CheckError::LicenseFile {
                            path: path.clone(),
                            reason: e.to_string(),
                        }
                    })?;
                    Ok(loader.load(text).await?)
                }
                LicenseSource::Missing => Err(anyhow::Error::from(CheckError::NoLicense(name))),
            }
        });
        pending.push((subject, handle));
    }

    let summary = processor.run().await;

    let mut verdicts = Vec::with_capacity(pending.len());
    for (subject, handle) in pending {
        let (expression, category, error) = match handle.await {
            Ok(expression) => {
                let category = interpreter.evaluate(&expression);
                (Some(expression), Some(category), None)
            }
            Err(e) => (None, None, Some(failure_message(&e))),
        };
        debug!(
            name = %subject.name,
            category = category.map(|c| c.as_str()),
            error = error.as_deref(),
            "verdict"
        );
        verdicts.push(DependencyVerdict {
            name: subject.name,
            version: subject.version,
            license_file: subject.license_file,
            expression,
            category,
            error,
        });
    }

    let report = CheckReport {
        verdicts,
        allowed: config.policy.allowed.clone(),
        summary,
    };
    info!(
        checked = report.verdicts.len(),
        rejected = report.rejected().len(),
        batches = report.summary.batches,
        "license check complete"
    );
    report
}

/// Message for a failed verdict, without the batch engine's wrapping
fn failure_message(error: &BatchError) -> String {
    match error {
        BatchError::Task(cause) | BatchError::Request(cause) => cause.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::manifest::Dependency;
    use tempfile::TempDir;

    fn manifest(dependencies: Vec<Dependency>) -> DependencyManifest {
        DependencyManifest { dependencies }
    }

    #[tokio::test]
    async fn test_declared_licenses() {
        let temp = TempDir::new().unwrap();
        let report = check_dependencies(
            &manifest(vec![
                Dependency::new("serde").with_license("MIT OR Apache-2.0"),
                Dependency::new("gpl-thing").with_license("GPL-3.0-only"),
                Dependency::new("javafx")
                    .with_license("GPL-2.0-only WITH Classpath-exception-2.0"),
            ]),
            temp.path(),
            &Config::default(),
        )
        .await
        .unwrap();

        let categories: Vec<_> = report.verdicts.iter().map(|v| v.category).collect();
        assert_eq!(
            categories,
            vec![
                Some(LicenseCategory::A),
                Some(LicenseCategory::X),
                Some(LicenseCategory::A)
            ]
        );
        assert!(!report.passed());
        assert_eq!(report.rejected().len(), 1);
        assert_eq!(report.rejected()[0].name, "gpl-thing");
        // Declared expressions never reach the classifier
        assert_eq!(report.summary.batches, 0);
    }

    #[tokio::test]
    async fn test_license_files_are_classified_in_one_batch() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("vendor")).unwrap();
        std::fs::write(
            temp.path().join("vendor/APACHE"),
            "Apache License\nVersion 2.0, January 2004\n",
        )
        .unwrap();
        std::fs::write(
            temp.path().join("vendor/MPL"),
            "Mozilla Public License Version 2.0\n",
        )
        .unwrap();

        let report = check_dependencies(
            &manifest(vec![
                Dependency::new("a").with_license_file("vendor/APACHE"),
                Dependency::new("b").with_license_file("vendor/MPL"),
                Dependency::new("c").with_license("ISC"),
            ]),
            temp.path(),
            &Config::default(),
        )
        .await
        .unwrap();

        assert!(report.passed());
        assert_eq!(report.summary.batches, 1);
        assert_eq!(report.summary.requests, 2);
        assert_eq!(
            report.verdicts[1].expression,
            Some(LicenseExpression::license("MPL-2.0"))
        );
        assert_eq!(report.category_counts().get(&LicenseCategory::B), Some(&1));
    }

    #[tokio::test]
    async fn test_failures_are_per_dependency() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("CUSTOM"), "All rights reserved.\n").unwrap();

        let report = check_dependencies(
            &manifest(vec![
                Dependency::new("missing-file").with_license_file("nope/LICENSE"),
                Dependency::new("unclassified").with_license_file("CUSTOM"),
                Dependency::new("undeclared"),
                Dependency::new("bad-syntax").with_license("MIT AND"),
                Dependency::new("fine").with_license("Apache-2.0"),
            ]),
            temp.path(),
            &Config::default(),
        )
        .await
        .unwrap();

        let errors: Vec<_> = report
            .verdicts
            .iter()
            .map(|v| v.error.clone().unwrap_or_default())
            .collect();
        assert!(errors[0].starts_with("Failed to read license file"));
        assert_eq!(errors[1], CheckError::Unclassified.to_string());
        assert_eq!(errors[2], "No license or license file declared for undeclared");
        assert!(errors[3].starts_with("Invalid license expression"));
        assert!(errors[4].is_empty());

        assert_eq!(report.error_count(), 4);
        assert_eq!(report.verdicts[4].category, Some(LicenseCategory::A));
        assert!(!report.passed());
    }

    #[tokio::test]
    async fn test_policy_overrides_and_allowed() {
        let temp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.policy.allowed = vec![LicenseCategory::A];
        config
            .policy
            .licenses
            .insert("LicenseRef-Acme".to_string(), LicenseCategory::A);

        let report = check_dependencies(
            &manifest(vec![
                Dependency::new("acme").with_license("LicenseRef-Acme"),
                Dependency::new("mpl").with_license("MPL-2.0"),
            ]),
            temp.path(),
            &config,
        )
        .await
        .unwrap();

        assert!(report.verdicts[0].is_allowed(&report.allowed));
        assert!(!report.verdicts[1].is_allowed(&report.allowed));
    }

    #[tokio::test]
    async fn test_max_batch_size_splits_classification() {
        let temp = TempDir::new().unwrap();
        let mut dependencies = Vec::new();
        for i in 0..5 {
            let file = format!("LICENSE-{}", i);
            std::fs::write(temp.path().join(&file), "SPDX-License-Identifier: MIT\n").unwrap();
            dependencies.push(Dependency::new(format!("dep{}", i)).with_license_file(file));
        }
        let mut config = Config::default();
        config.batch.max_batch_size = Some(2);

        let report = check_dependencies(&manifest(dependencies), temp.path(), &config)
            .await
            .unwrap();

        assert!(report.passed());
        assert_eq!(report.summary.requests, 5);
        assert!(report.summary.largest_batch <= 2);
    }

    #[tokio::test]
    async fn test_empty_manifest_passes() {
        let temp = TempDir::new().unwrap();
        let report = check_dependencies(&manifest(Vec::new()), temp.path(), &Config::default())
            .await
            .unwrap();
        assert!(report.passed());
        assert!(report.verdicts.is_empty());
    }

    #[tokio::test]
    async fn test_report_serializes() {
        let temp = TempDir::new().unwrap();
        let report = check_dependencies(
            &manifest(vec![Dependency::new("x").with_version("1.0").with_license("MIT")]),
            temp.path(),
            &Config::default(),
        )
        .await
        .unwrap();

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["verdicts"][0]["expression"], "MIT");
        assert_eq!(json["verdicts"][0]["category"], "A");
        assert_eq!(json["verdicts"][0]["version"], "1.0");
        assert!(json["verdicts"][0].get("error").is_none());
    }
}
