//! Configuration types

use std::collections::BTreeMap;
use std::time::Duration;

use license_gather_batch::BatchOptions;
use license_gather_spdx::{LicenseCategory, LicenseInterpreter, PolicyTable};
use serde::{Deserialize, Serialize};

/// Main configuration for License Gather
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Batching behaviour of the classification pipeline
    pub batch: BatchConfig,

    /// License policy
    pub policy: PolicyConfig,
}

/// Batch engine configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Flush a batch once it holds this many requests
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_batch_size: Option<usize>,

    /// Fail a batch whose handler runs longer than this many seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handler_timeout_secs: Option<u64>,
}

impl BatchConfig {
    /// Processor options for this configuration
    pub fn to_options(&self) -> BatchOptions {
        let mut options = BatchOptions::default();
        if let Some(max) = self.max_batch_size {
            options = options.with_max_batch_size(max);
        }
        if let Some(secs) = self.handler_timeout_secs {
            options = options.with_handler_timeout(Duration::from_secs(secs));
        }
        options
    }
}

/// License policy configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Categories a dependency may have and still pass
    pub allowed: Vec<LicenseCategory>,

    /// Start from the built-in ASF table
    #[serde(default = "default_true")]
    pub use_defaults: bool,

    /// License id -> category overrides
    pub licenses: BTreeMap<String, LicenseCategory>,

    /// Exception id -> category overrides
    pub exceptions: BTreeMap<String, LicenseCategory>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            allowed: vec![LicenseCategory::A, LicenseCategory::B],
            use_defaults: true,
            licenses: BTreeMap::new(),
            exceptions: BTreeMap::new(),
        }
    }
}

fn default_true() -> bool {
    true
}

impl PolicyConfig {
    /// Effective policy table: built-in defaults (if enabled) plus overrides
    pub fn table(&self) -> PolicyTable {
        let mut table = if self.use_defaults {
            PolicyTable::asf()
        } else {
            PolicyTable::new()
        };
        for (id, category) in &self.licenses {
            table.set_license(id.as_str(), *category);
        }
        for (id, category) in &self.exceptions {
            table.set_exception(id.as_str(), *category);
        }
        table
    }

    /// Interpreter over the effective policy table
    pub fn interpreter(&self) -> LicenseInterpreter {
        LicenseInterpreter::new(self.table())
    }

    /// Whether a category is acceptable
    pub fn allows(&self, category: LicenseCategory) -> bool {
        self.allowed.contains(&category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_allows_a_and_b() {
        let policy = PolicyConfig::default();
        assert!(policy.allows(LicenseCategory::A));
        assert!(policy.allows(LicenseCategory::B));
        assert!(!policy.allows(LicenseCategory::X));
        assert!(!policy.allows(LicenseCategory::Unknown));
    }

    #[test]
    fn test_overrides_replace_defaults() {
        let mut policy = PolicyConfig::default();
        policy.licenses.insert("mpl-2.0".to_string(), LicenseCategory::X);
        policy
            .licenses
            .insert("LicenseRef-Internal".to_string(), LicenseCategory::A);

        let interpreter = policy.interpreter();
        assert_eq!(
            interpreter.evaluate_str("MPL-2.0").unwrap(),
            LicenseCategory::X
        );
        assert_eq!(
            interpreter.evaluate_str("LicenseRef-Internal").unwrap(),
            LicenseCategory::A
        );
        assert_eq!(interpreter.evaluate_str("MIT").unwrap(), LicenseCategory::A);
    }

    #[test]
    fn test_without_defaults_only_overrides_are_known() {
        let mut policy = PolicyConfig {
            use_defaults: false,
            ..Default::default()
        };
        policy.licenses.insert("MIT".to_string(), LicenseCategory::A);

        let interpreter = policy.interpreter();
        assert_eq!(interpreter.evaluate_str("MIT").unwrap(), LicenseCategory::A);
        assert_eq!(
            interpreter.evaluate_str("Apache-2.0").unwrap(),
            LicenseCategory::Unknown
        );
    }

    #[test]
    fn test_batch_options() {
        let options = BatchConfig {
            max_batch_size: Some(16),
            handler_timeout_secs: Some(30),
        }
        .to_options();
        assert_eq!(options.max_batch_size, Some(16));
        assert_eq!(options.handler_timeout, Some(Duration::from_secs(30)));

        let defaults = BatchConfig::default().to_options();
        assert_eq!(defaults.max_batch_size, None);
        assert_eq!(defaults.handler_timeout, None);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: Config = toml::from_str("[batch]\nmax_batch_size = 8\n").unwrap();
        assert_eq!(config.batch.max_batch_size, Some(8));
        assert_eq!(config.policy, PolicyConfig::default());
    }

    #[test]
    fn test_yaml_policy() {
        let yaml = "policy:\n  allowed: [A]\n  licenses:\n    LicenseRef-Acme: B\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.policy.allowed, vec![LicenseCategory::A]);
        assert!(config.policy.use_defaults);
        assert_eq!(
            config.policy.licenses.get("LicenseRef-Acme"),
            Some(&LicenseCategory::B)
        );
    }
}
