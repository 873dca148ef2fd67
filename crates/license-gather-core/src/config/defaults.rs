//! Default configuration values

use super::types::Config;

/// Default configuration file name (TOML)
pub const DEFAULT_CONFIG_TOML: &str = "license-gather.toml";

/// Default configuration file name (YAML)
pub const DEFAULT_CONFIG_YAML: &str = "license-gather.yaml";

/// Get list of config file names to search for
pub fn config_file_names() -> Vec<&'static str> {
    vec![
        DEFAULT_CONFIG_TOML,
        DEFAULT_CONFIG_YAML,
        ".license-gather.toml",
        ".license-gather.yaml",
    ]
}

/// Generate default configuration TOML
pub fn default_config_toml() -> String {
    DEFAULT_CONFIG_TEMPLATE.to_string()
}

/// Default configuration serialized from [`Config::default`], without comments
pub fn default_config_plain() -> String {
    toml::to_string_pretty(&Config::default())
        .unwrap_or_else(|_| DEFAULT_CONFIG_TEMPLATE.to_string())
}

/// Default configuration template
pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"# License Gather configuration

[batch]
# Flush a classification batch once it holds this many license texts.
# max_batch_size = 64
# Fail a batch whose classifier runs longer than this.
# handler_timeout_secs = 30

[policy]
# Categories a dependency may have and still pass the check.
allowed = ["A", "B"]
# Start from the built-in ASF category lists.
use_defaults = true

[policy.licenses]
# "LicenseRef-Acme-Internal" = "A"

[policy.exceptions]
# "Bison-exception-2.2" = "A"
"#;
