//! Configuration validation

use tracing::debug;

use crate::error::{ConfigError, Result};

use super::types::Config;

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    debug!("validating configuration");
    validate_batch(config)?;
    validate_policy(config)?;
    debug!("configuration validation passed");
    Ok(())
}

fn validate_batch(config: &Config) -> Result<()> {
    if config.batch.max_batch_size == Some(0) {
        return Err(ConfigError::InvalidValue {
            field: "batch.max_batch_size".to_string(),
            message: "must be greater than zero".to_string(),
        }
        .into());
    }

    if config.batch.handler_timeout_secs == Some(0) {
        return Err(ConfigError::InvalidValue {
            field: "batch.handler_timeout_secs".to_string(),
            message: "must be greater than zero".to_string(),
        }
        .into());
    }

    Ok(())
}

fn validate_policy(config: &Config) -> Result<()> {
    if config.policy.allowed.is_empty() {
        return Err(ConfigError::InvalidValue {
            field: "policy.allowed".to_string(),
            message: "at least one category must be allowed".to_string(),
        }
        .into());
    }

    for (table, ids) in [
        ("policy.licenses", &config.policy.licenses),
        ("policy.exceptions", &config.policy.exceptions),
    ] {
        for id in ids.keys() {
            validate_identifier(table, id)?;
        }
    }

    Ok(())
}

fn validate_identifier(table: &str, id: &str) -> Result<()> {
    if id.trim().is_empty() {
        return Err(ConfigError::InvalidValue {
            field: table.to_string(),
            message: "identifier cannot be empty".to_string(),
        }
        .into());
    }

    if let Some(c) = id
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | ':' | '+')))
    {
        return Err(ConfigError::InvalidValue {
            field: format!("{}.{}", table, id),
            message: format!("invalid character '{}' in identifier", c),
        }
        .into());
    }

    Ok(())
}
