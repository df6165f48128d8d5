//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::HdlgradeConfig;
use std::path::Path;

/// File name looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "hdlgrade.toml";

/// Deepest expression nesting a configuration may allow.
pub const MAX_EXPRESSION_DEPTH_LIMIT: usize = 10_000;

/// Loads and validates the configuration file at `path`.
pub fn load_config(path: &Path) -> Result<HdlgradeConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    load_config_from_str(&content)
}

/// Parses and validates an `hdlgrade.toml` configuration from a string.
pub fn load_config_from_str(content: &str) -> Result<HdlgradeConfig, ConfigError> {
    let config: HdlgradeConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Finds the configuration to use.
///
/// An explicit path must exist. Otherwise `hdlgrade.toml` in `dir` is used
/// when present, and the defaults when it is not.
pub fn resolve_config(explicit: Option<&Path>, dir: &Path) -> Result<HdlgradeConfig, ConfigError> {
    if let Some(path) = explicit {
        return load_config(path);
    }
    let candidate = dir.join(CONFIG_FILE_NAME);
    if candidate.is_file() {
        load_config(&candidate)
    } else {
        Ok(HdlgradeConfig::default())
    }
}

fn validate_config(config: &HdlgradeConfig) -> Result<(), ConfigError> {
    let limits = &config.limits;
    if limits.max_expression_depth == 0 {
        return Err(ConfigError::ValidationError(
            "limits.max_expression_depth must be at least 1".to_string(),
        ));
    }
    if limits.max_expression_depth > MAX_EXPRESSION_DEPTH_LIMIT {
        return Err(ConfigError::ValidationError(format!(
            "limits.max_expression_depth must be at most {MAX_EXPRESSION_DEPTH_LIMIT}, got {}",
            limits.max_expression_depth
        )));
    }
    if limits.max_statements == 0 {
        return Err(ConfigError::ValidationError(
            "limits.max_statements must be at least 1".to_string(),
        ));
    }
    Ok(())
}
