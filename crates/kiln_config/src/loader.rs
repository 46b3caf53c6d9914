//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::KilnConfig;
use std::path::Path;

/// File name looked up inside the project directory.
pub const CONFIG_FILE_NAME: &str = "kiln.toml";

/// Loads and validates a `kiln.toml` configuration from a project directory.
///
/// Reads `<project_dir>/kiln.toml`, parses it, and validates its values.
pub fn load_config(project_dir: &Path) -> Result<KilnConfig, ConfigError> {
    let path = project_dir.join(CONFIG_FILE_NAME);
    let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
        path: path.clone(),
        source,
    })?;
    load_config_from_str(&content)
}

/// Parses and validates configuration text.
pub fn load_config_from_str(content: &str) -> Result<KilnConfig, ConfigError> {
    let config: KilnConfig = toml::from_str(content).map_err(|e| ConfigError::Parse {
        reason: e.to_string(),
    })?;
    validate_config(&config)?;
    Ok(config)
}

/// Rejects empty names and markers that would silently match everything.
fn validate_config(config: &KilnConfig) -> Result<(), ConfigError> {
    if config.graph.third_party_markers.iter().any(String::is_empty) {
        return Err(ConfigError::Invalid {
            field: "graph.third_party_markers",
            reason: "an empty marker matches every path",
        });
    }
    if config.hashing.excluded_targets.iter().any(String::is_empty) {
        return Err(ConfigError::Invalid {
            field: "hashing.excluded_targets",
            reason: "target names must not be empty",
        });
    }
    if config.hashing.configuration.as_deref() == Some("") {
        return Err(ConfigError::Invalid {
            field: "hashing.configuration",
            reason: "configuration name must not be empty",
        });
    }
    Ok(())
}
